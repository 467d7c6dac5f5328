//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! 3 1:0.5 3:1.2 7:0.8
//! 1 2:0.3 5:2.1
//!
//! Labels are integer class identifiers, feature indices are 1-based and
//! strictly increasing within a line.

use crate::core::{Dataset, Result, SVMError, Sample, SparseVector};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_features(path, None)
    }

    /// Load a dataset from a file, rejecting features beyond `n_features`
    pub fn from_file_with_features<P: AsRef<Path>>(
        path: P,
        n_features: Option<usize>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader_with_features(BufReader::new(file), n_features)?;
        debug!(
            "loaded {} samples with {} features from {}",
            dataset.len(),
            dataset.dim(),
            path.display()
        );
        Ok(dataset)
    }

    /// Load a dataset from a reader (for testing and flexibility)
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_features(reader, None)
    }

    /// Load a dataset from a reader with an optional declared dimensionality
    pub fn from_reader_with_features<R: BufRead>(
        reader: R,
        n_features: Option<usize>,
    ) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = n_features.unwrap_or(0);

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sample = Self::parse_line(line).map_err(|message| SVMError::ParseError {
                line: line_num + 1,
                message,
            })?;

            let dim = sample.features.dim();
            match n_features {
                Some(expected) if dim > expected => {
                    return Err(SVMError::DimensionMismatch {
                        expected,
                        actual: dim,
                    });
                }
                _ => dimensions = dimensions.max(dim),
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            samples,
            dimensions,
        })
    }

    /// Wrap already-parsed samples
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let dimensions = samples.iter().map(|s| s.features.dim()).max().unwrap_or(0);
        Ok(LibSVMDataset {
            samples,
            dimensions,
        })
    }

    /// Consume the dataset and return its samples
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> std::result::Result<Sample, String> {
        let mut parts = line.split_whitespace();
        let label_str = parts.next().ok_or_else(|| "empty line".to_string())?;
        let label = parse_label(label_str)?;

        let mut indices = Vec::new();
        let mut values = Vec::new();

        for feature_str in parts {
            let (index_str, value_str) = feature_str
                .split_once(':')
                .ok_or_else(|| format!("invalid feature format: {feature_str}"))?;

            let index = index_str
                .parse::<usize>()
                .map_err(|_| format!("invalid feature index: {index_str}"))?;
            if index == 0 {
                return Err("feature index must be positive: 0".to_string());
            }

            let value = value_str
                .parse::<f64>()
                .map_err(|_| format!("invalid feature value: {value_str}"))?;
            if !value.is_finite() {
                return Err(format!("non-finite feature value: {value_str}"));
            }

            // libsvm uses 1-based indexing, convert to 0-based
            let index = index - 1;
            if let Some(&previous) = indices.last() {
                if index <= previous {
                    return Err(format!(
                        "feature indices must be strictly increasing: {} after {}",
                        index + 1,
                        previous + 1
                    ));
                }
            }

            indices.push(index);
            values.push(value);
        }

        let features = SparseVector::from_sorted(indices, values).map_err(|e| e.to_string())?;
        Ok(Sample::new(features, label))
    }
}

/// Accepts `3`, `+1`, `-2` and integral floats such as `2.0`
fn parse_label(s: &str) -> std::result::Result<i32, String> {
    if let Ok(label) = s.parse::<i32>() {
        return Ok(label);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(format!("invalid label: {s}")),
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn sample(&self, i: usize) -> &Sample {
        &self.samples[i]
    }

    fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line_basic() {
        let sample = LibSVMDataset::parse_line("3 1:0.5 3:1.2").unwrap();

        assert_eq!(sample.label, 3);
        assert_eq!(sample.features.indices, vec![0, 2]); // 1-based to 0-based
        assert_eq!(sample.features.values, vec![0.5, 1.2]);
    }

    #[test]
    fn test_parse_line_signed_and_float_labels() {
        assert_eq!(LibSVMDataset::parse_line("+1 1:1.0").unwrap().label, 1);
        assert_eq!(LibSVMDataset::parse_line("-1 1:1.0").unwrap().label, -1);
        assert_eq!(LibSVMDataset::parse_line("2.0 1:1.0").unwrap().label, 2);
        assert!(LibSVMDataset::parse_line("2.5 1:1.0").is_err());
    }

    #[test]
    fn test_parse_line_without_features() {
        let sample = LibSVMDataset::parse_line("4").unwrap();
        assert_eq!(sample.label, 4);
        assert!(sample.features.is_empty());
    }

    #[test]
    fn test_parse_line_invalid_format() {
        // Invalid feature format
        assert!(LibSVMDataset::parse_line("1 1").is_err());
        // Invalid index
        assert!(LibSVMDataset::parse_line("1 abc:1.0").is_err());
        // Invalid value
        assert!(LibSVMDataset::parse_line("1 1:abc").is_err());
        // Zero index (libsvm is 1-based)
        assert!(LibSVMDataset::parse_line("1 0:1.0").is_err());
        // Non-finite value
        assert!(LibSVMDataset::parse_line("1 1:NaN").is_err());
    }

    #[test]
    fn test_parse_line_rejects_unordered_indices() {
        let err = LibSVMDataset::parse_line("1 3:1.0 2:1.0").unwrap_err();
        assert!(err.contains("strictly increasing"), "{err}");
        assert!(LibSVMDataset::parse_line("1 2:1.0 2:3.0").is_err());
    }

    #[test]
    fn test_parse_error_reports_line_number() {
        let data = "1 1:0.5\n# comment\n2 4:1.0 2:1.0\n";
        let result = LibSVMDataset::from_reader(Cursor::new(data));
        assert!(matches!(result, Err(SVMError::ParseError { line: 3, .. })));
    }

    #[test]
    fn test_from_reader_basic() {
        let data = "1 1:0.5 3:1.2\n2 2:0.3 5:2.1\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 5); // max index is 4 (0-based), so dimension is 5

        let sample1 = dataset.sample(0);
        assert_eq!(sample1.label, 1);
        assert_eq!(sample1.features.indices, vec![0, 2]);

        let sample2 = dataset.sample(1);
        assert_eq!(sample2.label, 2);
        assert_eq!(sample2.features.indices, vec![1, 4]);
    }

    #[test]
    fn test_from_reader_empty_lines_and_comments() {
        let data = "# Comment line\n1 1:0.5\n\n# Another comment\n-1 2:0.3\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get_labels(), vec![1, -1]);
    }

    #[test]
    fn test_from_reader_empty_dataset() {
        let data = "# Only comments\n\n";
        let result = LibSVMDataset::from_reader(Cursor::new(data));
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_declared_feature_count() {
        let data = "1 1:1.0 3:2.0\n2 2:1.0\n";

        let dataset =
            LibSVMDataset::from_reader_with_features(Cursor::new(data), Some(10)).unwrap();
        assert_eq!(dataset.dim(), 10);

        let result = LibSVMDataset::from_reader_with_features(Cursor::new(data), Some(2));
        assert!(matches!(
            result,
            Err(SVMError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_large_dimension_handling() {
        let data = "1 1:1.0 1000:2.0 5000:3.0\n2 2:1.0 500:2.0\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.dim(), 5000);
        let sample = dataset.sample(0);
        assert_eq!(sample.features.indices, vec![0, 999, 4999]);
        assert_eq!(sample.features.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_samples_and_into_samples() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![2], vec![1.0]), 1),
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 2),
        ];
        let dataset = LibSVMDataset::from_samples(samples.clone()).unwrap();
        assert_eq!(dataset.dim(), 3);
        assert_eq!(dataset.into_samples(), samples);

        assert!(matches!(
            LibSVMDataset::from_samples(Vec::new()),
            Err(SVMError::EmptyDataset)
        ));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "1 1:0.5 3:1.2").expect("Failed to write");
        writeln!(temp_file, "2 2:0.3 5:2.1").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 5);
        assert_eq!(dataset.get_labels(), vec![1, 2]);
    }

    #[test]
    fn test_from_file_io_error() {
        let result = LibSVMDataset::from_file("/non/existent/file.libsvm");
        assert!(matches!(result, Err(SVMError::IoError(_))));
    }
}
