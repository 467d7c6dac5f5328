//! Class confusion (miss-labeling) matrix

use std::fmt::Write;

/// `n × n` counts of (true class, predicted class), indexed by class index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Zero every cell
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    #[inline]
    pub fn record(&mut self, actual: usize, predicted: usize) {
        self.counts[actual * self.n_classes + predicted] += 1;
    }

    pub fn get(&self, actual: usize, predicted: usize) -> u64 {
        self.counts[actual * self.n_classes + predicted]
    }

    /// Predictions made for instances of class `actual`
    pub fn row(&self, actual: usize) -> &[u64] {
        let start = actual * self.n_classes;
        &self.counts[start..start + self.n_classes]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sum of the diagonal
    pub fn correct(&self) -> u64 {
        (0..self.n_classes).map(|c| self.get(c, c)).sum()
    }

    /// Render as a table with class labels as headers; rows are true classes
    pub fn format_with_labels(&self, labels: &[i32]) -> String {
        let header = |c: usize| labels.get(c).map_or_else(|| c.to_string(), |l| l.to_string());
        let width = (0..self.n_classes)
            .map(|c| header(c).len())
            .chain(self.counts.iter().map(|n| n.to_string().len()))
            .max()
            .unwrap_or(1)
            .max(4);

        let mut out = String::new();
        let _ = write!(out, "{:>width$}", "");
        for c in 0..self.n_classes {
            let _ = write!(out, " {:>width$}", header(c));
        }
        out.push('\n');
        for actual in 0..self.n_classes {
            let _ = write!(out, "{:>width$}", header(actual));
            for count in self.row(actual) {
                let _ = write!(out, " {count:>width$}");
            }
            out.push('\n');
        }
        out
    }
}
