//! Class partitioning for one-vs-one decomposition

use crate::core::{Dataset, Result, SVMError, Sample, SparseVector};

/// A labeled multi-class problem split into per-class index partitions
///
/// Class indices are ranks of the distinct labels in ascending order.
#[derive(Debug)]
pub struct SvmProblem<'a> {
    samples: &'a [Sample],
    labels: Vec<i32>,
    partitions: Vec<Vec<usize>>,
}

/// Two-class sub-problem: instances of class `a` labeled +1 followed by
/// instances of class `b` labeled -1
#[derive(Debug, Clone)]
pub struct BinaryProblem {
    pub class_a: usize,
    pub class_b: usize,
    pub points: Vec<SparseVector>,
    pub y: Vec<f64>,
    /// Position of each instance in the originating sample slice
    pub origin: Vec<usize>,
}

impl BinaryProblem {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<'a> SvmProblem<'a> {
    pub fn new(samples: &'a [Sample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let mut labels: Vec<i32> = samples.iter().map(|s| s.label).collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.len() < 2 {
            return Err(SVMError::DegenerateProblem(format!(
                "need at least two classes, found only label {}",
                labels[0]
            )));
        }

        let mut partitions = vec![Vec::new(); labels.len()];
        for (i, sample) in samples.iter().enumerate() {
            // Every label is present in the sorted list by construction
            if let Ok(class) = labels.binary_search(&sample.label) {
                partitions[class].push(i);
            }
        }

        Ok(Self {
            samples,
            labels,
            partitions,
        })
    }

    pub fn from_dataset<D: Dataset + ?Sized>(dataset: &'a D) -> Result<Self> {
        Self::new(dataset.samples())
    }

    /// Distinct labels in ascending order
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn class_index(&self, label: i32) -> Option<usize> {
        self.labels.binary_search(&label).ok()
    }

    /// Sample positions belonging to `class`
    pub fn partition(&self, class: usize) -> &[usize] {
        &self.partitions[class]
    }

    /// Class pairs in model order: (0,1), (0,2), ..., (1,2), ...
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        class_pairs(self.n_classes())
    }

    pub fn pair_problem(&self, a: usize, b: usize) -> Result<BinaryProblem> {
        let k = self.n_classes();
        if a >= b || b >= k {
            return Err(SVMError::InvalidParameter(format!(
                "invalid class pair ({a}, {b}) for {k} classes"
            )));
        }

        let (pos, neg) = (&self.partitions[a], &self.partitions[b]);
        if pos.is_empty() || neg.is_empty() {
            return Err(SVMError::DegenerateProblem(format!(
                "class pair ({}, {}) has an empty side",
                self.labels[a], self.labels[b]
            )));
        }

        let origin: Vec<usize> = pos.iter().chain(neg).copied().collect();
        let points = origin
            .iter()
            .map(|&i| self.samples[i].features.clone())
            .collect();
        let y = std::iter::repeat(1.0)
            .take(pos.len())
            .chain(std::iter::repeat(-1.0).take(neg.len()))
            .collect();

        Ok(BinaryProblem {
            class_a: a,
            class_b: b,
            points,
            y,
            origin,
        })
    }
}

/// All unordered class pairs for `k` classes, lower index first
pub fn class_pairs(k: usize) -> Vec<(usize, usize)> {
    (0..k)
        .flat_map(|a| (a + 1..k).map(move |b| (a, b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, label: i32) -> Sample {
        Sample::new(SparseVector::new(vec![0], vec![x]), label)
    }

    #[test]
    fn test_labels_sorted_and_partitioned() {
        let samples = vec![
            sample(1.0, 7),
            sample(2.0, -3),
            sample(3.0, 7),
            sample(4.0, 2),
            sample(5.0, -3),
        ];
        let problem = SvmProblem::new(&samples).unwrap();

        assert_eq!(problem.labels(), &[-3, 2, 7]);
        assert_eq!(problem.n_classes(), 3);
        assert_eq!(problem.partition(0), &[1, 4]);
        assert_eq!(problem.partition(1), &[3]);
        assert_eq!(problem.partition(2), &[0, 2]);
        assert_eq!(problem.class_index(7), Some(2));
        assert_eq!(problem.class_index(5), None);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let samples = vec![sample(1.0, 1), sample(2.0, 1)];
        assert!(matches!(
            SvmProblem::new(&samples),
            Err(SVMError::DegenerateProblem(_))
        ));
        assert!(matches!(SvmProblem::new(&[]), Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_pair_problem_relabels() {
        let samples = vec![
            sample(1.0, 3),
            sample(2.0, 1),
            sample(3.0, 2),
            sample(4.0, 1),
            sample(5.0, 3),
        ];
        let problem = SvmProblem::new(&samples).unwrap();
        let pair = problem.pair_problem(0, 2).unwrap();

        assert_eq!((pair.class_a, pair.class_b), (0, 2));
        assert_eq!(pair.origin, vec![1, 3, 0, 4]);
        assert_eq!(pair.y, vec![1.0, 1.0, -1.0, -1.0]);
        assert_eq!(pair.points[2], samples[0].features);
        assert_eq!(pair.len(), 4);
    }

    #[test]
    fn test_pair_problem_rejects_bad_pairs() {
        let samples = vec![sample(1.0, 1), sample(2.0, 2)];
        let problem = SvmProblem::new(&samples).unwrap();
        assert!(problem.pair_problem(1, 0).is_err());
        assert!(problem.pair_problem(0, 2).is_err());
        assert!(problem.pair_problem(0, 0).is_err());
    }

    #[test]
    fn test_class_pairs_order() {
        assert_eq!(
            class_pairs(4),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
        assert!(class_pairs(1).is_empty());
    }
}
