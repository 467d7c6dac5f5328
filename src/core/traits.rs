//! Core traits shared by datasets and models

use crate::core::{Sample, SparseVector};

/// Read-only access to a labeled instance store
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Borrow a single sample
    ///
    /// # Panics
    /// Panics if index >= len()
    fn sample(&self, i: usize) -> &Sample;

    /// All samples as a contiguous slice
    fn samples(&self) -> &[Sample];

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<i32> {
        self.samples().iter().map(|s| s.label).collect()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A trained classifier that assigns integer class labels
pub trait Classifier: Send + Sync {
    /// Predict the class label of a single instance
    fn predict_one(&self, x: &SparseVector) -> i32;

    /// Predict labels for a slice of instances
    fn predict(&self, xs: &[SparseVector]) -> Vec<i32> {
        xs.iter().map(|x| self.predict_one(x)).collect()
    }

    /// Number of distinct classes the classifier separates
    fn n_classes(&self) -> usize;
}
