//! Kernel trait definition

use crate::core::SparseVector;

/// Kernel function trait
///
/// Implementations must be pure: the same pair of vectors always yields the
/// same bits, so cached values stay interchangeable with fresh evaluations.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;
}

impl<K: Kernel + ?Sized> Kernel for &K {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (**self).compute(x, y)
    }
}
