//! Gaussian kernel, K(x, y) = exp(-γ ||x - y||²)

use crate::core::{Result, SparseVector};
use crate::kernel::linear::merge_join;
use crate::kernel::{check_gamma, Kernel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RBFKernel {
    /// Inverse width; larger values make the kernel more local
    pub gamma: f64,
}

impl RBFKernel {
    /// # Panics
    /// Panics if gamma is not positive and finite; see [`RBFKernel::try_new`]
    pub fn new(gamma: f64) -> Self {
        match Self::try_new(gamma) {
            Ok(kernel) => kernel,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(gamma: f64) -> Result<Self> {
        let kernel = Self { gamma };
        kernel.validate()?;
        Ok(kernel)
    }

    pub fn validate(&self) -> Result<()> {
        check_gamma(self.gamma)
    }
}

impl Default for RBFKernel {
    fn default() -> Self {
        Self { gamma: 1.0 }
    }
}

impl Kernel for RBFKernel {
    #[inline]
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * sparse_squared_distance(x, y)).exp()
    }
}

/// ||x - y||², bitwise symmetric in its arguments
pub(crate) fn sparse_squared_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let (mut shared, mut lone) = (0.0, 0.0);
    merge_join(
        x,
        y,
        |a, b| {
            let d = a - b;
            shared += d * d;
        },
        |v| lone += v * v,
    );
    shared + lone
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gamma_is_checked() {
        assert_eq!(RBFKernel::new(0.5).gamma, 0.5);
        assert!(RBFKernel::try_new(0.0).is_err());
        assert!(RBFKernel::try_new(f64::NAN).is_err());
        assert!(RBFKernel { gamma: -2.0 }.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "gamma must be positive")]
    fn test_new_panics_on_bad_gamma() {
        RBFKernel::new(-0.5);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);
        assert_eq!(RBFKernel::new(3.0).compute(&x, &x), 1.0);
    }

    #[test]
    fn test_disjoint_support() {
        let x = SparseVector::new(vec![0, 2], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![1, 3], vec![1.0, 1.0]);

        assert_relative_eq!(
            RBFKernel::new(1.0).compute(&x, &y),
            (-4.0_f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_symmetry_is_exact() {
        let kernel = RBFKernel::new(0.37);
        let x = SparseVector::new(vec![0, 2, 4], vec![1.1, 2.3, 3.7]);
        let y = SparseVector::new(vec![1, 2, 3], vec![0.9, 2.0, -3.1]);

        assert_eq!(
            kernel.compute(&x, &y).to_bits(),
            kernel.compute(&y, &x).to_bits()
        );
    }

    #[test]
    fn test_squared_distance() {
        let x = SparseVector::new(vec![0, 2, 5], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![2, 3, 5], vec![2.0, 1.0, 4.0]);
        // 1 (idx 0) + 1 (idx 2) + 1 (idx 3) + 4 (idx 5)
        assert_eq!(sparse_squared_distance(&x, &y), 7.0);

        let empty = SparseVector::empty();
        assert_eq!(sparse_squared_distance(&empty, &y), 21.0);
    }
}
