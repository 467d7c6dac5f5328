//! Sigmoid kernel, K(x, y) = tanh(γ <x, y> + coef0)
//!
//! Not positive semi-definite for every (γ, coef0); the solver treats pairs
//! with non-positive curvature as unable to make progress.

use crate::core::{Result, SVMError, SparseVector};
use crate::kernel::linear::sparse_dot;
use crate::kernel::{check_gamma, Kernel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidKernel {
    pub gamma: f64,
    pub coef0: f64,
}

impl SigmoidKernel {
    /// # Panics
    /// Panics if gamma is not positive and finite
    pub fn new(gamma: f64, coef0: f64) -> Self {
        match Self::try_new(gamma, coef0) {
            Ok(kernel) => kernel,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(gamma: f64, coef0: f64) -> Result<Self> {
        let kernel = Self { gamma, coef0 };
        kernel.validate()?;
        Ok(kernel)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.coef0.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "coef0 must be finite, got {}",
                self.coef0
            )));
        }
        check_gamma(self.gamma)
    }
}

impl Default for SigmoidKernel {
    fn default() -> Self {
        Self {
            gamma: 0.01,
            coef0: 0.0,
        }
    }
}

impl Kernel for SigmoidKernel {
    #[inline]
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * sparse_dot(x, y) + self.coef0).tanh()
    }
}
