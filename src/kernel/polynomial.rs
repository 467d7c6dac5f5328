//! Polynomial kernel, K(x, y) = (γ <x, y> + coef0)^degree

use crate::core::{Result, SVMError, SparseVector};
use crate::kernel::linear::sparse_dot;
use crate::kernel::{check_gamma, Kernel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolynomialKernel {
    pub gamma: f64,
    pub coef0: f64,
    pub degree: u32,
}

impl PolynomialKernel {
    /// # Panics
    /// Panics on a zero degree or a gamma that is not positive and finite
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Self {
        match Self::try_new(degree, gamma, coef0) {
            Ok(kernel) => kernel,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(degree: u32, gamma: f64, coef0: f64) -> Result<Self> {
        let kernel = Self {
            gamma,
            coef0,
            degree,
        };
        kernel.validate()?;
        Ok(kernel)
    }

    pub fn validate(&self) -> Result<()> {
        if self.degree == 0 || self.degree > i32::MAX as u32 {
            return Err(SVMError::InvalidParameter(format!(
                "polynomial degree must be in 1..={}, got {}",
                i32::MAX,
                self.degree
            )));
        }
        if !self.coef0.is_finite() {
            return Err(SVMError::InvalidParameter(format!(
                "coef0 must be finite, got {}",
                self.coef0
            )));
        }
        check_gamma(self.gamma)
    }
}

impl Default for PolynomialKernel {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            coef0: 0.0,
            degree: 3,
        }
    }
}

impl Kernel for PolynomialKernel {
    #[inline]
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * sparse_dot(x, y) + self.coef0).powi(self.degree as i32)
    }
}
