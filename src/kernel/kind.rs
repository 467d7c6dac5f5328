//! Tagged kernel family with its hyperparameters

use crate::core::{Result, SparseVector};
use crate::kernel::{Kernel, LinearKernel, PolynomialKernel, RBFKernel, SigmoidKernel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the supported kernel families, dispatched through [`Kernel`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KernelKind {
    Linear,
    Polynomial(PolynomialKernel),
    Rbf(RBFKernel),
    Sigmoid(SigmoidKernel),
}

impl KernelKind {
    pub fn linear() -> Self {
        KernelKind::Linear
    }

    pub fn polynomial(degree: u32, gamma: f64, coef0: f64) -> Self {
        KernelKind::Polynomial(PolynomialKernel::new(degree, gamma, coef0))
    }

    pub fn rbf(gamma: f64) -> Self {
        KernelKind::Rbf(RBFKernel::new(gamma))
    }

    pub fn sigmoid(gamma: f64, coef0: f64) -> Self {
        KernelKind::Sigmoid(SigmoidKernel::new(gamma, coef0))
    }

    /// Short family name used in logs and model files
    pub fn name(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Polynomial(_) => "polynomial",
            KernelKind::Rbf(_) => "rbf",
            KernelKind::Sigmoid(_) => "sigmoid",
        }
    }

    /// Check hyperparameters of a kernel that did not go through a
    /// constructor, e.g. one read back from a model file
    pub fn validate(&self) -> Result<()> {
        match self {
            KernelKind::Linear => Ok(()),
            KernelKind::Polynomial(k) => k.validate(),
            KernelKind::Rbf(k) => k.validate(),
            KernelKind::Sigmoid(k) => k.validate(),
        }
    }
}

impl Default for KernelKind {
    fn default() -> Self {
        KernelKind::Rbf(RBFKernel::default())
    }
}

impl Kernel for KernelKind {
    #[inline]
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match self {
            KernelKind::Linear => LinearKernel.compute(x, y),
            KernelKind::Polynomial(k) => k.compute(x, y),
            KernelKind::Rbf(k) => k.compute(x, y),
            KernelKind::Sigmoid(k) => k.compute(x, y),
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Linear => write!(f, "linear"),
            KernelKind::Polynomial(k) => write!(
                f,
                "polynomial(degree={}, gamma={}, coef0={})",
                k.degree, k.gamma, k.coef0
            ),
            KernelKind::Rbf(k) => write!(f, "rbf(gamma={})", k.gamma),
            KernelKind::Sigmoid(k) => write!(f, "sigmoid(gamma={}, coef0={})", k.gamma, k.coef0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_matches_concrete_kernels() {
        let x = SparseVector::new(vec![0, 2], vec![1.0, -0.5]);
        let y = SparseVector::new(vec![0, 1, 2], vec![0.3, 2.0, 1.5]);

        assert_eq!(
            KernelKind::rbf(0.5).compute(&x, &y),
            RBFKernel::new(0.5).compute(&x, &y)
        );
        assert_eq!(
            KernelKind::polynomial(3, 0.2, 1.0).compute(&x, &y),
            PolynomialKernel::new(3, 0.2, 1.0).compute(&x, &y)
        );
        assert_eq!(KernelKind::linear().compute(&x, &y), 0.3 - 0.75);
        assert_eq!(
            KernelKind::sigmoid(0.1, 0.0).compute(&x, &y),
            SigmoidKernel::new(0.1, 0.0).compute(&x, &y)
        );
    }

    #[test]
    fn test_validate_rejects_deserialized_garbage() {
        let bad = KernelKind::Rbf(RBFKernel { gamma: -1.0 });
        assert!(bad.validate().is_err());

        let bad_poly = KernelKind::Polynomial(PolynomialKernel {
            gamma: 1.0,
            coef0: 0.0,
            degree: 0,
        });
        assert!(bad_poly.validate().is_err());
        assert!(KernelKind::rbf(0.5).validate().is_ok());
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&KernelKind::rbf(0.25)).expect("serialize");
        assert_eq!(json, r#"{"type":"rbf","gamma":0.25}"#);

        let back: KernelKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, KernelKind::rbf(0.25));
        assert_eq!(back.name(), "rbf");
    }
}
