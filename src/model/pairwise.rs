//! One binary classifier of a one-vs-one model set

use crate::core::{ConvergenceStatus, DualSolution, Prediction, Result, SVMError, SparseVector};
use crate::data::BinaryProblem;
use crate::kernel::Kernel;

/// Support vectors, their signed coefficients and the bias of one class pair
///
/// A non-negative decision value is a vote for `class_a`, a negative one a
/// vote for `class_b`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseModel {
    class_a: usize,
    class_b: usize,
    support_vectors: Vec<SparseVector>,
    /// alpha_i * y_i for each support vector
    alpha_y: Vec<f64>,
    bias: f64,
    status: ConvergenceStatus,
}

impl PairwiseModel {
    /// Keep the support vectors of a solved sub-problem
    pub fn from_solution(problem: &BinaryProblem, solution: &DualSolution) -> Self {
        let (support_vectors, alpha_y) = solution
            .support_vectors
            .iter()
            .map(|&k| {
                (
                    problem.points[k].clone(),
                    solution.alpha[k] * problem.y[k],
                )
            })
            .unzip();

        Self {
            class_a: problem.class_a,
            class_b: problem.class_b,
            support_vectors,
            alpha_y,
            bias: solution.b,
            status: solution.status,
        }
    }

    /// Rebuild a model from stored parts
    pub fn from_parts(
        class_a: usize,
        class_b: usize,
        support_vectors: Vec<SparseVector>,
        alpha_y: Vec<f64>,
        bias: f64,
        status: ConvergenceStatus,
    ) -> Result<Self> {
        if class_a >= class_b {
            return Err(SVMError::InvalidParameter(format!(
                "class pair ({class_a}, {class_b}) must be ordered"
            )));
        }
        if support_vectors.len() != alpha_y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: support_vectors.len(),
                actual: alpha_y.len(),
            });
        }
        if !bias.is_finite() || alpha_y.iter().any(|w| !w.is_finite()) {
            return Err(SVMError::InvalidModel(format!(
                "pair ({class_a}, {class_b}) has non-finite weights"
            )));
        }
        Ok(Self {
            class_a,
            class_b,
            support_vectors,
            alpha_y,
            bias,
            status,
        })
    }

    /// Σ alpha_i y_i K(x, x_i) + b
    pub fn decision_value<K: Kernel + ?Sized>(&self, kernel: &K, x: &SparseVector) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.alpha_y)
            .map(|(sv, &coef)| coef * kernel.compute(x, sv))
            .sum::<f64>()
            + self.bias
    }

    pub fn predict<K: Kernel + ?Sized>(&self, kernel: &K, x: &SparseVector) -> Prediction {
        let decision_value = self.decision_value(kernel, x);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    /// Class index this model votes for
    pub fn vote<K: Kernel + ?Sized>(&self, kernel: &K, x: &SparseVector) -> usize {
        if self.decision_value(kernel, x) >= 0.0 {
            self.class_a
        } else {
            self.class_b
        }
    }

    pub fn classes(&self) -> (usize, usize) {
        (self.class_a, self.class_b)
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.support_vectors
    }

    pub fn alpha_y(&self) -> &[f64] {
        &self.alpha_y
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }
}
