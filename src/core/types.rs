//! Core type definitions for SVM

use crate::cache::CacheStats;
use crate::core::{Result, SVMError};
use crate::kernel::KernelKind;
use crate::metrics::TrainingTimings;
use serde::{Deserialize, Serialize};

/// Output of one binary decision function
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted side (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with strictly increasing indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, sorting the pairs by index
    ///
    /// # Panics
    /// Panics on length mismatch or duplicate indices
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);
        assert!(
            pairs.windows(2).all(|w| w[0].0 < w[1].0),
            "Duplicate feature index"
        );

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build from pairs that must already be strictly increasing by index
    pub fn from_sorted(indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(SVMError::DimensionMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        if let Some(w) = indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SVMError::InvalidDataset(format!(
                "feature indices must be strictly increasing ({} followed by {})",
                w[0], w[1]
            )));
        }
        Ok(Self { indices, values })
    }

    /// Build from a dense slice, dropping zeros
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Largest feature index plus one (0 for the empty vector)
    pub fn dim(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Labeled instance: sparse features plus an integer class label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label
    pub label: i32,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: i32) -> Self {
        Self { features, label }
    }
}

/// Whether a solver run reached the tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Maximal KKT violation fell below epsilon
    Converged,
    /// Violating pairs remain but none of them can move inside the box
    Stalled,
    /// Iteration cap reached; the best solution so far is kept
    IterationLimit,
}

impl ConvergenceStatus {
    pub fn is_converged(self) -> bool {
        !matches!(self, ConvergenceStatus::IterationLimit)
    }
}

/// Result of one binary solver run
#[derive(Debug, Clone)]
pub struct DualSolution {
    /// Lagrange multipliers (alpha values), one per instance of the sub-problem
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final dual objective value
    pub objective_value: f64,
    /// Maximal KKT violation at exit
    pub max_violation: f64,
    pub status: ConvergenceStatus,
    pub cache_stats: CacheStats,
    pub timings: TrainingTimings,
}

/// Working set selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkingSetStrategy {
    /// Maximal violating pair: largest gradient gap
    FirstOrder,
    /// Largest objective decrease for the pair, using curvature
    #[default]
    SecondOrder,
}

/// Configuration for the working-set solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    pub working_set_strategy: WorkingSetStrategy,
    /// Enable shrinking heuristic
    pub shrinking: bool,
    /// Number of iterations between shrinking passes
    pub shrinking_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 100_000,
            cache_size: 100_000_000, // 100MB
            working_set_strategy: WorkingSetStrategy::SecondOrder,
            shrinking: false,
            shrinking_iterations: 100,
        }
    }
}

impl SolverConfig {
    /// Reject configurations the solver cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(SVMError::InvalidParameter(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.shrinking && self.shrinking_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "shrinking_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything a fit needs besides the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub kernel: KernelKind,
    pub solver: SolverConfig,
    /// 0 = all cores, 1 = sequential, n = exactly n threads
    pub threads: usize,
    /// Declared feature dimensionality of the input, if known
    pub n_features: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::default(),
            solver: SolverConfig::default(),
            threads: 0,
            n_features: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        self.kernel.validate()?;
        self.solver.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(sv.dim(), 5);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(1), 1.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_from_sorted_rejects_unordered_indices() {
        assert!(SparseVector::from_sorted(vec![0, 3, 7], vec![1.0, 2.0, 3.0]).is_ok());
        assert!(matches!(
            SparseVector::from_sorted(vec![0, 3, 3], vec![1.0, 2.0, 3.0]),
            Err(SVMError::InvalidDataset(_))
        ));
        assert!(SparseVector::from_sorted(vec![4, 1], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_from_dense_drops_zeros() {
        let sv = SparseVector::from_dense(&[0.0, 1.5, 0.0, -2.0]);
        assert_eq!(sv.indices, vec![1, 3]);
        assert_eq!(sv.values, vec![1.5, -2.0]);
        assert_eq!(sv.norm_squared(), 1.5 * 1.5 + 4.0);
    }

    #[test]
    fn test_prediction() {
        let neg_pred = Prediction::new(-1.0, -1.8);
        assert_eq!(neg_pred.label, -1.0);
        assert_eq!(neg_pred.confidence(), 1.8);
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.working_set_strategy, WorkingSetStrategy::SecondOrder);
        assert!(!config.shrinking);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_solver_config_validation() {
        let mut config = SolverConfig::default();
        config.c = 0.0;
        assert!(matches!(config.validate(), Err(SVMError::InvalidParameter(_))));

        let mut config = SolverConfig::default();
        config.epsilon = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_convergence_status() {
        assert!(ConvergenceStatus::Converged.is_converged());
        assert!(ConvergenceStatus::Stalled.is_converged());
        assert!(!ConvergenceStatus::IterationLimit.is_converged());
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "Duplicate feature index")]
    fn test_sparse_vector_duplicate_index() {
        SparseVector::new(vec![1, 1], vec![1.0, 2.0]);
    }

    #[test]
    fn test_training_config_validation() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threads, 0);

        let bad_kernel = TrainingConfig {
            kernel: KernelKind::Rbf(crate::kernel::RBFKernel { gamma: -1.0 }),
            ..TrainingConfig::default()
        };
        assert!(matches!(
            bad_kernel.validate(),
            Err(SVMError::InvalidParameter(_))
        ));

        let mut bad_solver = TrainingConfig::default();
        bad_solver.solver.c = 0.0;
        assert!(bad_solver.validate().is_err());
    }
}
