//! Multi-class Support Vector Machine training and prediction
//!
//! Each pair of classes is solved as an independent binary SVM by an
//! SMO-style working-set solver backed by an LRU kernel-row cache. Trained
//! pairwise models are combined by majority vote.

pub mod api;
pub mod backend;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod predict;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{ModelInfo, SVM};
pub use crate::backend::{run_with_threads, Parallelism, RowBackend};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::{BinaryProblem, LibSVMDataset, SvmProblem};
pub use crate::kernel::{Kernel, KernelKind};
pub use crate::metrics::{EvaluationReport, TrainingTimings};
pub use crate::model::{PairwiseModel, TrainedModel, TrainingReport};
pub use crate::predict::{ConfusionMatrix, MultiPredictor, DEFAULT_BATCH_SIZE};
pub use crate::solver::SMOSolver;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
