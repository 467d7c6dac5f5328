//! High-level API for multi-class SVM training and evaluation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mcsvm::api::SVM;
//! use mcsvm::kernel::KernelKind;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = SVM::new()
//!     .with_kernel(KernelKind::rbf(0.5))
//!     .with_c(1.0)
//!     .train_from_file("train.libsvm")?;
//!
//! let (report, confusion) = model.evaluate_file("test.libsvm", 2000)?;
//! println!("{report}");
//! println!("{}", confusion.format_with_labels(model.labels()));
//! # Ok(())
//! # }
//! ```

use crate::backend::run_with_threads;
use crate::core::{
    Dataset, Result, SVMError, Sample, SparseVector, TrainingConfig, WorkingSetStrategy,
};
use crate::data::LibSVMDataset;
use crate::kernel::KernelKind;
use crate::metrics::EvaluationReport;
use crate::model::TrainedModel;
use crate::predict::{ConfusionMatrix, MultiPredictor};
use log::info;
use std::path::Path;
use std::time::Instant;

/// High-level SVM interface with builder pattern
#[derive(Debug, Clone, Default)]
pub struct SVM {
    config: TrainingConfig,
}

impl SVM {
    /// Create a new SVM with an RBF kernel and default parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.config.kernel = kernel;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.solver.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.solver.epsilon = epsilon;
        self
    }

    /// Set maximum number of iterations per pairwise solve
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.solver.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in bytes, per pairwise solve
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.solver.cache_size = cache_size;
        self
    }

    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.config.solver.shrinking = shrinking;
        self
    }

    pub fn with_working_set_strategy(mut self, strategy: WorkingSetStrategy) -> Self {
        self.config.solver.working_set_strategy = strategy;
        self
    }

    /// 0 = all cores, 1 = sequential, n = exactly n threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Declare the input dimensionality; wider instances are rejected
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.config.n_features = Some(n_features);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn train<D: Dataset + ?Sized>(&self, dataset: &D) -> Result<TrainedModel> {
        self.train_samples(dataset.samples())
    }

    /// Train on samples
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedModel> {
        self.config.validate()?;
        if let Some(expected) = self.config.n_features {
            if let Some(dim) = samples
                .iter()
                .map(|s| s.features.dim())
                .find(|&dim| dim > expected)
            {
                return Err(SVMError::DimensionMismatch {
                    expected,
                    actual: dim,
                });
            }
        }

        let config = &self.config;
        run_with_threads(config.threads, |parallelism| {
            TrainedModel::fit(samples, config, parallelism)
        })?
    }

    /// Train from LibSVM format file
    pub fn train_from_file<P: AsRef<Path>>(&self, path: P) -> Result<TrainedModel> {
        let start = Instant::now();
        let dataset = LibSVMDataset::from_file_with_features(path, self.config.n_features)?;
        let loading = start.elapsed();
        info!(
            "loaded {} samples ({} features) in {:.3}s",
            dataset.len(),
            dataset.dim(),
            loading.as_secs_f64()
        );

        let mut model = self.train(&dataset)?;
        model.set_data_loading_time(loading);
        Ok(model)
    }
}

impl TrainedModel {
    /// Predict labels, scoring `batch_size` instances at a time
    pub fn predict_batch(&self, xs: &[SparseVector], batch_size: usize) -> Result<Vec<i32>> {
        run_with_threads(self.config().threads, |parallelism| {
            MultiPredictor::new(self)
                .with_batch_size(batch_size)
                .with_parallelism(parallelism)
                .predict(xs)
        })
    }

    /// Evaluate on labeled samples
    pub fn evaluate(
        &self,
        samples: &[Sample],
        batch_size: usize,
    ) -> Result<(EvaluationReport, ConfusionMatrix)> {
        run_with_threads(self.config().threads, |parallelism| {
            MultiPredictor::new(self)
                .with_batch_size(batch_size)
                .with_parallelism(parallelism)
                .evaluate(samples)
        })?
    }

    /// Predict from LibSVM file; labels in the file are ignored
    pub fn predict_file<P: AsRef<Path>>(&self, path: P, batch_size: usize) -> Result<Vec<i32>> {
        let dataset = LibSVMDataset::from_file(path)?;
        let xs: Vec<SparseVector> = dataset.into_samples().into_iter().map(|s| s.features).collect();
        self.predict_batch(&xs, batch_size)
    }

    /// Evaluate on a LibSVM file
    pub fn evaluate_file<P: AsRef<Path>>(
        &self,
        path: P,
        batch_size: usize,
    ) -> Result<(EvaluationReport, ConfusionMatrix)> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.evaluate(dataset.samples(), batch_size)
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            kernel: *self.kernel(),
            labels: self.labels().to_vec(),
            n_pairwise_models: self.models().len(),
            n_support_vectors: self.n_support_vectors(),
        }
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub kernel: KernelKind,
    pub labels: Vec<i32>,
    pub n_pairwise_models: usize,
    pub n_support_vectors: usize,
}
