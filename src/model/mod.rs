//! One-vs-one multi-class model
//!
//! For k classes a fit solves k(k-1)/2 independent binary problems. Each pair
//! gets its own solver run and its own kernel cache, so pairs can be solved
//! concurrently. The resulting [`TrainedModel`] is immutable.

pub mod pairwise;

pub use self::pairwise::*;

use crate::backend::Parallelism;
use crate::cache::CacheStats;
use crate::core::{
    Classifier, ConvergenceStatus, Result, SVMError, Sample, SparseVector, TrainingConfig,
};
use crate::data::{class_pairs, SvmProblem};
use crate::kernel::KernelKind;
use crate::metrics::TrainingTimings;
use crate::solver::SMOSolver;
use log::{info, warn};
use std::time::{Duration, Instant};

/// Diagnostics gathered while fitting
///
/// Phase timings are summed over pairs, so with parallel pair solving they
/// can exceed `timings.total`, which is wall-clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub timings: TrainingTimings,
    pub cache_stats: CacheStats,
    pub iterations: usize,
    /// Pairs that stopped at the iteration cap
    pub unconverged_pairs: usize,
}

/// Trained one-vs-one classifier
#[derive(Debug, Clone)]
pub struct TrainedModel {
    config: TrainingConfig,
    /// Distinct labels in ascending order; class index = position
    labels: Vec<i32>,
    /// One model per class pair in (0,1), (0,2), ... order
    models: Vec<PairwiseModel>,
    report: TrainingReport,
}

struct PairOutcome {
    model: PairwiseModel,
    iterations: usize,
    timings: TrainingTimings,
    cache_stats: CacheStats,
}

impl TrainedModel {
    /// Fit one binary model per class pair
    pub fn fit(
        samples: &[Sample],
        config: &TrainingConfig,
        parallelism: Parallelism,
    ) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let problem = SvmProblem::new(samples)?;
        let pairs = problem.pairs();
        info!(
            "training {} pairwise models for {} classes on {} samples ({} kernel)",
            pairs.len(),
            problem.n_classes(),
            samples.len(),
            config.kernel.name()
        );

        let solver = SMOSolver::new(config.kernel, parallelism, config.solver.clone());
        let outcomes = parallelism.maybe_par_map(pairs, |(a, b)| -> Result<PairOutcome> {
            let binary = problem.pair_problem(a, b)?;
            let solution = solver.solve(&binary.points, &binary.y)?;
            let (label_a, label_b) = (problem.labels()[a], problem.labels()[b]);

            if !solution.status.is_converged() {
                warn!(
                    "pair ({label_a}, {label_b}) stopped at the iteration limit; using partial solution"
                );
            }
            info!(
                "pair ({}, {}): {} samples, {} support vectors, {} iterations",
                label_a,
                label_b,
                binary.len(),
                solution.support_vectors.len(),
                solution.iterations
            );

            Ok(PairOutcome {
                model: PairwiseModel::from_solution(&binary, &solution),
                iterations: solution.iterations,
                timings: solution.timings,
                cache_stats: solution.cache_stats,
            })
        });

        let mut report = TrainingReport::default();
        let mut models = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let outcome = outcome?;
            report.timings += outcome.timings;
            report.cache_stats += outcome.cache_stats;
            report.iterations += outcome.iterations;
            if outcome.model.status() == ConvergenceStatus::IterationLimit {
                report.unconverged_pairs += 1;
            }
            models.push(outcome.model);
        }
        report.timings.total = start.elapsed();

        Ok(Self {
            config: config.clone(),
            labels: problem.labels().to_vec(),
            models,
            report,
        })
    }

    /// Reassemble a model from stored parts
    pub fn from_parts(
        config: TrainingConfig,
        labels: Vec<i32>,
        models: Vec<PairwiseModel>,
    ) -> Result<Self> {
        if labels.len() < 2 {
            return Err(SVMError::DegenerateProblem(format!(
                "a model needs at least two classes, got {}",
                labels.len()
            )));
        }
        if labels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SVMError::InvalidParameter(
                "class labels must be strictly ascending".to_string(),
            ));
        }

        let expected = class_pairs(labels.len());
        if models.len() != expected.len() {
            return Err(SVMError::DimensionMismatch {
                expected: expected.len(),
                actual: models.len(),
            });
        }
        if let Some((m, _)) = models
            .iter()
            .zip(&expected)
            .find(|(m, pair)| m.classes() != **pair)
        {
            return Err(SVMError::InvalidParameter(format!(
                "pairwise model for classes {:?} is out of order",
                m.classes()
            )));
        }

        Ok(Self {
            config,
            labels,
            models,
            report: TrainingReport::default(),
        })
    }

    /// Vote count per class index for one instance
    pub fn votes(&self, x: &SparseVector) -> Vec<u32> {
        let mut votes = vec![0u32; self.labels.len()];
        for model in &self.models {
            votes[model.vote(&self.config.kernel, x)] += 1;
        }
        votes
    }

    /// Class index with the most votes; ties go to the lowest index
    pub fn predict_class(&self, x: &SparseVector) -> usize {
        let votes = self.votes(x);
        let mut best = 0;
        for (class, &count) in votes.iter().enumerate().skip(1) {
            if count > votes[best] {
                best = class;
            }
        }
        best
    }

    pub fn class_index(&self, label: i32) -> Option<usize> {
        self.labels.binary_search(&label).ok()
    }

    pub fn label(&self, class: usize) -> i32 {
        self.labels[class]
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn kernel(&self) -> &KernelKind {
        &self.config.kernel
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn models(&self) -> &[PairwiseModel] {
        &self.models
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Record time spent loading the training data
    pub fn set_data_loading_time(&mut self, elapsed: Duration) {
        self.report.timings.data_loading = elapsed;
    }

    /// Support vectors summed over all pairwise models
    pub fn n_support_vectors(&self) -> usize {
        self.models.iter().map(|m| m.n_support_vectors()).sum()
    }
}

impl Classifier for TrainedModel {
    fn predict_one(&self, x: &SparseVector) -> i32 {
        self.labels[self.predict_class(x)]
    }

    fn n_classes(&self) -> usize {
        self.labels.len()
    }
}
