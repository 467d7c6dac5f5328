//! Batched one-vs-one prediction
//!
//! Instances are scored in fixed-size batches to bound peak memory. Within a
//! batch instances may be scored in parallel; the confusion matrix is only
//! touched afterwards, on the calling thread. Batch size never changes a
//! prediction.

pub mod confusion;

pub use self::confusion::*;

use crate::backend::Parallelism;
use crate::core::{Result, SVMError, Sample, SparseVector};
use crate::metrics::EvaluationReport;
use crate::model::TrainedModel;
use log::{debug, warn};
use rayon::prelude::*;
use std::time::Instant;

/// Batch size used when none is configured
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Majority-vote predictor over a trained model
#[derive(Debug, Clone, Copy)]
pub struct MultiPredictor<'m> {
    model: &'m TrainedModel,
    batch_size: usize,
    parallelism: Parallelism,
}

impl<'m> MultiPredictor<'m> {
    pub fn new(model: &'m TrainedModel) -> Self {
        Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
            parallelism: Parallelism::Sequential,
        }
    }

    /// Set the batch size; zero is treated as one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Winning class index for each instance
    pub fn predict_classes(&self, xs: &[SparseVector]) -> Vec<usize> {
        let mut classes = Vec::with_capacity(xs.len());
        for batch in xs.chunks(self.batch_size) {
            classes.extend(self.score_batch(batch, |x| x));
        }
        classes
    }

    /// Predicted label for each instance
    pub fn predict(&self, xs: &[SparseVector]) -> Vec<i32> {
        self.predict_classes(xs)
            .into_iter()
            .map(|class| self.model.label(class))
            .collect()
    }

    /// Score labeled samples, filling the caller's confusion matrix
    ///
    /// The matrix is zeroed first and must be sized to the model's class
    /// count. Samples whose label the model never saw count as errors and
    /// are left out of the matrix.
    pub fn evaluate_into(
        &self,
        samples: &[Sample],
        confusion: &mut ConfusionMatrix,
    ) -> Result<EvaluationReport> {
        let n_classes = self.model.labels().len();
        if confusion.n_classes() != n_classes {
            return Err(SVMError::DimensionMismatch {
                expected: n_classes,
                actual: confusion.n_classes(),
            });
        }
        confusion.reset();

        let start = Instant::now();
        let mut correct = 0;
        let mut unknown = 0;
        for (batch_idx, batch) in samples.chunks(self.batch_size).enumerate() {
            let predicted = self.score_batch(batch, |s| &s.features);
            for (sample, &class) in batch.iter().zip(&predicted) {
                match self.model.class_index(sample.label) {
                    Some(actual) => {
                        confusion.record(actual, class);
                        if actual == class {
                            correct += 1;
                        }
                    }
                    None => unknown += 1,
                }
            }
            debug!("scored batch {} ({} samples)", batch_idx, batch.len());
        }

        if unknown > 0 {
            warn!("{unknown} samples carry labels the model was not trained on");
        }
        Ok(EvaluationReport::new(correct, samples.len(), start.elapsed()))
    }

    /// Score labeled samples with a fresh confusion matrix
    pub fn evaluate(&self, samples: &[Sample]) -> Result<(EvaluationReport, ConfusionMatrix)> {
        let mut confusion = ConfusionMatrix::new(self.model.labels().len());
        let report = self.evaluate_into(samples, &mut confusion)?;
        Ok((report, confusion))
    }

    fn score_batch<T, F>(&self, batch: &[T], features: F) -> Vec<usize>
    where
        T: Sync,
        F: Fn(&T) -> &SparseVector + Sync,
    {
        if self.parallelism.is_parallel() {
            batch
                .par_iter()
                .map(|item| self.model.predict_class(features(item)))
                .collect()
        } else {
            batch
                .iter()
                .map(|item| self.model.predict_class(features(item)))
                .collect()
        }
    }
}
