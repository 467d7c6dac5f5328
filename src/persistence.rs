//! Model serialization and persistence
//!
//! Trained models are stored as pretty-printed JSON: the training
//! configuration, the class labels and every pairwise model's support
//! vectors, coefficients and bias.

use crate::core::{ConvergenceStatus, Result, SVMError, SparseVector, TrainingConfig};
use crate::model::{PairwiseModel, TrainedModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serializable representation of a trained multi-class model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Kernel and solver parameters the model was trained with
    pub config: TrainingConfig,
    /// Distinct class labels in ascending order
    pub labels: Vec<i32>,
    /// One entry per class pair, in (0,1), (0,2), ... order
    pub pairs: Vec<SerializablePair>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// One pairwise classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializablePair {
    pub class_a: usize,
    pub class_b: usize,
    pub support_vectors: Vec<SparseVector>,
    /// Alpha values times labels (alpha_i * y_i)
    pub alpha_y: Vec<f64>,
    pub bias: f64,
    pub status: ConvergenceStatus,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    pub n_classes: usize,
    /// Support vectors summed over all pairs
    pub n_support_vectors: usize,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl From<&PairwiseModel> for SerializablePair {
    fn from(model: &PairwiseModel) -> Self {
        let (class_a, class_b) = model.classes();
        Self {
            class_a,
            class_b,
            support_vectors: model.support_vectors().to_vec(),
            alpha_y: model.alpha_y().to_vec(),
            bias: model.bias(),
            status: model.status(),
        }
    }
}

impl SerializablePair {
    fn to_pairwise_model(&self) -> Result<PairwiseModel> {
        // Stored vectors skip the constructor's ordering checks
        let support_vectors = self
            .support_vectors
            .iter()
            .map(|sv| SparseVector::from_sorted(sv.indices.clone(), sv.values.clone()))
            .collect::<Result<Vec<_>>>()?;
        PairwiseModel::from_parts(
            self.class_a,
            self.class_b,
            support_vectors,
            self.alpha_y.clone(),
            self.bias,
            self.status,
        )
    }
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_trained_model(model: &TrainedModel) -> Self {
        Self {
            config: model.config().clone(),
            labels: model.labels().to_vec(),
            pairs: model.models().iter().map(SerializablePair::from).collect(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                n_classes: model.labels().len(),
                n_support_vectors: model.n_support_vectors(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Convert back to a trained model
    pub fn to_trained_model(&self) -> Result<TrainedModel> {
        self.config.kernel.validate()?;
        if self.metadata.n_classes != self.labels.len() {
            return Err(SVMError::InvalidModel(format!(
                "model declares {} classes but lists {} labels",
                self.metadata.n_classes,
                self.labels.len()
            )));
        }
        let models = self
            .pairs
            .iter()
            .map(SerializablePair::to_pairwise_model)
            .collect::<Result<Vec<_>>>()?;
        TrainedModel::from_parts(self.config.clone(), self.labels.clone(), models)
    }
}

impl fmt::Display for SerializableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solver = &self.config.solver;
        writeln!(f, "=== SVM Model Summary ===")?;
        writeln!(f, "Kernel: {}", self.config.kernel)?;
        writeln!(f, "Classes: {} {:?}", self.metadata.n_classes, self.labels)?;
        writeln!(f, "Pairwise Models: {}", self.pairs.len())?;
        writeln!(f, "Support Vectors: {}", self.metadata.n_support_vectors)?;
        let unconverged = self
            .pairs
            .iter()
            .filter(|p| p.status == ConvergenceStatus::IterationLimit)
            .count();
        if unconverged > 0 {
            writeln!(f, "Pairs stopped at iteration limit: {unconverged}")?;
        }
        writeln!(f, "Library Version: {}", self.metadata.library_version)?;
        writeln!(f, "Created: {}", self.metadata.created_at)?;
        writeln!(f, "Training Parameters:")?;
        writeln!(f, "  C: {}", solver.c)?;
        writeln!(f, "  Epsilon: {}", solver.epsilon)?;
        writeln!(f, "  Max Iterations: {}", solver.max_iterations)?;
        write!(f, "  Working Set: {:?}", solver.working_set_strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SVM;
    use crate::core::{Classifier, Sample};
    use crate::kernel::KernelKind;
    use tempfile::NamedTempFile;

    fn trained() -> (TrainedModel, Vec<Sample>) {
        let samples: Vec<Sample> = [(-2.0, 1), (-1.6, 1), (0.0, 2), (0.4, 2), (2.0, 3), (2.5, 3)]
            .iter()
            .map(|&(x, label)| Sample::new(SparseVector::new(vec![0, 3], vec![x, 1.0]), label))
            .collect();
        let model = SVM::new()
            .with_kernel(KernelKind::rbf(1.0))
            .with_threads(1)
            .train_samples(&samples)
            .expect("Training should succeed");
        (model, samples)
    }

    #[test]
    fn test_model_round_trip_predicts_identically() -> Result<()> {
        let (model, samples) = trained();
        let temp_file = NamedTempFile::new()?;

        SerializableModel::from_trained_model(&model).save_to_file(temp_file.path())?;
        let loaded = SerializableModel::load_from_file(temp_file.path())?;

        assert_eq!(loaded.labels, vec![1, 2, 3]);
        assert_eq!(loaded.pairs.len(), 3);
        assert_eq!(loaded.metadata.n_support_vectors, model.n_support_vectors());

        let restored = loaded.to_trained_model()?;
        assert_eq!(restored.models(), model.models());
        assert_eq!(restored.config(), model.config());
        for s in &samples {
            assert_eq!(restored.predict_one(&s.features), model.predict_one(&s.features));
        }
        Ok(())
    }

    #[test]
    fn test_corrupt_model_is_rejected() {
        let (model, _) = trained();
        let mut stored = SerializableModel::from_trained_model(&model);
        stored.pairs.pop();
        assert!(stored.to_trained_model().is_err());

        let mut stored = SerializableModel::from_trained_model(&model);
        stored.pairs[0].support_vectors[0].indices = vec![3, 0];
        assert!(stored.to_trained_model().is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        use std::io::Write;

        let mut temp_file = NamedTempFile::new().expect("temp file");
        write!(temp_file, "{{ not json").expect("write");
        let result = SerializableModel::load_from_file(temp_file.path());
        assert!(matches!(result, Err(SVMError::SerializationError(_))));
    }

    #[test]
    fn test_summary_mentions_kernel_and_classes() {
        let (model, _) = trained();
        let summary = SerializableModel::from_trained_model(&model).to_string();
        assert!(summary.contains("rbf"));
        assert!(summary.contains("Pairwise Models: 3"));
    }
}
