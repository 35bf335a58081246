//! Inference engine: classifier output to verdict mapping.

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::encoder::AlignedRow;
use crate::error::{ArtifactError, InferenceError};
use crate::model::loader::OnnxClassifier;
use crate::schema::FeatureSchema;
use crate::types::{PredictionResult, Verdict};

/// Raw classifier output for one row: the predicted label plus the
/// class-keyed probability distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutput {
    pub label: i64,
    pub probabilities: Vec<(i64, f32)>,
}

/// Seam between the scoring service and a concrete classifier runtime.
pub trait Classifier: Send + Sync {
    /// Score one aligned feature row.
    fn classify(&self, features: &[f32]) -> Result<ClassifierOutput, InferenceError>;

    /// Short display name for logs and health output.
    fn name(&self) -> &str;
}

/// Inference engine wrapping the loaded classifier.
pub struct InferenceEngine {
    classifier: Box<dyn Classifier>,
}

impl InferenceEngine {
    /// Load the configured model artifact and probe it against `schema`.
    pub fn new(config: &AppConfig, schema: &FeatureSchema) -> Result<Self, ArtifactError> {
        let classifier =
            OnnxClassifier::load(&config.artifacts.model_path, config.artifacts.onnx_threads)?;
        let engine = Self::with_classifier(Box::new(classifier));
        engine.probe(schema.len())?;
        Ok(engine)
    }

    /// Build an engine around an already constructed classifier.
    pub fn with_classifier(classifier: Box<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Classifier display name.
    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Score one all-zero row of `width` columns.
    ///
    /// Run once at startup so a width drift between the schema artifact and
    /// the model input fails the process instead of the first submission.
    pub fn probe(&self, width: usize) -> Result<(), ArtifactError> {
        let started = std::time::Instant::now();
        let zero_row = vec![0.0_f32; width];

        self.classifier
            .classify(&zero_row)
            .map_err(|source| ArtifactError::Probe { width, source })?;

        info!(
            width = width,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Probe inference succeeded"
        );
        Ok(())
    }

    /// Run the classifier on an aligned row and map its output to a verdict.
    ///
    /// The verdict follows the model's own label output; nothing is
    /// re-thresholded here. P(fraud) is looked up by class id 1 in the
    /// returned distribution, and the reported probability belongs to the
    /// verdict: P(fraud) when fraudulent, 1 - P(fraud) when legitimate.
    pub fn predict(&self, row: &AlignedRow) -> Result<PredictionResult, InferenceError> {
        let output = self.classifier.classify(row.values())?;

        let verdict = match output.label {
            1 => Verdict::Fraudulent,
            0 => Verdict::Legitimate,
            label => return Err(InferenceError::UnexpectedLabel { label }),
        };

        // Find class 1 (fraud) probability by key, not by position.
        let fraud_probability = output
            .probabilities
            .iter()
            .find(|(class, _)| *class == 1)
            .map(|(_, prob)| f64::from(*prob))
            .ok_or(InferenceError::MissingClass { class: 1 })?;

        if !(0.0..=1.0).contains(&fraud_probability) {
            return Err(InferenceError::ProbabilityRange {
                value: fraud_probability,
            });
        }

        let probability = if verdict.is_fraud() {
            fraud_probability
        } else {
            1.0 - fraud_probability
        };

        debug!(
            label = output.label,
            fraud_probability = fraud_probability,
            "Classifier output mapped"
        );

        Ok(PredictionResult {
            verdict,
            probability,
        })
    }
}
