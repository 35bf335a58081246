//! ONNX classifier loading and raw output extraction.

use std::path::Path;
use std::sync::Mutex;

use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use tracing::info;

use crate::error::{ArtifactError, InferenceError};
use crate::model::inference::{Classifier, ClassifierOutput};

/// Classifier backed by an ONNX Runtime session.
///
/// A session run needs exclusive access, so the session sits behind a mutex
/// while everything else about the classifier stays read-only. Concurrent
/// submissions serialize here, which is fine for a single-user form.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    name: String,
    input_name: String,
    label_output: String,
    probability_output: String,
}

impl OnnxClassifier {
    /// Load the classifier artifact and discover its input and output names.
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self, ArtifactError> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = build_session(path, onnx_threads).map_err(|source| ArtifactError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Classifier exports carry a label output and a probability output;
        // without the label there is nothing to turn into a verdict.
        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::MissingLabelOutput {
                path: path.to_path_buf(),
            })?;

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| o.name != label_output))
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::MissingProbabilityOutput {
                path: path.to_path_buf(),
            })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("model.onnx")
            .to_string();

        info!(
            model = %name,
            input = %input_name,
            label_output = %label_output,
            probability_output = %probability_output,
            "Model loaded successfully"
        );

        Ok(Self {
            session: Mutex::new(session),
            name,
            input_name,
            label_output,
            probability_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &[f32]) -> Result<ClassifierOutput, InferenceError> {
        use ort::value::Tensor;

        // Input shape [1, num_features]: one row per run.
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))?;

        let mut session =
            self.session
                .lock()
                .map_err(|e| InferenceError::SessionUnavailable {
                    reason: e.to_string(),
                })?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let label = extract_label(&outputs, &self.label_output)?;
        let probabilities = extract_probabilities(&outputs, &self.probability_output)?;

        Ok(ClassifierOutput {
            label,
            probabilities,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn build_session(path: &Path, onnx_threads: usize) -> Result<Session, ort::Error> {
    ort::init().commit()?;

    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(path)
}

fn extract_label(
    outputs: &ort::session::SessionOutputs,
    name: &str,
) -> Result<i64, InferenceError> {
    let output = outputs.get(name).ok_or_else(|| InferenceError::MissingOutput {
        name: name.to_string(),
    })?;

    let (_, data) = output
        .try_extract_tensor::<i64>()
        .map_err(|e| InferenceError::Label {
            reason: e.to_string(),
        })?;

    data.first().copied().ok_or_else(|| InferenceError::Label {
        reason: "label output is empty".to_string(),
    })
}

/// Read the class probability distribution, keyed by class id.
///
/// Handles both shapes classifier exporters produce: seq(map(int64, float))
/// when ZipMap is left on, where the map keys are the training class ids,
/// and a plain `[1, num_classes]` tensor whose columns follow ascending
/// class order.
fn extract_probabilities(
    outputs: &ort::session::SessionOutputs,
    name: &str,
) -> Result<Vec<(i64, f32)>, InferenceError> {
    let output = outputs.get(name).ok_or_else(|| InferenceError::MissingOutput {
        name: name.to_string(),
    })?;

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output);
    }

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError::Probabilities {
            reason: e.to_string(),
        })?;

    let dims: Vec<i64> = shape.iter().copied().collect();
    let class_probs: &[f32] = match dims.as_slice() {
        [1, n] if *n as usize == data.len() => data,
        [n] if *n as usize == data.len() => data,
        _ => {
            return Err(InferenceError::Probabilities {
                reason: format!("unsupported probability shape {dims:?}"),
            })
        }
    };

    Ok(class_probs
        .iter()
        .enumerate()
        .map(|(class, prob)| (class as i64, *prob))
        .collect())
}

/// Extract from seq(map(int64, float)) format.
fn extract_from_sequence_map(
    output: &ort::value::DynValue,
) -> Result<Vec<(i64, f32)>, InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| InferenceError::Probabilities {
            reason: format!("failed to downcast to sequence: {e}"),
        })?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| InferenceError::Probabilities {
            reason: e.to_string(),
        })?;

    // Batch size is always 1, so the first map is the whole answer.
    let map_value = maps.first().ok_or_else(|| InferenceError::Probabilities {
        reason: "empty probability sequence".to_string(),
    })?;

    map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| InferenceError::Probabilities {
            reason: e.to_string(),
        })
}
