//! Error taxonomy for the scoring service.
//!
//! Three kinds, matching how far a request gets: `ArtifactError` stops the
//! process before it serves anything, `ValidationError` rejects a submission
//! before the classifier runs, `InferenceError` aborts a submission that
//! already reached the classifier. None of them are retried.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Startup failure while loading the model or schema artifacts.
///
/// Fatal: the process logs the error and exits without serving requests.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Artifact file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Schema artifact is not a JSON array of column names.
    #[error("failed to parse schema {path:?}: {source}")]
    ParseSchema {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Schema artifact contains no columns.
    #[error("schema lists no columns")]
    EmptySchema,
    /// Schema artifact lists the same column twice; projection against it
    /// would be ambiguous.
    #[error("schema lists column {column:?} more than once")]
    DuplicateColumn { column: String },
    /// ONNX session could not be created from the model file.
    #[error("failed to load model {path:?}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },
    /// Model exposes no label output, so no verdict can be read from it.
    #[error("model {path:?} exposes no label output")]
    MissingLabelOutput { path: PathBuf },
    /// Model exposes no probability output.
    #[error("model {path:?} exposes no probability output")]
    MissingProbabilityOutput { path: PathBuf },
    /// Probe inference on an all-zero row failed at startup, usually a
    /// width drift between the schema artifact and the model input.
    #[error("probe inference on a {width}-column row failed: {source}")]
    Probe {
        width: usize,
        #[source]
        source: InferenceError,
    },
}

/// A submitted categorical value outside the known catalogs.
///
/// The submission is rejected before encoding; the classifier never sees a
/// row with an unmatched (all-zero) indicator block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Country selection matching neither a catalog name nor a code.
    #[error("{field}: unknown country {value:?}")]
    UnknownCountry { field: &'static str, value: String },
    /// Channel other than App/Web.
    #[error("channel: unknown value {value:?} (expected App or Web)")]
    UnknownChannel { value: String },
    /// Merchant category outside the fixed catalog.
    #[error("merchant_category: unknown value {value:?}")]
    UnknownMerchantCategory { value: String },
    /// Yes/No selection carrying anything else.
    #[error("{field}: expected Yes or No, got {value:?}")]
    InvalidFlag { field: &'static str, value: String },
}

/// Classifier failure while scoring an already validated row.
///
/// Recoverable at request level: the submission is aborted with no partial
/// result and the service keeps running.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// Session lock poisoned by a panicking inference.
    #[error("classifier session unavailable: {reason}")]
    SessionUnavailable { reason: String },
    /// ONNX Runtime rejected the run.
    #[error("classifier run failed: {source}")]
    Run {
        #[from]
        source: ort::Error,
    },
    /// Declared output missing from the session results.
    #[error("classifier output {name:?} missing from results")]
    MissingOutput { name: String },
    /// Label output unreadable or empty.
    #[error("could not read class label: {reason}")]
    Label { reason: String },
    /// Probability output unreadable in any supported format.
    #[error("could not read class probabilities: {reason}")]
    Probabilities { reason: String },
    /// Binary classifier returned a label other than 0 or 1.
    #[error("unexpected class label {label}")]
    UnexpectedLabel { label: i64 },
    /// Class-keyed distribution without the requested class.
    #[error("class {class} absent from the probability distribution")]
    MissingClass { class: i64 },
    /// Probability outside [0, 1].
    #[error("probability {value} outside [0, 1]")]
    ProbabilityRange { value: f64 },
}

/// Request-level failure surfaced to the caller as a status plus JSON body.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::Validation(_) => StatusCode::BAD_REQUEST,
            RequestError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
