//! Interactive Fraud Scoring Service
//!
//! Serves a single-page transaction form and scores each submission with a
//! previously trained binary classifier. Submissions are one-hot encoded,
//! aligned to the training-time column order, and run through an ONNX
//! session whose label and probability outputs become the displayed verdict.

pub mod config;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod model;
pub mod schema;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use encoder::{AlignedRow, FeatureEncoder};
pub use error::{ArtifactError, InferenceError, ValidationError};
pub use model::inference::InferenceEngine;
pub use schema::FeatureSchema;
pub use types::{PredictionResult, TransactionRecord, Verdict};
