//! Classifier loading and inference

pub mod inference;
pub mod loader;

pub use inference::{Classifier, ClassifierOutput, InferenceEngine};
pub use loader::OnnxClassifier;
