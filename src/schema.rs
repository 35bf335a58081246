//! Training-time column schema.
//!
//! The schema artifact is a JSON array of column names in the exact order
//! the classifier was trained on. It is produced by the training pipeline
//! together with the model file, loaded once at startup, and never mutated;
//! every encoded row is projected against it before inference.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::ArtifactError;

/// Ordered, read-only list of the columns the classifier expects.
///
/// Keeps a name-to-position index alongside the ordered list so projection
/// and tests can look columns up without scanning.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from an explicit column list.
    ///
    /// Rejects empty lists and duplicate names; a duplicate would make the
    /// projection ambiguous and silently corrupt every row.
    pub fn from_columns(columns: Vec<String>) -> Result<Self, ArtifactError> {
        if columns.is_empty() {
            return Err(ArtifactError::EmptySchema);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(ArtifactError::DuplicateColumn {
                    column: name.clone(),
                });
            }
        }

        Ok(Self { columns, index })
    }

    /// Load the schema artifact from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();

        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::ParseSchema {
                path: path.to_path_buf(),
                source,
            })?;

        let schema = Self::from_columns(columns)?;
        info!(
            path = %path.display(),
            columns = schema.len(),
            "Schema artifact loaded"
        );
        Ok(schema)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false after a successful load; kept for completeness.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in training order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of `name` in training order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}
