//! Error types for the embedding, similarity and clustering pipeline.
//!
//! Every variant except [`PipelineError::Storage`] is raised before any output
//! is written, so a failed run leaves the persisted corpus untouched.

use thiserror::Error;

use crate::storage::StorageError;
use crate::types::Platform;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input at {location}: {reason}")]
    Schema { location: String, reason: String },

    #[error("Corpus contains no posts")]
    EmptyCorpus,

    #[error("Duplicate post id '{id}'")]
    DuplicateId { id: String },

    #[error("Embedding dimension mismatch at position {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: usize,
        found: usize,
        index: usize,
    },

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Invalid cluster count: requested {requested}, but corpus has {n_items} posts")]
    InvalidClusterCount { requested: usize, n_items: usize },

    #[error("Result count mismatch: {posts} posts but {results} {kind}")]
    ResultMismatch {
        posts: usize,
        results: usize,
        kind: &'static str,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } | Self::InvalidClusterCount { .. } => 2,
            Self::Schema { .. }
            | Self::EmptyCorpus
            | Self::DuplicateId { .. }
            | Self::DimensionMismatch { .. } => 3,
            Self::ResultMismatch { .. } | Self::Storage(_) => 1,
        }
    }

    /// Schema error for the post at `platform[index]`.
    pub(crate) fn schema_at(platform: Platform, index: usize, reason: impl Into<String>) -> Self {
        Self::Schema {
            location: format!("{platform}[{index}]"),
            reason: reason.into(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PipelineError::EmptyCorpus.exit_code(), 3);
        assert_eq!(
            PipelineError::InvalidClusterCount {
                requested: 3,
                n_items: 2
            }
            .exit_code(),
            2
        );
        let io = StorageError::FileRead {
            path: "missing.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(PipelineError::from(io).exit_code(), 1);
    }

    #[test]
    fn test_schema_message_names_location() {
        let err = PipelineError::schema_at(Platform::Reddit, 4, "missing field `content`");
        assert_eq!(
            err.to_string(),
            "Invalid input at reddit[4]: missing field `content`"
        );
    }
}
