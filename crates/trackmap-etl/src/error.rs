//! Error types for the export pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort an export run.
///
/// Degraded conditions (missing playlist data, artist join misses,
/// malformed genre fields) are resolved with defaults and never surface
/// here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input file does not exist.
    #[error("missing {source_name} at {}", path.display())]
    MissingSource {
        source_name: &'static str,
        path: PathBuf,
    },

    /// An input file exists but could not be read.
    #[error("failed to read {}: {error}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A line or document of an input file could not be parsed.
    #[error("parse error in {} line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A vocabulary vector has a different length than the first one.
    #[error("{} line {line}: vector has {found} dimensions, expected {expected}", path.display())]
    DimensionMismatch {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The embedding vocabulary contains no vectors.
    #[error("embedding vocabulary at {} is empty", path.display())]
    EmptyVocabulary { path: PathBuf },

    /// A consolidated track has no vector in the vocabulary.
    #[error("no embedding for track {id}")]
    MissingEmbedding { id: String },

    /// The projector broke its row-count contract.
    #[error("projection returned {found} rows for {expected} tracks")]
    Projection { expected: usize, found: usize },

    /// An output artifact could not be written.
    #[error("failed to write {}: {error}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// An error propagated from the core domain layer.
    #[error("core error: {0}")]
    Core(#[from] trackmap_core::Error),
}

impl PipelineError {
    /// Returns `true` when the error comes from reading or validating an
    /// input source rather than from producing outputs.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            Self::MissingSource { .. }
                | Self::Read { .. }
                | Self::Parse { .. }
                | Self::DimensionMismatch { .. }
                | Self::EmptyVocabulary { .. }
        )
    }
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_classified() {
        let missing = PipelineError::MissingSource {
            source_name: "track metadata",
            path: PathBuf::from("/data/tracks.jsonl"),
        };
        assert!(missing.is_fatal_input());
        assert_eq!(
            missing.to_string(),
            "missing track metadata at /data/tracks.jsonl"
        );

        let projection = PipelineError::Projection {
            expected: 3,
            found: 2,
        };
        assert!(!projection.is_fatal_input());
    }
}
