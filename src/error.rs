//! Error Types
//!
//! Failures that leave the library. Vocabulary misses are not errors; see
//! [`QueryOutcome`](crate::model::QueryOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// The vector file could not be turned into an embedding store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read vector data: {0}")]
    Read(#[from] std::io::Error),

    #[error("vector file is empty, expected a `<vocab_size> <dimension>` header")]
    MissingHeader,

    #[error("line 1: malformed header {0:?}, expected `<vocab_size> <dimension>`")]
    MalformedHeader(String),

    #[error("line {line}: malformed vector component {value:?}")]
    MalformedValue { line: usize, value: String },

    #[error("line {line}: expected {expected} components, got {actual}")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("header declares {declared} words but the file holds {actual}")]
    VocabSizeMismatch { declared: usize, actual: usize },

    #[error("line {line}: duplicate word {word:?}")]
    DuplicateWord { line: usize, word: String },

    #[error("vector file declares an empty vocabulary or a zero dimension")]
    EmptyVocabulary,
}

/// The ranking-size side channel could not be decoded.
///
/// Never surfaced to callers: the service falls back to the default topn.
#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("custom attributes are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("custom attributes carry no `topn` key")]
    MissingTopn,

    #[error("`topn` is not a positive integer: {0}")]
    InvalidTopn(String),
}

/// The tabular request body could not be decoded.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("request body is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
}
