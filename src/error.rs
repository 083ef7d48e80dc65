use thiserror::Error;

/// Errors raised by the topic-modeling pipeline.
///
/// `Input` and `Configuration` abort a run outright. Numeric degenerate
/// cases (zero-weight terms, zero-sum membership) are never reported here;
/// they are smoothed or guarded where they occur.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Malformed or empty document-term representation, or a topic count
    /// the data cannot support.
    #[error("input error: {0}")]
    Input(String),

    /// Invalid sweep bounds or configuration values.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Coherence could not be computed (empty tokenized corpus).
    #[error("scoring error: {0}")]
    Scoring(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopicError>;
