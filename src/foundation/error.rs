/// Crate-wide result alias.
pub type PenReplayResult<T> = Result<T, PenReplayError>;

/// Errors surfaced by the replay engine.
///
/// Per-stroke and per-clip faults are absorbed where they occur; only job-level failures
/// (unreadable document, unwritable output, encoder failure) travel through this type.
#[derive(thiserror::Error, Debug)]
pub enum PenReplayError {
    /// Invalid caller input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Input document could not be read or understood.
    #[error("document error: {0}")]
    Document(String),

    /// Audio sample decoding or synthesis failure.
    #[error("audio error: {0}")]
    Audio(String),

    /// Frame output or external encoder failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its original context chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PenReplayError {
    /// Build a [`PenReplayError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PenReplayError::Document`].
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Build a [`PenReplayError::Audio`].
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`PenReplayError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PenReplayError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
