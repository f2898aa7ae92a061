/// Result alias that carries the custom [`TimelineError`] type.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// A beat list failed validation: unsorted or duplicate timestamps,
    /// timestamps outside `[0, duration]`, a negative duration or an
    /// intensity outside `[0, 1]`.
    #[error("invalid beat sequence: {0}")]
    InvalidSequence(String),
    /// Accessor called with an index past the end of the sequence.
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// The decoded audio handed to the engine is malformed.
    #[error("invalid audio signal: {0}")]
    InvalidSignal(String),
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Free-form failure, such as a poisoned timeline lock or an audio file
    /// the decoder could not read.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl TimelineError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_sequence<T: Into<String>>(msg: T) -> Self {
        Self::InvalidSequence(msg.into())
    }
}
