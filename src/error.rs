//! Error types for vidpipe

use thiserror::Error;

/// Result type alias for vidpipe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidpipe
#[derive(Error, Debug)]
pub enum Error {
    /// Codec engine error
    #[error("Codec error: {0}")]
    Codec(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),

    /// Hardware subsystem error
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported codec or pixel format
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// End of stream
    #[error("End of stream")]
    EndOfStream,

    /// Try again later
    #[error("Try again")]
    TryAgain,

    /// Buffer too small
    #[error("Buffer too small: need {need}, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a codec error
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Error::Codec(msg.into())
    }

    /// Create an initialization error
    pub fn init<S: Into<String>>(msg: S) -> Self {
        Error::Init(msg.into())
    }

    /// Create a hardware error
    pub fn hardware<S: Into<String>>(msg: S) -> Self {
        Error::Hardware(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// True for the transient submit/retrieve signals that mean
    /// "no output available right now" rather than failure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::TryAgain | Error::EndOfStream)
    }
}
