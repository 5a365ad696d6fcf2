//! Transport error types.
//!
//! Raised by the platform client, never by the routing core itself.

/// Transport error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", message, line, file)]
pub struct TransportError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl TransportError {
    /// Create a new TransportError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use herald_error::TransportError;
    ///
    /// let err = TransportError::new("Gateway closed");
    /// assert!(err.message.contains("closed"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for platform transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(feature = "discord")]
impl From<serenity::Error> for TransportError {
    #[track_caller]
    fn from(err: serenity::Error) -> Self {
        TransportError::new(format!("Serenity API error: {}", err))
    }
}
