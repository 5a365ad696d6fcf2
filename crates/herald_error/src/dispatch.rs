//! Outbound dispatch error types.

use crate::TransportError;

/// Kinds of dispatch errors.
///
/// Contract violations (`UnsendableDestination`, `InvalidColor`,
/// `InvalidReplyOrigin`, `NotReady`) are raised before any network operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DispatchErrorKind {
    /// Destination cannot receive messages (categories, nonexistent rooms).
    #[display("{} doesn't support sending messages", _0)]
    UnsendableDestination(String),
    /// Card color is neither a palette name nor a hex literal.
    #[display("Invalid color: {:?}", _0)]
    InvalidColor(String),
    /// Group reply requested for a message that did not come from a room occupant.
    #[display("Non-direct messages must come from a room occupant, got {}", _0)]
    InvalidReplyOrigin(String),
    /// Bot identity is not known until the platform reports ready.
    #[display("Backend is not ready")]
    NotReady,
    /// Awaited operation did not complete in time.
    #[display("Timed out after {}s waiting for {}", seconds, operation)]
    Timeout {
        /// Operation that was awaited.
        operation: String,
        /// Timeout that elapsed.
        seconds: u64,
    },
    /// Platform reported a failure for an awaited operation.
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// Attachment could not be read.
    #[display("Failed to read attachment: {}", _0)]
    Attachment(String),
    /// Outbound queue is closed (backend disconnected).
    #[display("Outbound queue closed")]
    QueueClosed,
}

/// Dispatch error with location tracking.
///
/// # Examples
///
/// ```
/// use herald_error::{DispatchError, DispatchErrorKind};
///
/// let err = DispatchError::new(DispatchErrorKind::InvalidColor("mauve-ish".to_string()));
/// assert!(format!("{}", err).contains("Invalid color"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Dispatch Error: {} at line {} in {}", kind, line, file)]
pub struct DispatchError {
    /// The kind of error that occurred
    pub kind: DispatchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DispatchError {
    /// Create a new dispatch error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DispatchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DispatchErrorKind {
        &self.kind
    }
}

impl From<TransportError> for DispatchError {
    #[track_caller]
    fn from(err: TransportError) -> Self {
        DispatchError::new(DispatchErrorKind::Transport(err.message))
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
