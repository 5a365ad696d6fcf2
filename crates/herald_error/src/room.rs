//! Room lifecycle error types.

use crate::TransportError;

/// Kinds of room errors.
///
/// Create/destroy races get their own kinds so callers can tell
/// "already exists" apart from a transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RoomErrorKind {
    /// Tried to create a room that already exists.
    #[display("Room {} already exists", _0)]
    AlreadyExists(String),
    /// Tried to use or destroy a room that does not exist.
    #[display("Room {} doesn't exist", _0)]
    DoesNotExist(String),
    /// Resolved channel is not a category.
    #[display("{} is not a category", _0)]
    NotACategory(String),
    /// Operation not supported for this kind of room.
    #[display("Unsupported room operation: {}", _0)]
    Unsupported(String),
    /// Awaited operation did not complete in time.
    #[display("Timed out after {}s waiting for {}", seconds, operation)]
    Timeout {
        /// Operation that was awaited.
        operation: String,
        /// Timeout that elapsed.
        seconds: u64,
    },
    /// Platform reported a failure.
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// Outbound queue is closed (backend disconnected).
    #[display("Outbound queue closed")]
    QueueClosed,
}

/// Room error with location tracking.
///
/// # Examples
///
/// ```
/// use herald_error::{RoomError, RoomErrorKind};
///
/// let err = RoomError::new(RoomErrorKind::AlreadyExists("#general".to_string()));
/// assert!(format!("{}", err).contains("already exists"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Room Error: {} at line {} in {}", kind, line, file)]
pub struct RoomError {
    /// The kind of error that occurred
    pub kind: RoomErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RoomError {
    /// Create a new room error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RoomErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RoomErrorKind {
        &self.kind
    }
}

impl From<TransportError> for RoomError {
    #[track_caller]
    fn from(err: TransportError) -> Self {
        RoomError::new(RoomErrorKind::Transport(err.message))
    }
}

/// Result type for room operations.
pub type RoomResult<T> = Result<T, RoomError>;
