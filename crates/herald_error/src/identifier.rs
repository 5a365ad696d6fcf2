//! Identifier parsing and lookup error types.

/// Kinds of identifier errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum IdentifierErrorKind {
    /// Token is empty or does not follow any identifier form.
    #[display("Invalid identifier format: {:?}", _0)]
    InvalidFormat(String),
    /// A bare username was supplied without a discriminator or snowflake.
    #[display("Username {:?} needs a discriminator (username#discriminator) or a mention", _0)]
    AmbiguousOrMissingDiscriminator(String),
    /// Directory or snowflake lookup found nothing.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Numeric part of a mention is not a valid snowflake.
    #[display("Invalid snowflake: {:?}", _0)]
    InvalidSnowflake(String),
}

/// Identifier error with location tracking.
///
/// # Examples
///
/// ```
/// use herald_error::{IdentifierError, IdentifierErrorKind};
///
/// let err = IdentifierError::new(IdentifierErrorKind::NotFound("user alice#0".to_string()));
/// assert!(format!("{}", err).contains("Not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Identifier Error: {} at line {} in {}", kind, line, file)]
pub struct IdentifierError {
    /// The kind of error that occurred
    pub kind: IdentifierErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl IdentifierError {
    /// Create a new identifier error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: IdentifierErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &IdentifierErrorKind {
        &self.kind
    }
}

/// Result type for identifier operations.
pub type IdentifierResult<T> = Result<T, IdentifierError>;
