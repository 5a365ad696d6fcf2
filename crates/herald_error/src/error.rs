//! Top-level error wrapper types.

use crate::{ConfigError, DispatchError, IdentifierError, RoomError, TransportError};

/// Every error the adapter can surface to a caller.
///
/// # Examples
///
/// ```
/// use herald_error::{ConfigError, ConfigErrorKind, HeraldError};
///
/// let err: HeraldError = ConfigError::new(ConfigErrorKind::Parse("bad".to_string())).into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum HeraldErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Identifier parse or lookup error
    #[from(IdentifierError)]
    Identifier(IdentifierError),
    /// Outbound dispatch error
    #[from(DispatchError)]
    Dispatch(DispatchError),
    /// Room lifecycle error
    #[from(RoomError)]
    Room(RoomError),
    /// Platform transport error
    #[from(TransportError)]
    Transport(TransportError),
}

/// Herald error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Herald Error: {}", _0)]
pub struct HeraldError(Box<HeraldErrorKind>);

impl HeraldError {
    /// Create a new error from a kind.
    pub fn new(kind: HeraldErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &HeraldErrorKind {
        &self.0
    }
}

impl<T> From<T> for HeraldError
where
    T: Into<HeraldErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Herald operations.
pub type HeraldResult<T> = Result<T, HeraldError>;
