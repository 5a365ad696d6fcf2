//! Error types for the Herald Discord adapter.
//!
//! This crate provides the error types shared by the identifier model, the
//! outbound dispatcher and the platform bindings.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use herald_error::{HeraldResult, IdentifierError, IdentifierErrorKind};
//!
//! fn lookup(token: &str) -> HeraldResult<u64> {
//!     Err(IdentifierError::new(IdentifierErrorKind::InvalidFormat(token.to_string())))?
//! }
//!
//! assert!(lookup("").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatch;
mod error;
mod identifier;
mod room;
mod transport;

pub use config::{ConfigError, ConfigErrorKind};
pub use dispatch::{DispatchError, DispatchErrorKind, DispatchResult};
pub use error::{HeraldError, HeraldErrorKind, HeraldResult};
pub use identifier::{IdentifierError, IdentifierErrorKind, IdentifierResult};
pub use room::{RoomError, RoomErrorKind, RoomResult};
pub use transport::{TransportError, TransportResult};
