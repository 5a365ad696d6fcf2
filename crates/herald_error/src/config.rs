//! Configuration error types.
//!
//! Configuration errors are fatal at startup; there is no degraded mode.

/// Kinds of configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// Config file could not be read.
    #[display("Failed to read config file {}: {}", path, reason)]
    Read {
        /// Path that was read
        path: String,
        /// I/O failure
        reason: String,
    },
    /// Config text is not valid TOML for the expected shape.
    #[display("Failed to parse config: {}", _0)]
    Parse(String),
    /// No token in the file or the named environment variable.
    #[display("Discord token is required: set discord.token or {}", _0)]
    MissingToken(&'static str),
    /// A setting is present but unusable.
    #[display("Invalid {}: {}", setting, reason)]
    InvalidSetting {
        /// Dotted setting name
        setting: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Configuration error with location tracking.
///
/// # Examples
///
/// ```
/// use herald_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::MissingToken("DISCORD_TOKEN"));
/// assert!(format!("{}", err).contains("DISCORD_TOKEN"));
/// assert!(matches!(err.kind(), ConfigErrorKind::MissingToken(_)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The kind of error that occurred
    pub kind: ConfigErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new configuration error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}
