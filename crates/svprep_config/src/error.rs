//! Error types for option loading and validation.

/// Errors that can occur when loading or validating lowering options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the options file.
    #[error("failed to read options: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse options: {0}")]
    ParseError(String),

    /// An option string named an option that does not exist.
    #[error("unknown lowering option '{0}'")]
    UnknownOption(String),

    /// An option was given a value it cannot take.
    #[error("invalid value '{value}' for lowering option '{key}'")]
    InvalidValue {
        /// The option name.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
