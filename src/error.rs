//! Error types for claude-meta.
//!
//! Every fallible operation in the crate returns [`MetaError`]. Query parameter
//! validation has its own [`ValidationError`] so callers can inspect the
//! offending field before it is wrapped.

use std::path::PathBuf;

use thiserror::Error;

use crate::query::ExpressionError;

/// Primary error type for claude-meta operations.
#[derive(Error, Debug)]
pub enum MetaError {
    /// JSONL parsing failed.
    #[error("Failed to parse JSONL at line {line}: {message}")]
    ParseError {
        /// Line number where parsing failed.
        line: usize,
        /// Human-readable error message.
        message: String,
        /// Underlying serde_json error, if available.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Permission denied when accessing a file.
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path where access was denied.
        path: PathBuf,
    },

    /// Transcript file rejected before parsing.
    #[error("Invalid session file: {path}: {reason}")]
    InvalidSessionFile {
        /// Path to the rejected file.
        path: PathBuf,
        /// Reason why the file was rejected.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// Unified query parameters failed validation.
    #[error("invalid query parameters: {0}")]
    InvalidQuery(#[from] ValidationError),

    /// A filter expression failed to parse or evaluate.
    #[error("invalid filter expression: {0}")]
    InvalidExpression(#[from] ExpressionError),

    /// Resource name outside entries/messages/tools.
    #[error("unknown resource type: {name}")]
    UnknownResource {
        /// The rejected resource name.
        name: String,
    },

    /// Invalid argument.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Name of the invalid argument.
        name: String,
        /// Reason why the argument is invalid.
        reason: String,
    },

    /// A required parameter was empty.
    #[error("{name} required: missing parameter")]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A regex pattern failed to compile.
    #[error("invalid regex pattern '{pattern}'")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },

    /// A timestamp could not be parsed where one is required.
    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// The unparsable timestamp.
        value: String,
    },

    /// Unsupported operation or feature.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },
}

impl MetaError {
    /// Create a new parse error.
    #[must_use]
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with source.
    #[must_use]
    pub fn parse_with_source(line: usize, message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a new unsupported error.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ParseError { .. } | Self::InvalidSessionFile { .. } => exit_codes::EXIT_PARSE_ERROR,
            Self::FileNotFound { .. } => exit_codes::EXIT_FILE_NOT_FOUND,
            Self::PermissionDenied { .. } => exit_codes::EXIT_PERMISSION_DENIED,
            Self::InvalidConfig { .. } => exit_codes::EXIT_CONFIG_ERROR,
            Self::InvalidQuery(_)
            | Self::InvalidExpression(_)
            | Self::UnknownResource { .. }
            | Self::InvalidArgument { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidPattern { .. } => exit_codes::EXIT_USAGE_ERROR,
            Self::InvalidTimestamp { .. } | Self::SerializationError { .. } => exit_codes::EXIT_DATA_ERROR,
            Self::IoError { .. } => exit_codes::EXIT_IO_ERROR,
            Self::Unsupported { .. } => exit_codes::EXIT_GENERAL_ERROR,
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors concern a single line or value; the rest of the
    /// transcript can still be analyzed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::ParseError { .. } | Self::InvalidTimestamp { .. })
    }
}

/// Result type alias for claude-meta operations.
pub type Result<T> = std::result::Result<T, MetaError>;

impl From<std::io::Error> for MetaError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// A query parameter outside its allowed set of values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted name of the offending field (e.g. `aggregate.function`).
    pub field: String,
    /// The rejected value.
    pub value: String,
    /// Accepted values, in documentation order.
    pub valid_values: Vec<String>,
}

impl ValidationError {
    /// Create a validation error from a static list of accepted values.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>, valid_values: &[&str]) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            valid_values: valid_values.iter().map(|v| (*v).to_string()).collect(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: \"{}\"", self.field, self.value)?;
        if !self.valid_values.is_empty() {
            write!(f, ", valid values: {}", self.valid_values.join(", "))?;
        }
        Ok(())
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// JSONL parsing failed.
    pub const EXIT_PARSE_ERROR: i32 = 2;
    /// Specified file not found.
    pub const EXIT_FILE_NOT_FOUND: i32 = 3;
    /// Insufficient permissions.
    pub const EXIT_PERMISSION_DENIED: i32 = 4;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Invalid command-line usage or query parameters (BSD standard).
    pub const EXIT_USAGE_ERROR: i32 = 64;
    /// Input data format error (BSD standard).
    pub const EXIT_DATA_ERROR: i32 = 65;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}
