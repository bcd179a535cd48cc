//! Error types shared by every clipgif crate.
//!
//! Each variant maps to one failure class of a conversion. Validation and
//! tool failures are recoverable (the user can fix a field or retry), while
//! missing tools and filesystem problems end the current invocation.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::Field;

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, running or checking a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A conversion parameter is out of range or malformed.
    #[error("invalid {field}: {message}")]
    Validation { field: Field, message: String },

    /// A required external executable could not be located.
    #[error("{tool} not found; install it or configure its path")]
    ToolNotFound { tool: String },

    /// An external tool exited unsuccessfully.
    #[error("{tool} failed ({}): {}", ExitCode(*exit_code), stderr.trim())]
    ExternalTool {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The filesystem could not be read or written at `path`.
    #[error("resource error at {}: {message}", path.display())]
    Resource { path: PathBuf, message: String },

    /// An external tool ran longer than allowed and was killed.
    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },

    /// The conversion was cancelled by the caller.
    #[error("conversion cancelled")]
    Cancelled,

    /// Tool output could not be interpreted.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

struct ExitCode(Option<i32>);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

impl Error {
    /// Create a validation error for `field`.
    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an external tool failure.
    pub fn external_tool(
        tool: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create a resource error for `path`.
    pub fn resource(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Resource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// The offending field, for validation errors.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Whether the user can reasonably retry after adjusting input.
    ///
    /// Missing tools and filesystem failures are fatal for the invocation;
    /// everything else can be retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation { .. }
            | Self::ExternalTool { .. }
            | Self::Timeout { .. }
            | Self::Cancelled => true,
            Self::ToolNotFound { .. } | Self::Resource { .. } | Self::Io(_) => false,
            Self::Parse { .. } => true,
        }
    }
}
