//! Error types for a map2struct generation run.
//!
//! Errors fall into two groups:
//!
//! - **Run-fatal**: the tool can no longer locate symbols at all
//!   (`UnresolvedModule`, I/O on the input, configuration problems).
//! - **Degradable**: failures local to one function or one field
//!   (`UnsupportedSignature`, `UnresolvedField`, a dependency's `Parse`
//!   error). These are turned into diagnostics and the run continues.
//!
//! # Example
//!
//! ```rust
//! use map2struct::errors::Error;
//!
//! let err = Error::unresolved_module("github.com/acme/missing", "no module metadata");
//! assert!(err.is_fatal());
//!
//! let err = err.in_function("MapToBook");
//! assert!(err.to_string().contains("MapToBook"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for map2struct operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An import path could not be mapped to a directory
    #[error("unresolved module {import_path}{}: {reason}", function_suffix(.function))]
    UnresolvedModule {
        import_path: String,
        function: Option<String>,
        reason: String,
    },

    /// A directory had no usable sources, or a file failed to parse
    #[error("parse error in {}{}: {message}", .path.display(), location_suffix(.line, .column))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// A candidate function has no qualifying map parameter or result
    #[error("unsupported signature for {function}: {reason}")]
    UnsupportedSignature { function: String, reason: String },

    /// A function's output struct could not be located
    #[error("output {output} of {function} not found: {reason}")]
    MissingOutput {
        function: String,
        output: String,
        reason: String,
    },

    /// A struct field could not be classified
    #[error("unresolved field {structure}.{field}: {reason}")]
    UnresolvedField {
        structure: String,
        field: String,
        reason: String,
    },

    /// Rendering or post-processing of generated text failed
    #[error("emit error in {function}: {message}")]
    Emit { function: String, message: String },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("I/O error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// Module metadata could not be decoded
    #[error("invalid module metadata: {0}")]
    Json(String),

    /// The `go` command needed for module metadata is not installed
    #[error("go toolchain not found: {0}")]
    Toolchain(String),
}

fn function_suffix(function: &Option<String>) -> String {
    function
        .as_ref()
        .map(|f| format!(" (needed by {f})"))
        .unwrap_or_default()
}

fn location_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(":{line}:{column}"),
        (Some(line), None) => format!(":{line}"),
        _ => String::new(),
    }
}

impl Error {
    /// Create an unresolved-module error
    pub fn unresolved_module(import_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvedModule {
            import_path: import_path.into(),
            function: None,
            reason: reason.into(),
        }
    }

    /// Create a parse error without a source position
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Create a parse error at a 1-indexed line and column
    pub fn parse_at(
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line: Some(line),
            column: Some(column),
            message: message.into(),
        }
    }

    pub fn unsupported_signature(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedSignature {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_output(
        function: impl Into<String>,
        output: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MissingOutput {
            function: function.into(),
            output: output.into(),
            reason: reason.into(),
        }
    }

    pub fn emit(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Emit {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error` and the path involved
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Attach the function whose resolution triggered this error.
    ///
    /// Only `UnresolvedModule` carries a function; other variants are
    /// returned unchanged. An already attached function is kept.
    pub fn in_function(self, name: &str) -> Self {
        match self {
            Self::UnresolvedModule {
                import_path,
                function: None,
                reason,
            } => Self::UnresolvedModule {
                import_path,
                function: Some(name.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedModule { .. }
                | Self::Config(_)
                | Self::Io { .. }
                | Self::Json(_)
                | Self::Toolchain(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
