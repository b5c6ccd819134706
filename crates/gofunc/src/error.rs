//! Error types for gofunc operations.
//!
//! Errors fall into two tiers:
//!
//! - **`Error`**: fatal conditions that abort the whole extraction (no
//!   manifest, unparsable manifest, a target source file that fails to parse,
//!   an unknown module cache root).
//! - **`ScanError`**: file-level problems met while scanning dependency
//!   directories. These are logged and the file is skipped; they never
//!   surface as an `Err` from the public API.
//!
//! ## Error Philosophy
//!
//! A missing dependency declaration degrades the output (raw type text instead
//! of a full declaration) rather than failing it. Only conditions under which
//! no partial result is meaningful cause early termination.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for gofunc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for gofunc operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree-sitter parsing infrastructure failed
    #[error("parser error: {0}")]
    Parser(String),

    /// A source file on the target search path could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// No go.mod was found in the start directory or any of its ancestors
    #[error("go.mod not found in {} or any parent directory", start.display())]
    ManifestNotFound {
        /// Directory the upward search started from
        start: PathBuf,
    },

    /// go.mod exists but is malformed
    #[error("{}:{line}: {message}", path.display())]
    Manifest {
        /// Path of the manifest
        path: PathBuf,
        /// 1-indexed line of the offending directive (0 when not line specific)
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The module cache root could not be determined
    #[error("module cache unavailable: {0}")]
    ModuleCache(String),

    /// The requested function does not exist under the search directory
    #[error("function `{name}` not found in {}", dir.display())]
    FunctionNotFound {
        /// Function name as requested (`Name` or `Receiver.Method`)
        name: String,
        /// Directory that was searched
        dir: PathBuf,
    },

    /// Template parsing or rendering failed
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),
}

/// A file-level problem met while scanning a directory for declarations.
#[derive(Debug, Clone)]
pub struct ScanError {
    /// Path to the file (or directory) that failed
    pub path: PathBuf,
    /// Category of the error
    pub kind: ScanErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for ScanError {}

/// Categorization of scan errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Source file has syntax errors
    ParseFailed,

    /// File content is not valid UTF-8
    EncodingError,

    /// Could not read the file or directory entry
    IoError,
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed => write!(f, "parse failed"),
            Self::EncodingError => write!(f, "encoding error"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl ScanError {
    /// Create a new scan error.
    #[must_use]
    pub fn new(path: PathBuf, kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create a parse error for a file.
    #[must_use]
    pub fn parse_failed(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(path, ScanErrorKind::ParseFailed, message)
    }

    /// Create an encoding error for a file.
    #[must_use]
    pub fn encoding_error(path: PathBuf) -> Self {
        Self::new(path, ScanErrorKind::EncodingError, "file is not valid UTF-8")
    }

    /// Create an I/O error for a file.
    #[must_use]
    pub fn io_error(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, ScanErrorKind::IoError, error.to_string())
    }
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        match err.kind {
            ScanErrorKind::IoError => Error::Io(std::io::Error::other(err.to_string())),
            ScanErrorKind::ParseFailed | ScanErrorKind::EncodingError => Error::Parse {
                path: err.path,
                message: err.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_display_includes_path_and_kind() {
        let error = ScanError::parse_failed(PathBuf::from("pkg/bar.go"), "unexpected token");

        let display = error.to_string();
        assert!(display.contains("pkg/bar.go"));
        assert!(display.contains("unexpected token"));
        assert!(display.contains("parse failed"));
    }

    #[test]
    fn parse_scan_error_becomes_fatal_parse_error() {
        let error: Error = ScanError::encoding_error(PathBuf::from("x.go")).into();

        assert!(matches!(error, Error::Parse { ref path, .. } if path == &PathBuf::from("x.go")));
    }

    #[test]
    fn manifest_error_display_has_line() {
        let error = Error::Manifest {
            path: PathBuf::from("/work/go.mod"),
            line: 4,
            message: "unknown directive: requires".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "/work/go.mod:4: unknown directive: requires"
        );
    }
}
