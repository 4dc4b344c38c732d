//! Typed error handling for unused-members.
//!
//! Provides structured errors that library consumers can match on,
//! with context about what went wrong and where.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scan operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Parser setup failure or unreadable source text
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Manifest or configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// `ignoreFileRegex` did not compile
    #[error("Invalid ignore regex `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Include/exclude/path glob did not compile
    #[error("Invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Fix operation errors
    #[error("Fix error at {path}: {message}")]
    Fix { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-regex error.
    pub fn invalid_regex(pattern: impl Into<String>, err: &regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: err.to_string(),
        }
    }

    /// Create an invalid-glob error.
    pub fn invalid_pattern(pattern: impl Into<String>, err: &globset::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: err.to_string(),
        }
    }

    /// Create a fix error.
    pub fn fix(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Fix {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (the scan can go on without the file).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Fix { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::Fix { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for scan results.
pub type ScanResult<T> = Result<T, ScanError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> ScanResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> ScanResult<T> {
        self.map_err(|e| ScanError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = ScanError::io(
            PathBuf::from("/project/tsconfig.json"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, ScanError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/project/tsconfig.json")));
        assert!(err.to_string().contains("/project/tsconfig.json"));
    }

    #[test]
    fn test_invalid_regex_message() {
        let bad = regex::Regex::new("(unclosed").unwrap_err();
        let err = ScanError::invalid_regex("(unclosed", &bad);
        assert!(err.to_string().contains("(unclosed"));
        assert!(err.path().is_none());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ScanError::parse("/a.ts", "bad tree").is_recoverable());
        assert!(ScanError::fix("/a.ts", "overlap").is_recoverable());
        assert!(!ScanError::config("/tsconfig.json", "missing").is_recoverable());
        assert!(!ScanError::invalid_argument("shard 0").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let scan_result = result.with_path("/missing/file.ts");
        assert!(matches!(scan_result, Err(ScanError::Io { .. })));
    }
}
