//! Error types shared across LiveView crates.

use std::path::PathBuf;

/// Top-level error type for LiveView operations.
#[derive(Debug, thiserror::Error)]
pub enum LiveviewError {
    #[error("Scan error in {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using LiveviewError.
pub type LiveviewResult<T> = Result<T, LiveviewError>;

impl LiveviewError {
    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_names_the_file() {
        let err = LiveviewError::scan(
            "scenes/intro.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("scenes/intro.py"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> LiveviewResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(LiveviewError::Io(_))));
    }
}
