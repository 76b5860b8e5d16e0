//! Error taxonomy for scanning, dispatch and rendering

use thiserror::Error;

/// Errors surfaced by the atlas library.
///
/// Resolution errors (`UnknownComponentKind`, `UnknownExportFormat`) are
/// raised synchronously and never retried. A `ScanFailure` propagates out of
/// `AtlasManager::scan` but is converted into an inline error record by the
/// analysis engine.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("unknown component kind: {0}")]
    UnknownComponentKind(String),

    #[error("unknown export format: {0}")]
    UnknownExportFormat(String),

    #[error("failed to scan {kind}: {message}")]
    ScanFailure { kind: String, message: String },

    #[error("failed to render {format}: {message}")]
    RenderFailure { format: String, message: String },

    #[error("parser error: {0}")]
    Parser(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl AtlasError {
    pub fn scan(kind: impl Into<String>, message: impl ToString) -> Self {
        Self::ScanFailure {
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    pub fn render(format: impl Into<String>, message: impl ToString) -> Self {
        Self::RenderFailure {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

/// Library result alias
pub type Result<T> = std::result::Result<T, AtlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AtlasError::UnknownComponentKind("widgets".into());
        assert_eq!(err.to_string(), "unknown component kind: widgets");

        let err = AtlasError::scan("models", "boom");
        assert_eq!(err.to_string(), "failed to scan models: boom");

        let err = AtlasError::render("html", "template missing");
        assert_eq!(err.to_string(), "failed to render html: template missing");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AtlasError = io.into();
        assert!(matches!(err, AtlasError::Io(_)));
    }
}
