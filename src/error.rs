use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfSplitterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    #[error("Invalid strategy: {name}. Valid options: auto, bookmarks, toc, pages")]
    InvalidStrategy { name: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("Export failed: {reason}")]
    Export { reason: String },

    #[error("Split failed: {reason}")]
    SplitFailed { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl PdfSplitterError {
    /// Process exit code for this failure.
    ///
    /// 2 = source missing, 3 = unreadable PDF, 4 = split-specific failure, 1 = anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::InvalidPdf { .. } => 3,
            Self::InvalidStrategy { .. } | Self::OutputDirectory { .. } | Self::SplitFailed { .. } => 4,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfSplitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = PdfSplitterError::FileNotFound {
            path: "missing.pdf".to_string(),
        };
        assert_eq!(missing.exit_code(), 2);

        let invalid = PdfSplitterError::InvalidPdf {
            reason: "bad header".to_string(),
        };
        assert_eq!(invalid.exit_code(), 3);

        let strategy = PdfSplitterError::InvalidStrategy {
            name: "chapters".to_string(),
        };
        assert_eq!(strategy.exit_code(), 4);
        assert!(strategy.to_string().contains("chapters"));

        let export = PdfSplitterError::Export {
            reason: "disk full".to_string(),
        };
        assert_eq!(export.exit_code(), 1);
    }
}
