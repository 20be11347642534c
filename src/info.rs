use crate::services::DocumentSource;
use chrono::NaiveDate;
use serde::Serialize;

const UNKNOWN: &str = "Unknown";

/// Basic facts about a document, as shown by the `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub file: String,
    pub pages: usize,
    pub title: String,
    pub author: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
    pub pdf_version: String,
    pub file_size: u64,
    pub has_bookmarks: bool,
}

impl DocumentInfo {
    pub fn from_source(source: &dyn DocumentSource) -> Self {
        let metadata = source.metadata();
        Self {
            file: source.source_path().to_string(),
            pages: metadata.pages,
            title: metadata.title,
            author: metadata.author,
            creator: metadata.creator,
            producer: metadata.producer,
            creation_date: format_pdf_date(metadata.creation_date.as_deref()),
            modification_date: format_pdf_date(metadata.modification_date.as_deref()),
            pdf_version: metadata.pdf_version,
            file_size: metadata.file_size,
            has_bookmarks: source.has_outline(),
        }
    }

    pub fn display_text(&self) -> String {
        [
            "PDF Information:".to_string(),
            format!("  File: {}", self.file),
            format!("  Pages: {}", self.pages),
            format!("  Title: {}", self.title),
            format!("  Author: {}", self.author),
            format!("  Creator: {}", self.creator),
            format!("  Producer: {}", self.producer),
            format!("  Created: {}", self.creation_date),
            format!("  Modified: {}", self.modification_date),
            format!("  PDF Version: {}", self.pdf_version),
            format!("  File Size: {}", format_file_size(self.file_size)),
            format!("  Has Bookmarks: {}", if self.has_bookmarks { "Yes" } else { "No" }),
        ]
        .join("\n")
    }
}

/// Renders a PDF date (`D:YYYYMMDD...`) as `YYYY-MM-DD`; other strings pass through.
pub fn format_pdf_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return UNKNOWN.to_string();
    };

    raw.strip_prefix("D:")
        .and_then(|rest| rest.get(..8))
        .and_then(|digits| NaiveDate::parse_from_str(digits, "%Y%m%d").ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{} {}", (size * 100.0).round() / 100.0, UNITS[unit])
}
