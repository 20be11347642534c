use crate::error::{PdfSplitterError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

static NON_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNDERSCORE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

const MAX_TITLE_LEN: usize = 50;

/// Derives output filenames for split segments.
///
/// Creating a namer creates its output directory.
#[derive(Debug, Clone)]
pub struct FileNamer {
    base_name: String,
    output_dir: PathBuf,
}

impl FileNamer {
    pub fn new(source_file: &str, output_dir: &Path) -> Result<Self> {
        Self::ensure_output_directory(output_dir)?;

        let base_name = Path::new(source_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(Self {
            base_name,
            output_dir: output_dir.to_path_buf(),
        })
    }

    fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).map_err(|e| {
                PdfSplitterError::OutputDirectory {
                    reason: format!(
                        "Failed to create output directory {}: {}",
                        output_dir.display(),
                        e
                    ),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        } else if !output_dir.is_dir() {
            return Err(PdfSplitterError::OutputDirectory {
                reason: format!("{} is not a directory", output_dir.display()),
            });
        }
        Ok(())
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn chapter_name(&self, chapter_number: usize, chapter_title: Option<&str>) -> String {
        match chapter_title {
            Some(title) => format!(
                "{}_ch{:02}_{}.pdf",
                self.base_name,
                chapter_number,
                sanitize_filename(title)
            ),
            None => format!("{}_chapter_{:02}.pdf", self.base_name, chapter_number),
        }
    }

    pub fn page_range_name(&self, start_page: usize, end_page: usize) -> String {
        format!("{}_pages_{:03}-{:03}.pdf", self.base_name, start_page, end_page)
    }

    pub fn manifest_name(&self) -> String {
        format!("{}_manifest.json", self.base_name)
    }

    pub fn full_path(&self, filename: &str) -> PathBuf {
        self.output_dir.join(filename)
    }
}

/// Lowercased, underscore-separated, at most 50 characters.
pub fn sanitize_filename(title: &str) -> String {
    let stripped = NON_FILENAME_CHARS.replace_all(title, "");
    let underscored = WHITESPACE_RUN.replace_all(&stripped, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&underscored, "_");
    collapsed
        .trim_matches('_')
        .chars()
        .take(MAX_TITLE_LEN)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Chapter 1: Introduction"), "chapter_1_introduction");
        assert_eq!(sanitize_filename("  Q&A -- Part (2)  "), "qa_--_part_2");
        assert_eq!(sanitize_filename("Large Chapter (Part 3)"), "large_chapter_part_3");

        let long = "word ".repeat(30);
        assert_eq!(sanitize_filename(&long).chars().count(), 50);
    }

    #[test]
    fn test_names() {
        let dir = tempfile::tempdir().unwrap();
        let namer = FileNamer::new("/books/annual report.pdf", dir.path()).unwrap();

        assert_eq!(namer.base_name(), "annual report");
        assert_eq!(
            namer.chapter_name(3, Some("Front Matter")),
            "annual report_ch03_front_matter.pdf"
        );
        assert_eq!(namer.chapter_name(12, None), "annual report_chapter_12.pdf");
        assert_eq!(
            namer.page_range_name(1, 50),
            "annual report_pages_001-050.pdf"
        );
        assert_eq!(
            namer.full_path("x.pdf"),
            dir.path().join("x.pdf")
        );
    }

    #[test]
    fn test_creates_nested_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        FileNamer::new("book.pdf", &nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_output_path_that_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();

        let err = FileNamer::new("book.pdf", &file).unwrap_err();
        assert!(matches!(err, PdfSplitterError::OutputDirectory { .. }));
    }
}
