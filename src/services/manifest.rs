use crate::error::{PdfSplitterError, Result};
use crate::services::namer::FileNamer;
use crate::types::SplitResult;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `{base}_manifest.json` describing a finished split next to its outputs.
pub fn write_manifest(result: &SplitResult, output_dir: &Path) -> Result<PathBuf> {
    let namer = FileNamer::new(result.source_file(), output_dir)?;
    let manifest_path = namer.full_path(&namer.manifest_name());

    let files: Vec<_> = result
        .output_files()
        .iter()
        .enumerate()
        .map(|(idx, file)| {
            json!({
                "split_number": idx + 1,
                "filename": file.filename.file_name().and_then(|n| n.to_str()),
                "path": file.filename,
                "page_range": file.page_range,
                "pages": file.pages,
                "section_title": file.section_title,
                "file_size": file.file_size,
            })
        })
        .collect();

    let manifest = json!({
        "source": result.source_file(),
        "strategy": result.strategy_used(),
        "total_pages": result.total_pages(),
        "total_splits": result.split_count(),
        "created_at": chrono::Utc::now().to_rfc3339(),
        "files": files,
        "errors": result.errors(),
    });

    let json_content = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(&manifest_path, json_content).map_err(|e| PdfSplitterError::OutputDirectory {
        reason: format!("Failed to write manifest {}: {}", manifest_path.display(), e),
    })?;

    info!("Generated manifest file: {}", manifest_path.display());
    Ok(manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_errors_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let mut result = SplitResult::new("/in/guide.pdf", "toc", 40);
        result.add_error("Failed to split section 'Appendix': disk full");

        let path = write_manifest(&result, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("guide_manifest.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["strategy"], "toc");
        assert_eq!(written["total_pages"], 40);
        assert_eq!(written["total_splits"], 0);
        assert_eq!(written["errors"].as_array().map(Vec::len), Some(1));
        assert!(written["created_at"].as_str().is_some());
    }
}
