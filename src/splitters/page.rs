use super::{calculate_page_ranges, SplitJob, Splitter};
use crate::error::Result;
use crate::types::{DocumentAnalysis, SplitOptions, SplitResult};
use tracing::warn;

/// Roughly 300 words per page at about 1.3 tokens per word.
const TOKENS_PER_PAGE: usize = 400;
const DEFAULT_PAGES_PER_SPLIT: usize = 50;

/// Fixed-size page windows. Always applicable, never preferred.
#[derive(Debug)]
pub struct PageSplitter {
    max_pages: usize,
}

impl PageSplitter {
    pub fn new(options: &SplitOptions) -> Self {
        Self {
            max_pages: Self::determine_max_pages(options),
        }
    }

    /// Explicit page limit, then a token-derived estimate, then the default.
    pub fn determine_max_pages(options: &SplitOptions) -> usize {
        if let Some(pages) = options.page_limit() {
            return pages;
        }
        if let Some(tokens) = options.token_limit() {
            return tokens.div_ceil(TOKENS_PER_PAGE).max(1);
        }
        DEFAULT_PAGES_PER_SPLIT
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

impl Splitter for PageSplitter {
    fn strategy_name(&self) -> &'static str {
        "page"
    }

    fn can_handle(&self, _analysis: &DocumentAnalysis) -> bool {
        true
    }

    fn confidence_score(&self, analysis: &DocumentAnalysis) -> f64 {
        if analysis.has_bookmarks() || analysis.has_toc() || analysis.has_content_patterns() {
            0.3
        } else {
            0.4
        }
    }

    fn split(&self, job: &mut SplitJob<'_>) -> Result<SplitResult> {
        let mut result = job.create_result(self.strategy_name());
        let namer = job.file_namer()?;
        let ranges = calculate_page_ranges(1, job.total_pages(), self.max_pages);

        job.report_progress("Starting page-based splitting", 0, ranges.len())?;

        for (index, &(start_page, end_page)) in ranges.iter().enumerate() {
            let output = namer.full_path(&namer.page_range_name(start_page, end_page));
            let title = format!("Pages {}-{}", start_page, end_page);
            match job.export_segment(start_page, end_page, output, Some(title), &mut result) {
                Ok(()) => job.report_progress(
                    format!("Processed pages {}-{}", start_page, end_page),
                    index + 1,
                    ranges.len(),
                )?,
                Err(e) => {
                    warn!("Pages {}-{} failed: {}", start_page, end_page, e);
                    result.add_error(format!(
                        "Failed to split pages {}-{}: {}",
                        start_page, end_page, e
                    ));
                }
            }
        }

        result.insert_metadata("max_pages_per_split", self.max_pages);
        result.insert_metadata("total_splits", ranges.len());
        result.insert_metadata("strategy_confidence", self.confidence_score(job.analysis));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfSplitterError;
    use crate::services::DocumentSource;
    use crate::test_support::FakeDocument;
    use crate::types::{AnalysisBuilder, TocEntry};

    #[test]
    fn test_output_directory_on_a_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let source = FakeDocument::new(30);
        let analysis = AnalysisBuilder::new(source.metadata()).build();
        let options = SplitOptions {
            max_pages: Some(10),
            output_dir: blocker,
            ..SplitOptions::default()
        };

        let mut job = SplitJob::new(&source, &analysis, &options);
        let outcome = PageSplitter::new(&options).split(&mut job);

        assert!(matches!(outcome, Err(PdfSplitterError::OutputDirectory { .. })));
        assert!(source.exported_ranges().is_empty());
    }

    #[test]
    fn test_page_limit_resolution() {
        let mut options = SplitOptions::default();
        assert_eq!(PageSplitter::determine_max_pages(&options), 50);

        options.max_tokens = Some(1000);
        assert_eq!(PageSplitter::determine_max_pages(&options), 3);
        // The general estimate uses a different ratio.
        assert_eq!(options.effective_page_limit(), 4);

        options.max_pages = Some(20);
        assert_eq!(PageSplitter::determine_max_pages(&options), 20);
    }

    #[test]
    fn test_confidence_depends_on_other_structure() {
        let splitter = PageSplitter::new(&SplitOptions::default());
        let plain = AnalysisBuilder::new(FakeDocument::new(5).metadata()).build();
        assert_eq!(splitter.confidence_score(&plain), 0.4);

        let mut builder = AnalysisBuilder::new(FakeDocument::new(5).metadata());
        builder.add_toc_entry(TocEntry::new("Preface", 2, 1));
        assert_eq!(splitter.confidence_score(&builder.build()), 0.3);
    }

    #[test]
    fn test_split_105_pages_in_fifties() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeDocument::new(105);
        let analysis = AnalysisBuilder::new(source.metadata()).build();
        let options = SplitOptions {
            max_pages: Some(50),
            output_dir: dir.path().to_path_buf(),
            ..SplitOptions::default()
        };

        let mut updates = Vec::new();
        let mut job = SplitJob::new(&source, &analysis, &options).with_progress(|update| {
            updates.push(update.clone());
            Ok(())
        });
        let result = PageSplitter::new(&options).split(&mut job).unwrap();
        drop(job);

        assert!(result.is_success());
        assert_eq!(source.exported_ranges(), vec![(1, 50), (51, 100), (101, 105)]);
        let names: Vec<_> = result
            .output_files()
            .iter()
            .map(|f| f.filename.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "sample_pages_001-050.pdf",
                "sample_pages_051-100.pdf",
                "sample_pages_101-105.pdf"
            ]
        );
        assert_eq!(result.output_files()[2].pages, 5);
        assert_eq!(result.metadata()["total_splits"], 3);

        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].message, "Starting page-based splitting");
        assert_eq!(updates[3].percentage, Some(100.0));
        assert!(dir.path().join("sample_pages_101-105.pdf").exists());
    }
}
