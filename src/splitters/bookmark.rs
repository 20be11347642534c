use super::{coverage_and_density, SplitJob, Splitter};
use crate::error::Result;
use crate::types::{Bookmark, DocumentAnalysis, SplitResult};
use tracing::{debug, warn};

const BASE_SCORE: f64 = 0.7;
const COVERAGE_WEIGHT: f64 = 0.2;
const DENSITY_WEIGHT: f64 = 0.1;

/// One output file per top-level bookmark.
#[derive(Debug, Default)]
pub struct BookmarkSplitter;

impl BookmarkSplitter {
    pub fn new() -> Self {
        Self
    }

    fn top_level(analysis: &DocumentAnalysis) -> Vec<&Bookmark> {
        analysis.bookmarks().iter().filter(|b| b.level == 1).collect()
    }

    /// Page before the next top-level bookmark, else the last page.
    fn determine_end_page(top_level: &[&Bookmark], index: usize, total_pages: usize) -> usize {
        top_level
            .get(index + 1)
            .map(|next| next.page.saturating_sub(1))
            .unwrap_or(total_pages)
            .min(total_pages)
    }
}

impl Splitter for BookmarkSplitter {
    fn strategy_name(&self) -> &'static str {
        "bookmark"
    }

    fn can_handle(&self, analysis: &DocumentAnalysis) -> bool {
        Self::top_level(analysis).len() >= 2
    }

    fn confidence_score(&self, analysis: &DocumentAnalysis) -> f64 {
        if !self.can_handle(analysis) {
            return 0.0;
        }
        let pages: Vec<usize> = Self::top_level(analysis).iter().map(|b| b.page).collect();
        let (coverage, density) = coverage_and_density(&pages, analysis.total_pages());
        (BASE_SCORE + coverage * COVERAGE_WEIGHT + density * DENSITY_WEIGHT).clamp(0.0, 1.0)
    }

    fn split(&self, job: &mut SplitJob<'_>) -> Result<SplitResult> {
        let mut result = job.create_result(self.strategy_name());
        if !self.can_handle(job.analysis) {
            result.add_error("Document does not have reliable bookmark structure");
            return Ok(result);
        }

        let namer = job.file_namer()?;
        let analysis = job.analysis;
        let top_level = Self::top_level(analysis);
        let total_pages = job.total_pages();
        debug!("Found {} top-level bookmarks", top_level.len());

        job.report_progress("Starting bookmark-based splitting", 0, top_level.len())?;

        for (index, bookmark) in top_level.iter().enumerate() {
            let start_page = bookmark.page;
            let end_page = Self::determine_end_page(&top_level, index, total_pages);
            if start_page > end_page {
                debug!("Skipping empty section '{}'", bookmark.title);
                job.report_progress(
                    format!("Skipped empty section: {}", bookmark.title),
                    index + 1,
                    top_level.len(),
                )?;
                continue;
            }

            let output = namer.full_path(&namer.chapter_name(index + 1, Some(&bookmark.title)));
            match job.export_segment(
                start_page,
                end_page,
                output,
                Some(bookmark.title.clone()),
                &mut result,
            ) {
                Ok(()) => job.report_progress(
                    format!("Processed section: {}", bookmark.title),
                    index + 1,
                    top_level.len(),
                )?,
                Err(e) => {
                    warn!("Section '{}' failed: {}", bookmark.title, e);
                    result.add_error(format!(
                        "Failed to split section '{}': {}",
                        bookmark.title, e
                    ));
                }
            }
        }

        result.insert_metadata("bookmarks_processed", top_level.len());
        result.insert_metadata("strategy_confidence", self.confidence_score(analysis));
        Ok(result)
    }
}
