//! Splitting strategies.
//!
//! Every splitter attempts its sections independently: a failed export is
//! recorded on the [`SplitResult`] and the loop moves on. Only setup
//! failures and progress hook errors abort a split.

pub mod bookmark;
pub mod page;
pub mod smart;
pub mod toc;

pub use bookmark::BookmarkSplitter;
pub use page::PageSplitter;
pub use smart::SmartSplitter;
pub use toc::TocSplitter;

use crate::error::Result;
use crate::services::{DocumentSource, FileNamer};
use crate::types::{
    DocumentAnalysis, ProgressUpdate, SplitFileInfo, SplitOptions, SplitResult, Strategy,
};
use std::path::PathBuf;
use tracing::{debug, info};

/// Called after each completed unit of work. Returning `Err` aborts the split.
pub type ProgressHook<'a> = Box<dyn FnMut(&ProgressUpdate) -> Result<()> + 'a>;

pub trait Splitter {
    fn strategy_name(&self) -> &'static str;

    fn can_handle(&self, analysis: &DocumentAnalysis) -> bool;

    /// Heuristic in `[0.0, 1.0]`; only meaningful for ranking splitters.
    fn confidence_score(&self, analysis: &DocumentAnalysis) -> f64;

    fn split(&self, job: &mut SplitJob<'_>) -> Result<SplitResult>;
}

/// Everything one split run reads from, plus the optional progress hook.
pub struct SplitJob<'a> {
    pub source: &'a dyn DocumentSource,
    pub analysis: &'a DocumentAnalysis,
    pub options: &'a SplitOptions,
    progress: Option<ProgressHook<'a>>,
}

impl<'a> SplitJob<'a> {
    pub fn new(
        source: &'a dyn DocumentSource,
        analysis: &'a DocumentAnalysis,
        options: &'a SplitOptions,
    ) -> Self {
        Self {
            source,
            analysis,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, hook: impl FnMut(&ProgressUpdate) -> Result<()> + 'a) -> Self {
        self.progress = Some(Box::new(hook));
        self
    }

    pub fn report_progress(
        &mut self,
        message: impl Into<String>,
        current: usize,
        total: usize,
    ) -> Result<()> {
        match self.progress.as_mut() {
            Some(hook) => hook(&ProgressUpdate::new(message, Some(current), Some(total))),
            None => Ok(()),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.source.page_count()
    }

    pub fn create_result(&self, strategy_name: &str) -> SplitResult {
        SplitResult::new(self.source.source_path(), strategy_name, self.total_pages())
    }

    /// Creates the output directory; failure here aborts the whole split.
    pub fn file_namer(&self) -> Result<FileNamer> {
        FileNamer::new(self.source.source_path(), &self.options.output_dir)
    }

    /// Writes pages `start..=end` to `output` and records the file on `result`.
    pub fn export_segment(
        &self,
        start_page: usize,
        end_page: usize,
        output: PathBuf,
        section_title: Option<String>,
        result: &mut SplitResult,
    ) -> Result<()> {
        let pages: Vec<usize> = (start_page..=end_page).collect();
        self.source
            .export_pages(&pages, &output, self.options.preserve_metadata)?;
        debug!("Wrote pages {}-{} to {}", start_page, end_page, output.display());
        result.add_split_file(SplitFileInfo::new(output, start_page, end_page, section_title));
        Ok(())
    }
}

/// Slices `start..=end` into consecutive windows of at most `max_pages`.
pub fn calculate_page_ranges(start: usize, end: usize, max_pages: usize) -> Vec<(usize, usize)> {
    let max_pages = max_pages.max(1);
    let mut ranges = Vec::new();
    let mut current = start;
    while current <= end {
        let segment_end = (current + max_pages - 1).min(end);
        ranges.push((current, segment_end));
        current = segment_end + 1;
    }
    ranges
}

/// Coverage of the first..last span of `pages` over the document, plus a density term.
pub(crate) fn coverage_and_density(pages: &[usize], total_pages: usize) -> (f64, f64) {
    let (Some(&first), Some(&last)) = (pages.first(), pages.last()) else {
        return (0.0, 0.0);
    };
    let coverage = (last as f64 - first as f64 + 1.0) / total_pages.max(1) as f64;
    let density = (pages.len() as f64 / 10.0).min(1.0);
    (coverage, density)
}

/// The splitter for a requested strategy; `Auto` picks at split time.
pub fn splitter_for(strategy: Strategy, options: &SplitOptions) -> Box<dyn Splitter> {
    match strategy {
        Strategy::Auto => Box::new(SmartSplitter::new(options)),
        Strategy::Bookmarks => Box::new(BookmarkSplitter::new()),
        Strategy::Toc => Box::new(TocSplitter::new(options.page_limit())),
        Strategy::Pages => Box::new(PageSplitter::new(options)),
    }
}

/// Runs the requested strategy over an analyzed document.
pub fn split_document(job: &mut SplitJob<'_>) -> Result<SplitResult> {
    let splitter = splitter_for(job.options.strategy, job.options);
    info!(
        "Splitting {} with strategy {}",
        job.source.source_path(),
        splitter.strategy_name()
    );
    let result = splitter.split(job)?;
    info!("{}", result.summary());
    Ok(result)
}
