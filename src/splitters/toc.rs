use super::{calculate_page_ranges, coverage_and_density, SplitJob, Splitter};
use crate::error::Result;
use crate::services::FileNamer;
use crate::types::{DocumentAnalysis, SplitResult, TocEntry};
use tracing::{debug, warn};

/// Longest section written as one file when no page limit is given.
pub const DEFAULT_MAX_PAGES: usize = 100;

const BASE_SCORE: f64 = 0.8;
const COVERAGE_WEIGHT: f64 = 0.15;
const DENSITY_WEIGHT: f64 = 0.05;
const FRONT_MATTER: &str = "Front Matter";

/// One output file per chapter-level TOC entry, slicing oversized chapters.
#[derive(Debug)]
pub struct TocSplitter {
    max_pages: usize,
}

impl Default for TocSplitter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TocSplitter {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self {
            max_pages: max_pages.filter(|&pages| pages > 0).unwrap_or(DEFAULT_MAX_PAGES),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn segment_exceeds_max_pages(&self, start_page: usize, end_page: usize) -> bool {
        end_page >= start_page && end_page - start_page + 1 > self.max_pages
    }

    fn chapters(analysis: &DocumentAnalysis) -> Vec<&TocEntry> {
        analysis.toc_entries().iter().filter(|e| e.level == 1).collect()
    }

    /// Titled segments for one section; oversized sections get " (Part N)" titles.
    /// A reversed range plans nothing.
    pub fn plan_section(&self, title: &str, start_page: usize, end_page: usize) -> Vec<(usize, usize, String)> {
        if start_page > end_page {
            return Vec::new();
        }
        if !self.segment_exceeds_max_pages(start_page, end_page) {
            return vec![(start_page, end_page, title.to_string())];
        }
        calculate_page_ranges(start_page, end_page, self.max_pages)
            .into_iter()
            .enumerate()
            .map(|(idx, (start, end))| (start, end, format!("{} (Part {})", title, idx + 1)))
            .collect()
    }

    fn split_section(
        &self,
        job: &SplitJob<'_>,
        namer: &FileNamer,
        section_number: usize,
        title: &str,
        start_page: usize,
        end_page: usize,
        result: &mut SplitResult,
    ) {
        for (start, end, segment_title) in self.plan_section(title, start_page, end_page) {
            let output = namer.full_path(&namer.chapter_name(section_number, Some(&segment_title)));
            if let Err(e) = job.export_segment(start, end, output, Some(segment_title.clone()), result)
            {
                warn!("Section '{}' failed: {}", segment_title, e);
                result.add_error(format!("Failed to split section '{}': {}", segment_title, e));
            }
        }
    }
}

impl Splitter for TocSplitter {
    fn strategy_name(&self) -> &'static str {
        "toc"
    }

    fn can_handle(&self, analysis: &DocumentAnalysis) -> bool {
        Self::chapters(analysis).len() >= 2
    }

    fn confidence_score(&self, analysis: &DocumentAnalysis) -> f64 {
        if !self.can_handle(analysis) {
            return 0.0;
        }
        let pages: Vec<usize> = Self::chapters(analysis).iter().map(|e| e.page).collect();
        let (coverage, density) = coverage_and_density(&pages, analysis.total_pages());
        (BASE_SCORE + coverage * COVERAGE_WEIGHT + density * DENSITY_WEIGHT).clamp(0.0, 1.0)
    }

    fn split(&self, job: &mut SplitJob<'_>) -> Result<SplitResult> {
        let mut result = job.create_result(self.strategy_name());
        if !self.can_handle(job.analysis) {
            result.add_error("Document does not have detectable table of contents");
            return Ok(result);
        }

        let namer = job.file_namer()?;
        let analysis = job.analysis;
        let chapters = Self::chapters(analysis);
        let total_pages = job.total_pages();
        debug!("Found {} chapter-level TOC entries", chapters.len());

        let first_chapter_page = chapters.first().map_or(1, |c| c.page);
        let has_front_matter = first_chapter_page > 1;
        let total_sections = chapters.len() + usize::from(has_front_matter);

        job.report_progress("Starting TOC-based splitting", 0, total_sections)?;

        let mut section_number = 0;
        if has_front_matter {
            let end_page = (first_chapter_page - 1).min(total_pages);
            section_number += 1;
            self.split_section(job, &namer, section_number, FRONT_MATTER, 1, end_page, &mut result);
            job.report_progress(
                format!("Processed front matter (pages 1-{})", end_page),
                section_number,
                total_sections,
            )?;
        }

        for (index, chapter) in chapters.iter().enumerate() {
            section_number += 1;
            let start_page = chapter.page;
            let end_page = chapters
                .get(index + 1)
                .map(|next| next.page.saturating_sub(1))
                .unwrap_or(total_pages)
                .min(total_pages);
            if start_page > end_page {
                debug!("Skipping empty section '{}'", chapter.title);
            } else {
                self.split_section(
                    job,
                    &namer,
                    section_number,
                    &chapter.title,
                    start_page,
                    end_page,
                    &mut result,
                );
            }
            job.report_progress(
                format!("Processed section: {}", chapter.title),
                section_number,
                total_sections,
            )?;
        }

        result.insert_metadata("toc_entries_processed", chapters.len());
        result.insert_metadata("strategy_confidence", self.confidence_score(analysis));
        Ok(result)
    }
}
