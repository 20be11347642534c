use super::{BookmarkSplitter, PageSplitter, SplitJob, Splitter, TocSplitter};
use crate::error::Result;
use crate::types::{DocumentAnalysis, SplitOptions, SplitResult};
use tracing::info;

/// Picks the most confident applicable splitter and delegates to it.
#[derive(Debug)]
pub struct SmartSplitter {
    bookmark: BookmarkSplitter,
    toc: TocSplitter,
    page: PageSplitter,
}

impl SmartSplitter {
    pub fn new(options: &SplitOptions) -> Self {
        Self {
            bookmark: BookmarkSplitter::new(),
            toc: TocSplitter::new(options.page_limit()),
            page: PageSplitter::new(options),
        }
    }

    /// Candidates in priority order; the page splitter is always last.
    fn candidates(&self) -> [&dyn Splitter; 3] {
        [&self.bookmark, &self.toc, &self.page]
    }

    /// Highest confidence among capable candidates; ties keep the earlier one.
    pub fn select_best_strategy(&self, analysis: &DocumentAnalysis) -> &dyn Splitter {
        let mut best: Option<(&dyn Splitter, f64)> = None;
        for candidate in self.candidates() {
            if !candidate.can_handle(analysis) {
                continue;
            }
            let score = candidate.confidence_score(analysis);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }
        match best {
            Some((splitter, _)) => splitter,
            None => &self.page,
        }
    }
}

impl Splitter for SmartSplitter {
    fn strategy_name(&self) -> &'static str {
        "smart"
    }

    fn can_handle(&self, _analysis: &DocumentAnalysis) -> bool {
        true
    }

    fn confidence_score(&self, analysis: &DocumentAnalysis) -> f64 {
        self.select_best_strategy(analysis).confidence_score(analysis)
    }

    fn split(&self, job: &mut SplitJob<'_>) -> Result<SplitResult> {
        let strategy = self.select_best_strategy(job.analysis);
        info!(
            "Selected strategy: {} (confidence: {:.2})",
            strategy.strategy_name(),
            strategy.confidence_score(job.analysis)
        );
        strategy.split(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DocumentSource;
    use crate::test_support::FakeDocument;
    use crate::types::{AnalysisBuilder, Bookmark, TocEntry};

    fn builder(pages: usize) -> AnalysisBuilder {
        AnalysisBuilder::new(FakeDocument::new(pages).metadata())
    }

    #[test]
    fn test_falls_back_to_pages_without_structure() {
        let splitter = SmartSplitter::new(&SplitOptions::default());
        let analysis = builder(10).build();

        assert_eq!(splitter.select_best_strategy(&analysis).strategy_name(), "page");
        assert_eq!(splitter.confidence_score(&analysis), 0.4);
    }

    #[test]
    fn test_toc_outranks_bookmarks_on_higher_score() {
        let mut analysis = builder(100);
        analysis
            .add_bookmark(Bookmark::new("One", 1, 1))
            .add_bookmark(Bookmark::new("Two", 5, 1))
            .add_toc_entry(TocEntry::new("Alpha", 1, 1))
            .add_toc_entry(TocEntry::new("Beta", 60, 1));
        let analysis = analysis.build();

        let splitter = SmartSplitter::new(&SplitOptions::default());
        // bookmark: 0.7 + 0.2 * 0.05 + 0.02, toc: 0.8 + 0.15 * 0.6 + 0.01
        assert_eq!(splitter.select_best_strategy(&analysis).strategy_name(), "toc");
    }

    #[test]
    fn test_delegated_result_names_the_winner() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeDocument::new(12);
        let mut builder = AnalysisBuilder::new(source.metadata());
        builder
            .add_bookmark(Bookmark::new("First Half", 1, 1))
            .add_bookmark(Bookmark::new("Second Half", 7, 1));
        let analysis = builder.build();
        let options = SplitOptions {
            output_dir: dir.path().to_path_buf(),
            ..SplitOptions::default()
        };

        let splitter = SmartSplitter::new(&options);
        let mut job = SplitJob::new(&source, &analysis, &options);
        let result = splitter.split(&mut job).unwrap();

        assert_eq!(result.strategy_used(), "bookmark");
        assert_eq!(source.exported_ranges(), vec![(1, 6), (7, 12)]);
    }
}
