use crate::types::{Recommendation, RecommendedStrategy, StructureView};
use std::collections::HashSet;

const BOOKMARKS_CONFIDENCE: f64 = 0.95;
const TOC_CONFIDENCE: f64 = 0.80;
const HEADERS_CONFIDENCE: f64 = 0.65;
const PAGES_CONFIDENCE: f64 = 0.40;

/// Bookmarks must span more than this share of the document.
const MIN_BOOKMARK_SPREAD: f64 = 0.3;

/// Ranks the structural sources an analysis found.
///
/// The confidence is a fixed value per strategy class rather than a
/// measure of how good the detected structure is.
pub struct StrategyRecommender;

impl StrategyRecommender {
    pub fn recommend(structure: &StructureView<'_>) -> Recommendation {
        let primary = Self::primary_strategy(structure);

        let mut fallback_strategies: Vec<RecommendedStrategy> = [
            (RecommendedStrategy::Bookmarks, structure.has_bookmarks()),
            (RecommendedStrategy::Toc, structure.has_toc()),
            (RecommendedStrategy::Headers, structure.headers().next().is_some()),
        ]
        .into_iter()
        .filter(|&(strategy, present)| present && strategy != primary)
        .map(|(strategy, _)| strategy)
        .collect();
        fallback_strategies.push(RecommendedStrategy::Pages);

        Recommendation {
            primary_strategy: primary,
            fallback_strategies,
            confidence: Self::confidence_for(primary),
            reasoning: Self::reasoning(primary, structure),
        }
    }

    fn primary_strategy(structure: &StructureView<'_>) -> RecommendedStrategy {
        if Self::reliable_bookmarks(structure) {
            RecommendedStrategy::Bookmarks
        } else if Self::reliable_toc(structure) {
            RecommendedStrategy::Toc
        } else if Self::reliable_headers(structure) {
            RecommendedStrategy::Headers
        } else {
            RecommendedStrategy::Pages
        }
    }

    pub fn confidence_for(strategy: RecommendedStrategy) -> f64 {
        match strategy {
            RecommendedStrategy::Bookmarks => BOOKMARKS_CONFIDENCE,
            RecommendedStrategy::Toc => TOC_CONFIDENCE,
            RecommendedStrategy::Headers => HEADERS_CONFIDENCE,
            RecommendedStrategy::Pages => PAGES_CONFIDENCE,
        }
    }

    fn reasoning(primary: RecommendedStrategy, structure: &StructureView<'_>) -> String {
        match primary {
            RecommendedStrategy::Bookmarks => format!(
                "Document has comprehensive bookmark structure with {} bookmarks",
                structure.bookmarks.len()
            ),
            RecommendedStrategy::Toc => format!(
                "Document has detectable table of contents with {} entries",
                structure.toc_entries.len()
            ),
            RecommendedStrategy::Headers => format!(
                "Document has structured headers with {} detected patterns",
                structure.headers().count()
            ),
            RecommendedStrategy::Pages => {
                "No reliable structure detected, falling back to page-based splitting".to_string()
            }
        }
    }

    fn reliable_bookmarks(structure: &StructureView<'_>) -> bool {
        let bookmarks = structure.bookmarks;
        if bookmarks.len() < 2 {
            return false;
        }

        let pages: HashSet<usize> = bookmarks.iter().map(|b| b.page).collect();
        let (Some(&first), Some(&last)) = (pages.iter().min(), pages.iter().max()) else {
            return false;
        };
        let total_pages = structure.total_pages.max(1);
        let spread = (last - first) as f64 / total_pages as f64;

        spread > MIN_BOOKMARK_SPREAD && pages.len() > 1
    }

    fn reliable_toc(structure: &StructureView<'_>) -> bool {
        let entries = structure.toc_entries;
        if entries.len() < 3 {
            return false;
        }

        let total_pages = structure.total_pages.max(1);
        let in_range = entries
            .iter()
            .all(|entry| entry.page > 0 && entry.page <= total_pages);
        let distinct: HashSet<usize> = entries.iter().map(|entry| entry.page).collect();

        in_range && distinct.len() >= 3
    }

    fn reliable_headers(structure: &StructureView<'_>) -> bool {
        let mut count = 0;
        let mut has_top_level = false;
        for header in structure.headers() {
            count += 1;
            has_top_level |= header.level == 1;
        }
        count >= 3 && has_top_level
    }
}
