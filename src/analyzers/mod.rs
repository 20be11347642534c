//! Structure analyzers.
//!
//! Each analyzer makes one independent, best-effort pass over a
//! [`DocumentSource`]. Extraction problems never abort a pass; they only
//! shrink its output.

pub mod bookmark;
pub mod content;
pub mod recommender;
pub mod toc;

pub use bookmark::BookmarkAnalyzer;
pub use content::ContentAnalyzer;
pub use recommender::StrategyRecommender;
pub use toc::TocAnalyzer;

use crate::services::DocumentSource;
use crate::types::{AnalysisBuilder, DocumentAnalysis};
use tracing::{debug, info};

pub trait Analyzer {
    type Output;

    fn analyze(&self, source: &dyn DocumentSource) -> Self::Output;
}

/// Runs every analyzer in turn, then the strategy recommender.
pub fn analyze_document(source: &dyn DocumentSource) -> DocumentAnalysis {
    info!("Analyzing document structure: {}", source.source_path());

    let mut builder = AnalysisBuilder::new(source.metadata());

    let bookmarks = BookmarkAnalyzer::new().analyze(source);
    debug!("Bookmark analysis found {} root bookmarks", bookmarks.len());
    for bookmark in bookmarks {
        builder.add_bookmark(bookmark);
    }

    let toc_entries = TocAnalyzer::new().analyze(source);
    debug!("TOC analysis found {} entries", toc_entries.len());
    for entry in toc_entries {
        builder.add_toc_entry(entry);
    }

    let patterns = ContentAnalyzer::new().analyze(source);
    debug!("Content analysis found {} patterns", patterns.len());
    for pattern in patterns {
        builder.add_content_pattern(pattern);
    }

    let analysis = builder.build();
    let recommendation = analysis.recommendation();
    info!(
        "Recommended strategy: {} (confidence {:.2})",
        recommendation.primary_strategy, recommendation.confidence
    );
    debug!("Analysis summary: {:?}", analysis.summary());
    analysis
}
