//! # PDF Splitter Library
//!
//! Analyzes the structure of a PDF (outline, in-page table of contents,
//! header-like text) and splits it into smaller documents along the most
//! trustworthy structure it finds, falling back to fixed page windows.
//!
//! ## Example Usage
//!
//! ```no_run
//! use pdf_splitter::{analyze_document, split_document, ContentFetcher, SplitJob, SplitOptions};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load the document
//!     let (document, _info) = ContentFetcher::load_document("manual.pdf").await?;
//!
//!     // Analyze its structure
//!     let analysis = analyze_document(&document);
//!     println!("Recommended: {}", analysis.recommendation().primary_strategy);
//!
//!     // Split with automatic strategy selection
//!     let options = SplitOptions {
//!         max_pages: Some(40),
//!         output_dir: PathBuf::from("./splits"),
//!         ..SplitOptions::default()
//!     };
//!     let mut job = SplitJob::new(&document, &analysis, &options);
//!     let result = split_document(&mut job)?;
//!
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

pub mod analyzers;
pub mod error;
pub mod info;
pub mod services;
pub mod splitters;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types and services for easier usage
pub use analyzers::{
    analyze_document, Analyzer, BookmarkAnalyzer, ContentAnalyzer, StrategyRecommender,
    TocAnalyzer,
};
pub use error::{PdfSplitterError, Result};
pub use info::DocumentInfo;
pub use services::{write_manifest, ContentFetcher, DocumentSource, FileNamer, PdfDocument};
pub use splitters::{
    split_document, splitter_for, BookmarkSplitter, PageSplitter, SmartSplitter, SplitJob,
    Splitter, TocSplitter,
};
pub use types::{
    Bookmark, ContentPattern, DocumentAnalysis, DocumentMetadata, ProgressUpdate, Recommendation,
    RecommendedStrategy, SourceInfo, SourceType, SplitFileInfo, SplitOptions, SplitResult,
    Strategy, TocEntry,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
