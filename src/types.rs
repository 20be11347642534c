use crate::analyzers::StrategyRecommender;
use crate::error::PdfSplitterError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
}

/// Where a document's bytes came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub filename: String,
    pub location: String,
    pub source_type: SourceType,
    pub size_bytes: u64,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A run of text on a page with its approximate rendered size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub font_size: Option<f64>,
    pub position: Option<Position>,
}

/// One node of the document outline. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub page: usize,
    pub level: usize,
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, page: usize, level: usize) -> Self {
        Self {
            title: title.into(),
            page,
            level,
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, bookmark: Bookmark) {
        self.children.push(bookmark);
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Bookmark::node_count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Bookmark::depth).max().unwrap_or(0)
    }

    pub fn display_text(&self, indent: usize) -> String {
        let mut text = format!("{}{} (Page {})", "  ".repeat(indent), self.title, self.page);
        for child in &self.children {
            text.push('\n');
            text.push_str(&child.display_text(indent + 1));
        }
        text
    }
}

/// A line parsed out of an in-page table of contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub page: usize,
    pub level: usize,
}

impl TocEntry {
    pub fn new(title: &str, page: usize, level: usize) -> Self {
        Self {
            title: title.trim().to_string(),
            page,
            level,
        }
    }

    pub fn display_text(&self, indent: usize) -> String {
        format!("{}{} ... {}", "  ".repeat(indent), self.title, self.page)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPattern {
    pub text: String,
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    pub level: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ContentPattern {
    pub fn new(
        text: &str,
        page: usize,
        font_size: Option<f64>,
        level: usize,
        position: Option<Position>,
    ) -> Self {
        Self {
            text: text.trim().to_string(),
            page,
            font_size,
            level,
            position,
        }
    }

    pub fn is_header(&self) -> bool {
        self.level <= 3 && self.font_size.is_some_and(|size| size > 12.0)
    }

    pub fn display_text(&self, indent: usize) -> String {
        let size_info = self
            .font_size
            .map(|size| format!(" ({}pt)", size))
            .unwrap_or_default();
        format!(
            "{}{}{} [Page {}]",
            "  ".repeat(indent),
            self.text,
            size_info,
            self.page
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub pages: usize,
    pub title: String,
    pub author: String,
    pub creator: String,
    pub producer: String,
    pub pdf_version: String,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            pages: 0,
            title: "Unknown".to_string(),
            author: "Unknown".to_string(),
            creator: "Unknown".to_string(),
            producer: "Unknown".to_string(),
            pdf_version: "Unknown".to_string(),
            file_size: 0,
            creation_date: None,
            modification_date: None,
        }
    }
}

/// Structural source a recommendation can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedStrategy {
    Bookmarks,
    Toc,
    Headers,
    Pages,
}

impl RecommendedStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmarks => "bookmarks",
            Self::Toc => "toc",
            Self::Headers => "headers",
            Self::Pages => "pages",
        }
    }
}

impl fmt::Display for RecommendedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub primary_strategy: RecommendedStrategy,
    pub fallback_strategies: Vec<RecommendedStrategy>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Borrowed view over the structure an analysis has collected so far.
#[derive(Debug, Clone, Copy)]
pub struct StructureView<'a> {
    pub total_pages: usize,
    pub bookmarks: &'a [Bookmark],
    pub toc_entries: &'a [TocEntry],
    pub content_patterns: &'a [ContentPattern],
}

impl StructureView<'_> {
    pub fn has_bookmarks(&self) -> bool {
        !self.bookmarks.is_empty()
    }

    pub fn has_toc(&self) -> bool {
        !self.toc_entries.is_empty()
    }

    pub fn has_content_patterns(&self) -> bool {
        !self.content_patterns.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &ContentPattern> {
        self.content_patterns.iter().filter(|p| p.is_header())
    }
}

/// Append-only collector filled by the analyzers; `build` finalizes it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisBuilder {
    metadata: DocumentMetadata,
    bookmarks: Vec<Bookmark>,
    toc_entries: Vec<TocEntry>,
    content_patterns: Vec<ContentPattern>,
}

impl AnalysisBuilder {
    pub fn new(metadata: DocumentMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn add_bookmark(&mut self, bookmark: Bookmark) -> &mut Self {
        self.bookmarks.push(bookmark);
        self
    }

    pub fn add_toc_entry(&mut self, entry: TocEntry) -> &mut Self {
        self.toc_entries.push(entry);
        self
    }

    pub fn add_content_pattern(&mut self, pattern: ContentPattern) -> &mut Self {
        self.content_patterns.push(pattern);
        self
    }

    pub fn structure(&self) -> StructureView<'_> {
        StructureView {
            total_pages: self.metadata.pages,
            bookmarks: &self.bookmarks,
            toc_entries: &self.toc_entries,
            content_patterns: &self.content_patterns,
        }
    }

    /// Runs the strategy recommender and freezes the analysis.
    pub fn build(self) -> DocumentAnalysis {
        let recommendation = StrategyRecommender::recommend(&self.structure());
        DocumentAnalysis {
            metadata: self.metadata,
            bookmarks: self.bookmarks,
            toc_entries: self.toc_entries,
            content_patterns: self.content_patterns,
            recommendation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSpan {
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_pages: usize,
    pub has_bookmarks: bool,
    pub bookmark_count: usize,
    pub has_toc: bool,
    pub toc_entries: usize,
    pub content_patterns: usize,
    pub recommended_strategy: RecommendedStrategy,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    metadata: DocumentMetadata,
    bookmarks: Vec<Bookmark>,
    toc_entries: Vec<TocEntry>,
    content_patterns: Vec<ContentPattern>,
    recommendation: Recommendation,
}

impl DocumentAnalysis {
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Page count used by coverage and end-page computations; never zero.
    pub fn total_pages(&self) -> usize {
        self.metadata.pages.max(1)
    }

    /// Root-level bookmarks.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn toc_entries(&self) -> &[TocEntry] {
        &self.toc_entries
    }

    pub fn content_patterns(&self) -> &[ContentPattern] {
        &self.content_patterns
    }

    pub fn recommendation(&self) -> &Recommendation {
        &self.recommendation
    }

    pub fn structure(&self) -> StructureView<'_> {
        StructureView {
            total_pages: self.metadata.pages,
            bookmarks: &self.bookmarks,
            toc_entries: &self.toc_entries,
            content_patterns: &self.content_patterns,
        }
    }

    pub fn has_bookmarks(&self) -> bool {
        !self.bookmarks.is_empty()
    }

    pub fn has_toc(&self) -> bool {
        !self.toc_entries.is_empty()
    }

    pub fn has_content_patterns(&self) -> bool {
        !self.content_patterns.is_empty()
    }

    pub fn headers(&self) -> Vec<&ContentPattern> {
        self.content_patterns.iter().filter(|p| p.is_header()).collect()
    }

    /// Section spans derived from level-1 bookmarks, else level-1 headers.
    pub fn sections(&self) -> Vec<SectionSpan> {
        if self.has_bookmarks() {
            return self.bookmark_sections();
        }
        if self.has_content_patterns() {
            return self.pattern_sections();
        }
        Vec::new()
    }

    fn bookmark_sections(&self) -> Vec<SectionSpan> {
        self.bookmarks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.level == 1)
            .map(|(idx, bookmark)| {
                let end_page = self.bookmarks[idx + 1..]
                    .iter()
                    .find(|next| next.level <= bookmark.level)
                    .map(|next| next.page.saturating_sub(1))
                    .unwrap_or(self.metadata.pages);
                SectionSpan {
                    title: bookmark.title.clone(),
                    start_page: bookmark.page,
                    end_page,
                }
            })
            .collect()
    }

    fn pattern_sections(&self) -> Vec<SectionSpan> {
        let chapters: Vec<&ContentPattern> = self
            .content_patterns
            .iter()
            .filter(|p| p.is_header() && p.level == 1)
            .collect();

        chapters
            .iter()
            .enumerate()
            .map(|(idx, header)| SectionSpan {
                title: header.text.clone(),
                start_page: header.page,
                end_page: chapters
                    .get(idx + 1)
                    .map(|next| next.page.saturating_sub(1))
                    .unwrap_or(self.metadata.pages),
            })
            .collect()
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            total_pages: self.metadata.pages,
            has_bookmarks: self.has_bookmarks(),
            bookmark_count: self.bookmarks.len(),
            has_toc: self.has_toc(),
            toc_entries: self.toc_entries.len(),
            content_patterns: self.content_patterns.len(),
            recommended_strategy: self.recommendation.primary_strategy,
            confidence: self.recommendation.confidence,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "metadata": self.metadata,
            "bookmarks": self.bookmarks,
            "toc": {
                "detected": self.has_toc(),
                "entries": self.toc_entries,
            },
            "content_patterns": {
                "headers": self.headers(),
                "sections": self.sections(),
            },
            "recommendations": self.recommendation,
        })
    }
}

/// Splitting strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Auto,
    Bookmarks,
    Toc,
    Pages,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Bookmarks => "bookmarks",
            Self::Toc => "toc",
            Self::Pages => "pages",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PdfSplitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "bookmarks" => Ok(Self::Bookmarks),
            "toc" => Ok(Self::Toc),
            "pages" => Ok(Self::Pages),
            _ => Err(PdfSplitterError::InvalidStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Tokens assumed per page when estimating a page limit from a token budget.
const TOKENS_PER_PAGE_ESTIMATE: usize = 300;
const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct SplitOptions {
    pub strategy: Strategy,
    pub max_pages: Option<usize>,
    pub max_tokens: Option<usize>,
    pub output_dir: PathBuf,
    pub preserve_metadata: bool,
    pub write_manifest: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            max_pages: None,
            max_tokens: None,
            output_dir: PathBuf::from("./splits"),
            preserve_metadata: true,
            write_manifest: true,
        }
    }
}

impl SplitOptions {
    pub fn is_auto(&self) -> bool {
        self.strategy == Strategy::Auto
    }

    /// Explicit page limit, ignoring a zero value.
    pub fn page_limit(&self) -> Option<usize> {
        self.max_pages.filter(|&pages| pages > 0)
    }

    /// Explicit token limit, ignoring a zero value.
    pub fn token_limit(&self) -> Option<usize> {
        self.max_tokens.filter(|&tokens| tokens > 0)
    }

    pub fn effective_page_limit(&self) -> usize {
        if let Some(pages) = self.page_limit() {
            return pages;
        }
        if let Some(tokens) = self.token_limit() {
            return tokens.div_ceil(TOKENS_PER_PAGE_ESTIMATE).max(1);
        }
        DEFAULT_PAGE_LIMIT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitFileInfo {
    pub filename: PathBuf,
    pub pages: usize,
    pub page_range: String,
    pub section_title: Option<String>,
    pub file_size: u64,
}

impl SplitFileInfo {
    pub fn new(
        filename: PathBuf,
        start_page: usize,
        end_page: usize,
        section_title: Option<String>,
    ) -> Self {
        let file_size = std::fs::metadata(&filename).map(|m| m.len()).unwrap_or(0);
        Self {
            filename,
            pages: end_page + 1 - start_page,
            page_range: format!("{}-{}", start_page, end_page),
            section_title,
            file_size,
        }
    }
}

/// Outcome of one split run. Splitters append to it; callers only read it.
#[derive(Debug, Clone)]
pub struct SplitResult {
    source_file: String,
    strategy_used: String,
    total_pages: usize,
    output_files: Vec<SplitFileInfo>,
    errors: Vec<String>,
    metadata: Map<String, Value>,
}

impl SplitResult {
    pub fn new(source_file: impl Into<String>, strategy_used: &str, total_pages: usize) -> Self {
        Self {
            source_file: source_file.into(),
            strategy_used: strategy_used.to_string(),
            total_pages,
            output_files: Vec::new(),
            errors: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub(crate) fn add_split_file(&mut self, file_info: SplitFileInfo) {
        self.output_files.push(file_info);
    }

    pub(crate) fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub(crate) fn insert_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn strategy_used(&self) -> &str {
        &self.strategy_used
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn output_files(&self) -> &[SplitFileInfo] {
        &self.output_files
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn split_count(&self) -> usize {
        self.output_files.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.split_count() > 0
    }

    pub fn is_partial_success(&self) -> bool {
        self.split_count() > 0 && !self.errors.is_empty()
    }

    pub fn is_failure(&self) -> bool {
        self.split_count() == 0
    }

    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "Successfully split {} into {} files using {} strategy",
                self.source_file,
                self.split_count(),
                self.strategy_used
            )
        } else if self.is_partial_success() {
            format!(
                "Partially split {} into {} files with {} errors",
                self.source_file,
                self.split_count(),
                self.errors.len()
            )
        } else {
            format!(
                "Failed to split {}: {}",
                self.source_file,
                self.errors.join(", ")
            )
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "source_file": self.source_file,
            "strategy_used": self.strategy_used,
            "total_pages": self.total_pages,
            "split_count": self.split_count(),
            "output_files": self.output_files,
            "metadata": self.metadata,
            "errors": self.errors,
            "success": self.is_success(),
        })
    }
}

/// One progress notification emitted after a unit of splitting work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub message: String,
    pub current: Option<usize>,
    pub total: Option<usize>,
    pub percentage: Option<f64>,
}

impl ProgressUpdate {
    pub fn new(message: impl Into<String>, current: Option<usize>, total: Option<usize>) -> Self {
        let percentage = match (current, total) {
            (Some(current), Some(total)) if total > 0 => {
                Some((current as f64 / total as f64 * 1000.0).round() / 10.0)
            }
            _ => None,
        };
        Self {
            message: message.into(),
            current,
            total,
            percentage,
        }
    }
}
