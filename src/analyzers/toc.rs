use super::Analyzer;
use crate::services::DocumentSource;
use crate::types::TocEntry;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

const TOC_KEYWORDS: &[&str] = &[
    "table of contents",
    "contents",
    "index",
    "table des matières",
    "inhalt",
    "indice",
];

/// Only the opening pages are searched for a table of contents.
const TOC_SCAN_PAGES: usize = 10;

/// Share of numbered lines above which a page reads as TOC content.
const PAGE_NUMBER_LINE_RATIO: f64 = 0.3;

/// Trailing page-number forms, tried in order.
static PAGE_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(\d+)$").unwrap(),
        Regex::new(r"\.{2,}\s*(\d+)$").unwrap(),
        Regex::new(r"\s+(\d+)$").unwrap(),
        Regex::new(r"-+\s*(\d+)$").unwrap(),
    ]
});

static TRAILING_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}$").unwrap());
static LEADING_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.+").unwrap());
static TRAILING_DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}$").unwrap());
static LEADING_DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-+").unwrap());

/// Finds in-page tables of contents and parses their lines.
#[derive(Debug, Default)]
pub struct TocAnalyzer;

impl TocAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Pages that look like a table of contents, ascending and unique.
    pub fn detect_toc_pages(&self, source: &dyn DocumentSource) -> Vec<usize> {
        let page_count = source.page_count();
        let mut toc_pages = Vec::new();

        for page in 1..=TOC_SCAN_PAGES.min(page_count) {
            let Some(text) = source.page_text(page) else {
                continue;
            };

            let normalized = text.trim().to_lowercase();
            if TOC_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
                toc_pages.push(page);
                let next_page = page + 1;
                if next_page <= page_count
                    && source
                        .page_text(next_page)
                        .is_some_and(|next| Self::looks_like_toc_content(&next))
                {
                    toc_pages.push(next_page);
                }
            } else if Self::looks_like_toc_content(&text) {
                toc_pages.push(page);
            }
        }

        toc_pages.sort_unstable();
        toc_pages.dedup();
        toc_pages
    }

    /// True when at least three lines exist and over 30% end in a page number.
    pub fn looks_like_toc_content(text: &str) -> bool {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.len() < 3 {
            return false;
        }

        let numbered = lines
            .iter()
            .filter(|line| PAGE_NUMBER_PATTERNS.iter().any(|p| p.is_match(line)))
            .count();
        numbered as f64 / lines.len() as f64 > PAGE_NUMBER_LINE_RATIO
    }

    fn extract_toc_entries(&self, source: &dyn DocumentSource, page: usize) -> Vec<TocEntry> {
        let Some(text) = source.page_text(page) else {
            return Vec::new();
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(Self::parse_toc_line)
            .collect()
    }

    /// Parses one raw line; indentation is read before trimming.
    pub fn parse_toc_line(raw_line: &str) -> Option<TocEntry> {
        let line = raw_line.trim();

        for pattern in PAGE_NUMBER_PATTERNS.iter() {
            let Some(captures) = pattern.captures(line) else {
                continue;
            };
            let Some(page) = captures
                .get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .filter(|&page| page > 0)
            else {
                continue;
            };

            let suffix_start = captures.get(0).map_or(line.len(), |m| m.start());
            let title = clean_title(&line[..suffix_start]);
            if title.chars().count() < 3 {
                continue;
            }

            return Some(TocEntry::new(&title, page, estimate_level(raw_line)));
        }

        None
    }
}

/// Strips dot and dash leaders from both ends. Applying it twice changes nothing.
pub fn clean_title(title: &str) -> String {
    let mut current = title.trim().to_string();
    loop {
        let cleaned = TRAILING_DOTS.replace(&current, "");
        let cleaned = LEADING_DOTS.replace(&cleaned, "");
        let cleaned = TRAILING_DASHES.replace(&cleaned, "");
        let cleaned = LEADING_DASHES.replace(&cleaned, "");
        let cleaned = cleaned.trim();
        if cleaned == current {
            return current;
        }
        current = cleaned.to_string();
    }
}

fn estimate_level(raw_line: &str) -> usize {
    let leading = raw_line.chars().take_while(|c| c.is_whitespace()).count();
    match leading {
        0..=2 => 1,
        3..=6 => 2,
        7..=10 => 3,
        _ => 4,
    }
}

impl Analyzer for TocAnalyzer {
    type Output = Vec<TocEntry>;

    fn analyze(&self, source: &dyn DocumentSource) -> Vec<TocEntry> {
        let toc_pages = self.detect_toc_pages(source);
        if toc_pages.is_empty() {
            return Vec::new();
        }
        debug!("Detected TOC pages: {:?}", toc_pages);

        toc_pages
            .into_iter()
            .flat_map(|page| self.extract_toc_entries(source, page))
            .collect()
    }
}
