use super::Analyzer;
use crate::services::DocumentSource;
use crate::types::{ContentPattern, TextSpan};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

const SAMPLE_PAGES: usize = 20;
const MIN_HEADER_SIZE: f64 = 14.0;
const MAX_HEADER_SIZE: f64 = 48.0;
const MIN_HEADER_LEN: usize = 3;
const MAX_HEADER_LEN: usize = 100;

static HEADER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^chapter\s+\d+").unwrap(),
        Regex::new(r"(?i)^section\s+\d+").unwrap(),
        Regex::new(r"^\d+\.\s+").unwrap(),
        Regex::new(r"^\d+\.\d+\s+").unwrap(),
        Regex::new(r"^\d+\.\d+\.\d+\s+").unwrap(),
    ]
});

static NUMBERED_L3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").unwrap());
static NUMBERED_L2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+").unwrap());
static NUMBERED_L1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+\.|chapter\s+\d+)").unwrap());

/// Picks header-like spans out of the first pages of a document.
#[derive(Debug, Default)]
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn analyze_page(&self, source: &dyn DocumentSource, page: usize) -> Vec<ContentPattern> {
        match source.page_spans(page) {
            Ok(spans) => spans
                .iter()
                .filter_map(|span| Self::analyze_span(span, page))
                .collect(),
            Err(e) => {
                warn!("Could not analyze page {}: {}", page, e);
                Vec::new()
            }
        }
    }

    fn analyze_span(span: &TextSpan, page: usize) -> Option<ContentPattern> {
        let text = span.text.trim();
        if !Self::is_potential_header(text, span.font_size) {
            return None;
        }
        let level = Self::header_level(text, span.font_size);
        Some(ContentPattern::new(text, page, span.font_size, level, span.position))
    }

    pub fn is_potential_header(text: &str, font_size: Option<f64>) -> bool {
        let len = text.chars().count();
        if !(MIN_HEADER_LEN..=MAX_HEADER_LEN).contains(&len) {
            return false;
        }
        if font_size.is_some_and(|size| !(MIN_HEADER_SIZE..=MAX_HEADER_SIZE).contains(&size)) {
            return false;
        }

        HEADER_PATTERNS.iter().any(|pattern| pattern.is_match(text))
            || looks_like_title(text)
            || font_size.is_some_and(|size| size >= MIN_HEADER_SIZE)
    }

    /// Numbering depth wins over font size.
    pub fn header_level(text: &str, font_size: Option<f64>) -> usize {
        if NUMBERED_L3.is_match(text) {
            return 3;
        }
        if NUMBERED_L2.is_match(text) {
            return 2;
        }
        if NUMBERED_L1.is_match(text) {
            return 1;
        }

        match font_size {
            Some(size) if (18.0..=MAX_HEADER_SIZE).contains(&size) => 1,
            Some(size) if (16.0..=17.0).contains(&size) => 2,
            Some(size) if (14.0..=15.0).contains(&size) => 3,
            _ => 2,
        }
    }
}

/// Two to ten words, each capitalized or upper case, or a fully upper-case line.
fn looks_like_title(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if !(2..=10).contains(&words.len()) {
        return false;
    }

    let title_case = words
        .iter()
        .all(|word| *word == capitalize(word) || *word == word.to_uppercase());
    let all_caps = text == text.to_uppercase() && text.chars().any(|c| c.is_ascii_uppercase());

    title_case || all_caps
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl Analyzer for ContentAnalyzer {
    type Output = Vec<ContentPattern>;

    fn analyze(&self, source: &dyn DocumentSource) -> Vec<ContentPattern> {
        let sample = source.page_count().min(SAMPLE_PAGES);
        let mut patterns: Vec<ContentPattern> = (1..=sample)
            .flat_map(|page| self.analyze_page(source, page))
            .collect();
        patterns.sort_by_key(|pattern| pattern.page);
        patterns
    }
}
