//! In-memory document used by unit tests.

use crate::error::{PdfSplitterError, Result};
use crate::services::document::{Destination, DocumentSource, ObjectRef, OutlineItem};
use crate::types::{DocumentMetadata, TextSpan};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub(crate) fn page_ref(page: usize) -> ObjectRef {
    ObjectRef {
        id: 1000 + page as u32,
        generation: 0,
    }
}

pub(crate) fn node_ref(id: u32) -> ObjectRef {
    ObjectRef { id, generation: 0 }
}

pub(crate) fn outline_node(
    title: &str,
    destination: Destination,
    first: Option<u32>,
    next: Option<u32>,
) -> OutlineItem {
    OutlineItem {
        title: Some(title.as_bytes().to_vec()),
        destination,
        first: first.map(node_ref),
        next: next.map(node_ref),
    }
}

#[derive(Default)]
pub(crate) struct FakeDocument {
    pub path: String,
    pub pages: usize,
    pub texts: HashMap<usize, String>,
    pub spans: HashMap<usize, Vec<TextSpan>>,
    pub failing_span_pages: HashSet<usize>,
    pub outline_first: Option<ObjectRef>,
    pub outline: HashMap<ObjectRef, OutlineItem>,
    pub indirect: HashMap<ObjectRef, ObjectRef>,
    pub failing_export_starts: HashSet<usize>,
    pub exports: RefCell<Vec<(Vec<usize>, PathBuf)>>,
}

impl FakeDocument {
    pub fn new(pages: usize) -> Self {
        Self {
            path: "/docs/sample.pdf".to_string(),
            pages,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, page: usize, text: &str) -> Self {
        self.texts.insert(page, text.to_string());
        self
    }

    pub fn with_spans(mut self, page: usize, spans: Vec<TextSpan>) -> Self {
        self.spans.insert(page, spans);
        self
    }

    pub fn with_outline(mut self, first: u32, nodes: Vec<(u32, OutlineItem)>) -> Self {
        self.outline_first = Some(node_ref(first));
        self.outline = nodes.into_iter().map(|(id, item)| (node_ref(id), item)).collect();
        self
    }

    pub fn failing_export_at(mut self, start_page: usize) -> Self {
        self.failing_export_starts.insert(start_page);
        self
    }

    pub fn exported_ranges(&self) -> Vec<(usize, usize)> {
        self.exports
            .borrow()
            .iter()
            .map(|(pages, _)| (pages[0], pages[pages.len() - 1]))
            .collect()
    }
}

impl DocumentSource for FakeDocument {
    fn source_path(&self) -> &str {
        &self.path
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            pages: self.pages,
            pdf_version: "1.7".to_string(),
            ..DocumentMetadata::default()
        }
    }

    fn outline_first(&self) -> Option<ObjectRef> {
        self.outline_first
    }

    fn outline_item(&self, node: ObjectRef) -> Option<OutlineItem> {
        self.outline.get(&node).cloned()
    }

    fn page_refs(&self) -> Vec<ObjectRef> {
        (1..=self.pages).map(page_ref).collect()
    }

    fn dereference(&self, object: ObjectRef) -> Option<ObjectRef> {
        self.indirect.get(&object).copied()
    }

    fn page_text(&self, page: usize) -> Option<String> {
        if page == 0 || page > self.pages {
            return None;
        }
        Some(
            self.texts
                .get(&page)
                .cloned()
                .unwrap_or_else(|| format!("Page {} content", page)),
        )
    }

    fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>> {
        if self.failing_span_pages.contains(&page) {
            return Err(PdfSplitterError::InvalidPdf {
                reason: format!("broken content stream on page {}", page),
            });
        }
        Ok(self.spans.get(&page).cloned().unwrap_or_default())
    }

    fn export_pages(&self, pages: &[usize], output: &Path, _preserve_metadata: bool) -> Result<()> {
        if pages.iter().any(|&p| p == 0 || p > self.pages) {
            return Err(PdfSplitterError::Export {
                reason: "page out of range".to_string(),
            });
        }
        if let Some(first) = pages.first() {
            if self.failing_export_starts.contains(first) {
                return Err(PdfSplitterError::Export {
                    reason: format!("simulated write failure at page {}", first),
                });
            }
        }
        std::fs::write(output, b"%PDF-fake")?;
        self.exports
            .borrow_mut()
            .push((pages.to_vec(), output.to_path_buf()));
        Ok(())
    }
}
