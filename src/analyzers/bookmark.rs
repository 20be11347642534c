use super::Analyzer;
use crate::services::document::try_decode_pdf_string;
use crate::services::{DocumentSource, ObjectRef, OutlineItem};
use crate::types::Bookmark;
use std::collections::HashSet;
use tracing::debug;

const UNTITLED: &str = "Untitled";

/// Builds the bookmark forest from the document outline.
///
/// The walk is iterative and remembers every visited node, so cyclic or
/// shared outline links in damaged files cannot recurse forever.
#[derive(Debug, Default)]
pub struct BookmarkAnalyzer;

/// One sibling chain being collected.
struct Frame {
    level: usize,
    next: Option<ObjectRef>,
    collected: Vec<Bookmark>,
    parent: Option<(String, usize)>,
}

impl BookmarkAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn extract_title(item: &OutlineItem) -> Option<String> {
        let raw = item.title.as_deref()?;
        Some(try_decode_pdf_string(raw).unwrap_or_else(|| UNTITLED.to_string()))
    }

    fn extract_page_number(
        source: &dyn DocumentSource,
        item: &OutlineItem,
        pages: &[ObjectRef],
    ) -> Option<usize> {
        let target = item.destination.target()?;
        Self::resolve_page_reference(source, target, pages)
    }

    /// Maps a page object back to its 1-based position.
    fn resolve_page_reference(
        source: &dyn DocumentSource,
        target: ObjectRef,
        pages: &[ObjectRef],
    ) -> Option<usize> {
        if let Some(idx) = pages.iter().position(|page| *page == target) {
            return Some(idx + 1);
        }
        let resolved = source.dereference(target)?;
        pages.iter().position(|page| *page == resolved).map(|idx| idx + 1)
    }
}

impl Analyzer for BookmarkAnalyzer {
    type Output = Vec<Bookmark>;

    fn analyze(&self, source: &dyn DocumentSource) -> Vec<Bookmark> {
        let Some(first) = source.outline_first() else {
            return Vec::new();
        };

        let pages = source.page_refs();
        let mut visited = HashSet::new();
        let mut stack = vec![Frame {
            level: 1,
            next: Some(first),
            collected: Vec::new(),
            parent: None,
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Vec::new();
            };

            match frame.next.take() {
                Some(node) => {
                    if !visited.insert(node) {
                        debug!("Outline node {:?} already visited, ending chain", node);
                        continue;
                    }
                    let Some(item) = source.outline_item(node) else {
                        continue;
                    };
                    frame.next = item.next;

                    let title = Self::extract_title(&item);
                    let page = Self::extract_page_number(source, &item, &pages);
                    let (Some(title), Some(page)) = (title, page) else {
                        // Unresolvable nodes are dropped along with their subtree.
                        continue;
                    };

                    let level = frame.level;
                    match item.first {
                        Some(child) => stack.push(Frame {
                            level: level + 1,
                            next: Some(child),
                            collected: Vec::new(),
                            parent: Some((title, page)),
                        }),
                        None => frame.collected.push(Bookmark::new(title, page, level)),
                    }
                }
                None => {
                    let Some(done) = stack.pop() else {
                        return Vec::new();
                    };
                    let Some((title, page)) = done.parent else {
                        return done.collected;
                    };
                    let mut bookmark = Bookmark::new(title, page, done.level - 1);
                    bookmark.children = done.collected;
                    if let Some(owner) = stack.last_mut() {
                        owner.collected.push(bookmark);
                    }
                }
            }
        }
    }
}
