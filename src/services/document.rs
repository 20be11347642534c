//! Document access layer.
//!
//! Analyzers and splitters only see the [`DocumentSource`] trait. [`PdfDocument`]
//! implements it on top of `lopdf`.

use crate::error::{PdfSplitterError, Result};
use crate::types::{DocumentMetadata, Position, TextSpan};
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Identity of an indirect object inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: u32,
    pub generation: u16,
}

impl From<ObjectId> for ObjectRef {
    fn from((id, generation): ObjectId) -> Self {
        Self { id, generation }
    }
}

impl From<ObjectRef> for ObjectId {
    fn from(object: ObjectRef) -> Self {
        (object.id, object.generation)
    }
}

/// Where an outline node points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Explicit destination array whose first element is a page reference.
    Page(ObjectRef),
    /// `GoTo` action wrapping an explicit destination.
    GoTo(ObjectRef),
    Unresolved,
}

impl Destination {
    pub fn target(&self) -> Option<ObjectRef> {
        match self {
            Self::Page(target) | Self::GoTo(target) => Some(*target),
            Self::Unresolved => None,
        }
    }
}

/// Raw view of one outline node. Links may form cycles in malformed files.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    pub title: Option<Vec<u8>>,
    pub destination: Destination,
    pub first: Option<ObjectRef>,
    pub next: Option<ObjectRef>,
}

/// Read access to a paginated document plus page export.
///
/// Page numbers are 1-based throughout.
pub trait DocumentSource {
    /// Path or URL the document was loaded from.
    fn source_path(&self) -> &str;

    fn page_count(&self) -> usize;

    fn metadata(&self) -> DocumentMetadata;

    /// First top-level node of the outline, if the document has one.
    fn outline_first(&self) -> Option<ObjectRef>;

    fn outline_item(&self, node: ObjectRef) -> Option<OutlineItem>;

    /// Page object identities in page order.
    fn page_refs(&self) -> Vec<ObjectRef>;

    /// Follows one level of indirection if `object` is itself a reference.
    fn dereference(&self, object: ObjectRef) -> Option<ObjectRef>;

    /// Best-effort plain text of a page.
    fn page_text(&self, page: usize) -> Option<String>;

    /// Styled text runs of a page, in content-stream order.
    fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>>;

    /// Writes a new document holding exactly `pages` to `output`.
    fn export_pages(&self, pages: &[usize], output: &Path, preserve_metadata: bool) -> Result<()>;

    fn has_outline(&self) -> bool {
        self.outline_first().is_some()
    }
}

const COPIED_INFO_KEYS: [&[u8]; 4] = [b"Title", b"Author", b"Creator", b"Producer"];

/// Gap in a `TJ` array (thousandths of an em) wide enough to read as a space.
const TJ_SPACE_THRESHOLD: f64 = -200.0;

/// A PDF loaded into memory through lopdf.
pub struct PdfDocument {
    source_path: String,
    file_size: u64,
    inner: lopdf::Document,
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("source_path", &self.source_path)
            .field("pages", &self.page_ids.len())
            .finish()
    }
}

impl PdfDocument {
    pub fn from_bytes(bytes: &[u8], source_path: impl Into<String>) -> Result<Self> {
        let source_path = source_path.into();
        let inner = lopdf::Document::load_mem(bytes).map_err(|e| PdfSplitterError::InvalidPdf {
            reason: format!("{}: {}", source_path, e),
        })?;

        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        info!("Loaded PDF {} with {} pages", source_path, page_ids.len());

        Ok(Self {
            source_path,
            file_size: bytes.len() as u64,
            inner,
            page_ids,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PdfSplitterError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, path.display().to_string())
    }

    fn page_id(&self, page: usize) -> Option<ObjectId> {
        page.checked_sub(1).and_then(|idx| self.page_ids.get(idx)).copied()
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.inner.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    fn catalog(&self) -> Option<&Dictionary> {
        let root = self.inner.trailer.get(b"Root").ok()?;
        self.resolve(root).as_dict().ok()
    }

    fn info_dictionary(&self) -> Option<&Dictionary> {
        let info = self.inner.trailer.get(b"Info").ok()?;
        self.resolve(info).as_dict().ok()
    }

    fn info_string(&self, key: &[u8]) -> Option<String> {
        let value = self.resolve(self.info_dictionary()?.get(key).ok()?);
        match value {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }

    fn destination_of(&self, node: &Dictionary) -> Destination {
        if let Ok(dest) = node.get(b"Dest") {
            return match self.first_page_ref(dest) {
                Some(target) => Destination::Page(target),
                None => Destination::Unresolved,
            };
        }

        let action = match node.get(b"A").map(|a| self.resolve(a)) {
            Ok(Object::Dictionary(action)) => action,
            _ => return Destination::Unresolved,
        };
        let is_goto = matches!(action.get(b"S"), Ok(Object::Name(name)) if name.as_slice() == b"GoTo");
        if !is_goto {
            return Destination::Unresolved;
        }
        action
            .get(b"D")
            .ok()
            .and_then(|dest| self.first_page_ref(dest))
            .map(Destination::GoTo)
            .unwrap_or(Destination::Unresolved)
    }

    fn first_page_ref(&self, dest: &Object) -> Option<ObjectRef> {
        match self.resolve(dest) {
            Object::Array(items) => match items.first()? {
                Object::Reference(id) => Some(ObjectRef::from(*id)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl DocumentSource for PdfDocument {
    fn source_path(&self) -> &str {
        &self.source_path
    }

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn metadata(&self) -> DocumentMetadata {
        let unknown = || "Unknown".to_string();
        DocumentMetadata {
            pages: self.page_count(),
            title: self.info_string(b"Title").unwrap_or_else(unknown),
            author: self.info_string(b"Author").unwrap_or_else(unknown),
            creator: self.info_string(b"Creator").unwrap_or_else(unknown),
            producer: self.info_string(b"Producer").unwrap_or_else(unknown),
            pdf_version: self.inner.version.clone(),
            file_size: self.file_size,
            creation_date: self.info_string(b"CreationDate"),
            modification_date: self.info_string(b"ModDate"),
        }
    }

    fn outline_first(&self) -> Option<ObjectRef> {
        let outlines = self.resolve(self.catalog()?.get(b"Outlines").ok()?);
        match outlines.as_dict().ok()?.get(b"First").ok()? {
            Object::Reference(id) => Some(ObjectRef::from(*id)),
            _ => None,
        }
    }

    fn outline_item(&self, node: ObjectRef) -> Option<OutlineItem> {
        let dict = self.inner.get_object(node.into()).ok()?.as_dict().ok()?;
        let link = |key: &[u8]| match dict.get(key) {
            Ok(Object::Reference(id)) => Some(ObjectRef::from(*id)),
            _ => None,
        };

        let title = match dict.get(b"Title").map(|t| self.resolve(t)) {
            Ok(Object::String(bytes, _)) => Some(bytes.clone()),
            _ => None,
        };

        Some(OutlineItem {
            title,
            destination: self.destination_of(dict),
            first: link(b"First"),
            next: link(b"Next"),
        })
    }

    fn page_refs(&self) -> Vec<ObjectRef> {
        self.page_ids.iter().copied().map(ObjectRef::from).collect()
    }

    fn dereference(&self, object: ObjectRef) -> Option<ObjectRef> {
        match self.inner.get_object(object.into()).ok()? {
            Object::Reference(id) => Some(ObjectRef::from(*id)),
            _ => None,
        }
    }

    fn page_text(&self, page: usize) -> Option<String> {
        let page_number = u32::try_from(page).ok()?;
        self.page_id(page)?;
        match self.inner.extract_text(&[page_number]) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Text extraction failed for page {}: {}", page, e);
                None
            }
        }
    }

    fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page).ok_or_else(|| PdfSplitterError::InvalidPdf {
            reason: format!("page {} does not exist", page),
        })?;
        let bytes = self
            .inner
            .get_page_content(page_id)
            .map_err(|e| PdfSplitterError::InvalidPdf {
                reason: format!("cannot read content of page {}: {}", page, e),
            })?;
        let content = Content::decode(&bytes).map_err(|e| PdfSplitterError::InvalidPdf {
            reason: format!("cannot decode content of page {}: {}", page, e),
        })?;

        Ok(collect_spans(&content))
    }

    fn export_pages(&self, pages: &[usize], output: &Path, preserve_metadata: bool) -> Result<()> {
        let total = self.page_count();
        if pages.is_empty() {
            return Err(PdfSplitterError::Export {
                reason: "no pages selected".to_string(),
            });
        }
        if let Some(bad) = pages.iter().find(|&&p| p == 0 || p > total) {
            return Err(PdfSplitterError::Export {
                reason: format!("page {} is outside 1-{}", bad, total),
            });
        }

        // Pages keep source order; every caller passes ascending ranges.
        let keep: HashSet<usize> = pages.iter().copied().collect();
        let drop: Vec<u32> = (1..=total)
            .filter(|p| !keep.contains(p))
            .filter_map(|p| u32::try_from(p).ok())
            .collect();

        let mut copy = self.inner.clone();
        if !drop.is_empty() {
            copy.delete_pages(&drop);
        }
        remove_outline(&mut copy);
        retain_info(&mut copy, preserve_metadata);
        copy.prune_objects();

        copy.save(output).map_err(|e| PdfSplitterError::Export {
            reason: format!("cannot write {}: {}", output.display(), e),
        })?;
        debug!("Exported {} pages to {}", pages.len(), output.display());
        Ok(())
    }
}

/// Outline entries would point at deleted pages in an exported subset.
fn remove_outline(doc: &mut lopdf::Document) {
    let root = match doc.trailer.get(b"Root").and_then(Object::as_reference) {
        Ok(root) => root,
        Err(_) => return,
    };
    if let Ok(catalog) = doc.get_object_mut(root).and_then(Object::as_dict_mut) {
        catalog.remove(b"Outlines");
    }
}

fn retain_info(doc: &mut lopdf::Document, preserve: bool) {
    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| match info {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|info| info.as_dict().ok())
        .cloned();
    doc.trailer.remove(b"Info");

    let Some(info) = info.filter(|_| preserve) else {
        return;
    };
    let mut copied = Dictionary::new();
    for key in COPIED_INFO_KEYS {
        if let Ok(value) = info.get(key) {
            copied.set(key.to_vec(), value.clone());
        }
    }
    if !copied.is_empty() {
        let id = doc.add_object(copied);
        doc.trailer.set("Info", id);
    }
}

/// Decodes a PDF text string: UTF-16BE with BOM, else UTF-8, else Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(units) = utf16_units(bytes) {
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Strict variant of [`decode_pdf_string`]; `None` when UTF-16 data is malformed.
pub fn try_decode_pdf_string(bytes: &[u8]) -> Option<String> {
    if let Some(units) = utf16_units(bytes) {
        return String::from_utf16(&units).ok();
    }
    Some(decode_pdf_string(bytes))
}

fn utf16_units(bytes: &[u8]) -> Option<Vec<u16>> {
    let body = bytes.strip_prefix(&[0xFE, 0xFF])?;
    Some(
        body.chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect(),
    )
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Text state tracked while walking a content stream.
#[derive(Default)]
struct SpanBuilder {
    font_size: Option<f64>,
    scale: f64,
    x: f64,
    y: f64,
    text: String,
    spans: Vec<TextSpan>,
}

impl SpanBuilder {
    fn begin_text(&mut self) {
        self.flush();
        self.scale = 1.0;
        self.x = 0.0;
        self.y = 0.0;
    }

    fn flush(&mut self) {
        let text = self.text.trim();
        if !text.is_empty() {
            let font_size = self
                .font_size
                .map(|size| size * if self.scale > 0.0 { self.scale } else { 1.0 });
            self.spans.push(TextSpan {
                text: text.to_string(),
                font_size,
                position: Some(Position {
                    x: self.x,
                    y: self.y,
                }),
            });
        }
        self.text.clear();
    }

    fn show(&mut self, operand: &Object) {
        match operand {
            Object::String(bytes, _) => self.text.push_str(&decode_pdf_string(bytes)),
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => self.text.push_str(&decode_pdf_string(bytes)),
                        other => {
                            if number(other).is_some_and(|gap| gap < TJ_SPACE_THRESHOLD) {
                                self.text.push(' ');
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn collect_spans(content: &Content) -> Vec<TextSpan> {
    let mut builder = SpanBuilder {
        scale: 1.0,
        ..SpanBuilder::default()
    };

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => builder.begin_text(),
            "ET" => builder.flush(),
            "Tf" => {
                builder.flush();
                builder.font_size = operands.get(1).and_then(number);
            }
            "Td" | "TD" => {
                builder.flush();
                builder.x += operands.first().and_then(number).unwrap_or(0.0);
                builder.y += operands.get(1).and_then(number).unwrap_or(0.0);
            }
            "Tm" => {
                builder.flush();
                let values: Vec<f64> = operands.iter().filter_map(number).collect();
                if values.len() == 6 {
                    builder.scale = values[0].abs();
                    builder.x = values[4];
                    builder.y = values[5];
                }
            }
            "T*" => builder.flush(),
            "Tj" | "TJ" => {
                for operand in operands {
                    builder.show(operand);
                }
            }
            "'" | "\"" => {
                builder.flush();
                if let Some(text) = operands.last() {
                    builder.show(text);
                }
            }
            _ => {}
        }
    }

    builder.flush();
    builder.spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    #[test]
    fn test_decode_pdf_string_variants() {
        assert_eq!(decode_pdf_string(b"Chapter 1"), "Chapter 1");
        assert_eq!(
            decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]),
            "Hi"
        );
        assert_eq!(decode_pdf_string(&[0x43, 0xE9]), "Cé");
    }

    #[test]
    fn test_try_decode_rejects_broken_utf16() {
        // Lone high surrogate.
        assert_eq!(try_decode_pdf_string(&[0xFE, 0xFF, 0xD8, 0x00]), None);
        assert_eq!(try_decode_pdf_string(b"Intro").as_deref(), Some("Intro"));
    }

    #[test]
    fn test_collect_spans_tracks_font_size_and_position() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 18.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("CHAPTER 1")]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 11.into()]),
                Operation::new("Td", vec![0.into(), (-20).into()]),
                Operation::new(
                    "TJ",
                    vec![Object::Array(vec![
                        Object::string_literal("Body"),
                        (-300).into(),
                        Object::string_literal("text"),
                    ])],
                ),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = collect_spans(&content);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "CHAPTER 1");
        assert_eq!(spans[0].font_size, Some(18.0));
        assert_eq!(spans[0].position, Some(Position { x: 72.0, y: 700.0 }));
        assert_eq!(spans[1].text, "Body text");
        assert_eq!(spans[1].font_size, Some(11.0));
        assert_eq!(spans[1].position, Some(Position { x: 72.0, y: 680.0 }));
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 1.into()]),
                Operation::new(
                    "Tm",
                    vec![
                        16.into(),
                        0.into(),
                        0.into(),
                        16.into(),
                        50.into(),
                        500.into(),
                    ],
                ),
                Operation::new("Tj", vec![Object::string_literal("Overview")]),
                Operation::new("ET", vec![]),
            ],
        };

        let spans = collect_spans(&content);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].font_size, Some(16.0));
    }

    #[test]
    fn test_open_missing_file() {
        let err = PdfDocument::open("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, PdfSplitterError::FileNotFound { .. }));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = PdfDocument::from_bytes(b"not a pdf", "garbage.pdf").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
