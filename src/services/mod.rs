pub mod document;
pub mod fetcher;
pub mod manifest;
pub mod namer;

pub use document::{Destination, DocumentSource, ObjectRef, OutlineItem, PdfDocument};
pub use fetcher::ContentFetcher;
pub use manifest::write_manifest;
pub use namer::FileNamer;
