//! PDF processing module.

mod blob;
mod engine;
mod extractor;

pub use blob::{FileBlob, InMemoryFile, LocalFile, PDF_MEDIA_TYPE};
pub use engine::{LopdfDocument, LopdfEngine};
pub use extractor::{PdfTextExtractor, DEFAULT_PAGE_SEPARATOR};

use crate::error::PdfError;

/// Result type for PDF engine operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A PDF parsing engine that can open documents from memory.
pub trait PdfEngine {
    /// Document type produced by this engine.
    type Document: PdfDocument;

    /// Open a document from raw bytes.
    fn open(&self, data: &[u8]) -> Result<Self::Document>;
}

/// An opened PDF document.
pub trait PdfDocument {
    /// Number of pages, or `None` if the document has no page tree.
    fn page_count(&self) -> Option<u32>;

    /// Text items on a page (1-indexed), in content order.
    ///
    /// An empty vector means the page carries no text at all.
    fn page_text_items(&self, page: u32) -> Result<Vec<String>>;
}
