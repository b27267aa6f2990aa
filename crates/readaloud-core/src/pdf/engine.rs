//! PDF parsing engine backed by lopdf.
//!
//! lopdf never executes document scripts and never fetches remote fonts or
//! workers, so the engine runs with safe defaults without extra options.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PdfDocument, PdfEngine, Result};
use crate::error::PdfError;

/// PDF engine using lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }
}

/// A document opened by [`LopdfEngine`].
pub struct LopdfDocument {
    document: Document,
    pages: BTreeMap<u32, ObjectId>,
    has_page_tree: bool,
}

impl PdfEngine for LopdfEngine {
    type Document = LopdfDocument;

    fn open(&self, data: &[u8]) -> Result<LopdfDocument> {
        let mut document = guard(|| Document::load_mem(data))?
            .map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let has_page_tree = document
            .catalog()
            .map(|catalog| catalog.get(b"Pages").is_ok())
            .unwrap_or(false);
        let pages = guard(|| document.get_pages())?;

        debug!("Loaded PDF with {} pages", pages.len());
        Ok(LopdfDocument {
            document,
            pages,
            has_page_tree,
        })
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> Option<u32> {
        if !self.has_page_tree {
            return None;
        }
        u32::try_from(self.pages.len()).ok()
    }

    fn page_text_items(&self, page: u32) -> Result<Vec<String>> {
        let Some(&page_id) = self.pages.get(&page) else {
            return Err(PdfError::InvalidPage(page));
        };

        let items = guard(|| self.show_text_items(page_id))??;
        trace!("Page {} yielded {} text items", page, items.len());
        Ok(items)
    }
}

impl LopdfDocument {
    /// One item per text-showing operator (`Tj`, `TJ`, `'`, `"`) in
    /// content order, decoded through the font selected by the last `Tf`.
    fn show_text_items(&self, page_id: ObjectId) -> Result<Vec<String>> {
        let fonts = self
            .document
            .get_page_fonts(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let encodings: BTreeMap<Vec<u8>, Encoding> = fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(&self.document) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    warn!("Skipping font {}: {}", String::from_utf8_lossy(&name), e);
                    None
                }
            })
            .collect();

        let data = self
            .document
            .get_page_content(page_id)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        let content =
            Content::decode(&data).map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let mut items = Vec::new();
        let mut encoding = None;
        for operation in &content.operations {
            let shown = match operation.operator.as_str() {
                "Tf" => {
                    encoding = operation
                        .operands
                        .first()
                        .and_then(|font| font.as_name().ok())
                        .and_then(|font| encodings.get(font));
                    continue;
                }
                "Tj" | "TJ" | "'" => operation.operands.first(),
                "\"" => operation.operands.get(2),
                _ => continue,
            };
            let Some(shown) = shown else {
                continue;
            };
            let Some(encoding) = encoding else {
                debug!("Text shown without a usable font, skipping");
                continue;
            };

            let mut text = String::new();
            decode_shown(encoding, shown, &mut text)?;
            items.push(text);
        }
        Ok(items)
    }
}

/// Decode a string operand, or a `TJ` array where large negative
/// adjustments stand for word gaps.
fn decode_shown(encoding: &Encoding, operand: &Object, text: &mut String) -> Result<()> {
    match operand {
        Object::String(bytes, _) => {
            let decoded = Document::decode_text(encoding, bytes)
                .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
            text.push_str(&decoded);
        }
        Object::Array(parts) => {
            for part in parts {
                decode_shown(encoding, part, text)?;
            }
        }
        Object::Integer(gap) if *gap < -100 => text.push(' '),
        Object::Real(gap) if *gap < -100.0 => text.push(' '),
        _ => {}
    }
    Ok(())
}

/// Run a parser call, turning a panic inside lopdf into an error.
fn guard<T>(f: impl FnOnce() -> T) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PdfError::Aborted(reason)
    })
}
