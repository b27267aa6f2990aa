//! Sequential page-by-page text extraction.

use tracing::{debug, warn};

use super::{FileBlob, LopdfEngine, PdfDocument, PdfEngine};
use crate::error::ExtractError;

/// Separator placed between the texts of consecutive pages.
pub const DEFAULT_PAGE_SEPARATOR: &str = "\n\n";

/// Turns an uploaded PDF into a single string of readable text.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor<E = LopdfEngine> {
    engine: E,
    page_separator: String,
}

impl PdfTextExtractor<LopdfEngine> {
    /// Create an extractor backed by lopdf.
    pub fn new() -> Self {
        Self::with_engine(LopdfEngine::new())
    }
}

impl Default for PdfTextExtractor<LopdfEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PdfEngine> PdfTextExtractor<E> {
    /// Create an extractor over a specific parsing engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
        }
    }

    /// Set the separator placed between pages.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Validate, read and extract text from an uploaded file.
    pub async fn extract<F: FileBlob + ?Sized>(&self, file: &F) -> Result<String, ExtractError> {
        let data = read_pdf_blob(file).await?;
        debug!("Read {} bytes from {}", data.len(), file.name());
        self.extract_bytes(&data)
    }

    /// Extract text from PDF bytes already in memory.
    ///
    /// Pages are visited in increasing order and the first failing page
    /// stops extraction.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<String, ExtractError> {
        let document = self.engine.open(data).map_err(|e| {
            warn!("PDF engine failed to open document: {}", e);
            ExtractError::Processing(e)
        })?;

        let page_count = document
            .page_count()
            .ok_or(ExtractError::MalformedDocument)?;
        debug!("Extracting text from {} pages", page_count);

        let mut page_texts = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            page_texts.push(page_text(&document, page)?);
        }

        let full_text = page_texts.join(&self.page_separator).trim().to_string();
        if full_text.is_empty() {
            return Err(ExtractError::NoText);
        }

        debug!("Extracted {} characters", full_text.len());
        Ok(full_text)
    }
}

async fn read_pdf_blob<F: FileBlob + ?Sized>(file: &F) -> Result<Vec<u8>, ExtractError> {
    if file.size() == 0 && file.media_type().is_empty() {
        return Err(ExtractError::InvalidInput);
    }
    if !file.media_type().contains("pdf") {
        return Err(ExtractError::NotPdf);
    }

    file.read_bytes().await.map_err(ExtractError::Read)
}

fn page_text<D: PdfDocument>(document: &D, page: u32) -> Result<String, ExtractError> {
    let items = document
        .page_text_items(page)
        .map_err(|source| ExtractError::Page { page, source })?;

    if items.is_empty() {
        return Err(ExtractError::EmptyPage { page });
    }

    let text = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    debug!("Page {}: {} items, {} chars", page, items.len(), text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractErrorKind, PdfError};
    use crate::pdf::testing::{pdf_with_content, pdf_with_pages, text_object};
    use crate::pdf::InMemoryFile;
    use pretty_assertions::assert_eq;
    use std::future::Future;

    /// Engine serving canned pages, ignoring the input bytes.
    struct FakeEngine {
        pages: Option<Vec<std::result::Result<Vec<&'static str>, &'static str>>>,
        open_error: bool,
    }

    struct FakeDocument {
        pages: Option<Vec<std::result::Result<Vec<&'static str>, &'static str>>>,
    }

    impl PdfEngine for FakeEngine {
        type Document = FakeDocument;

        fn open(&self, _data: &[u8]) -> crate::pdf::Result<FakeDocument> {
            if self.open_error {
                return Err(PdfError::Parse("unexpected EOF".to_string()));
            }
            Ok(FakeDocument {
                pages: self.pages.clone(),
            })
        }
    }

    impl PdfDocument for FakeDocument {
        fn page_count(&self) -> Option<u32> {
            self.pages.as_ref().map(|p| p.len() as u32)
        }

        fn page_text_items(&self, page: u32) -> crate::pdf::Result<Vec<String>> {
            match &self.pages.as_ref().unwrap()[page as usize - 1] {
                Ok(items) => Ok(items.iter().map(|s| s.to_string()).collect()),
                Err(msg) => Err(PdfError::TextExtraction(msg.to_string())),
            }
        }
    }

    fn fake(pages: Vec<std::result::Result<Vec<&'static str>, &'static str>>) -> PdfTextExtractor<FakeEngine> {
        PdfTextExtractor::with_engine(FakeEngine {
            pages: Some(pages),
            open_error: false,
        })
    }

    struct UnreadableFile;

    impl FileBlob for UnreadableFile {
        fn name(&self) -> &str {
            "broken.pdf"
        }

        fn media_type(&self) -> &str {
            "application/pdf"
        }

        fn size(&self) -> u64 {
            10
        }

        fn read_bytes(&self) -> impl Future<Output = std::io::Result<Vec<u8>>> {
            async { Err(std::io::Error::other("disk went away")) }
        }
    }

    #[test]
    fn test_pages_joined_with_blank_line() {
        let extractor = fake(vec![
            Ok(vec!["  The quick ", "brown", "   ", "fox "]),
            Ok(vec!["jumps"]),
            Ok(vec![" over the", "lazy dog  "]),
        ]);

        let text = extractor.extract_bytes(b"%PDF-").unwrap();
        assert_eq!(text, "The quick brown fox\n\njumps\n\nover the lazy dog");
    }

    #[test]
    fn test_empty_page_fails_with_page_number() {
        let extractor = fake(vec![Ok(vec!["intro"]), Ok(vec!["more"]), Ok(vec![])]);

        let err = extractor.extract_bytes(b"%PDF-").unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::PageExtraction(3));
        assert_eq!(err.to_string(), "Page 3 contains no readable text");
    }

    #[test]
    fn test_page_failure_is_wrapped() {
        let extractor = fake(vec![Ok(vec!["fine"]), Err("broken stream")]);

        let err = extractor.extract_bytes(b"%PDF-").unwrap_err();
        assert!(matches!(err, ExtractError::Page { page: 2, .. }));
        assert_eq!(err.to_string(), "Failed to extract text from page 2");
    }

    #[test]
    fn test_whitespace_only_document_has_no_text() {
        let extractor = fake(vec![Ok(vec!["  "]), Ok(vec!["\t"])]);
        let err = extractor.extract_bytes(b"%PDF-").unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::NoText);

        let extractor = fake(vec![]);
        let err = extractor.extract_bytes(b"%PDF-").unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::NoText);
    }

    #[test]
    fn test_missing_page_tree_is_malformed() {
        let extractor = PdfTextExtractor::with_engine(FakeEngine {
            pages: None,
            open_error: false,
        });
        let err = extractor.extract_bytes(b"%PDF-").unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::MalformedDocument);
    }

    #[test]
    fn test_open_failure_is_generic_processing_error() {
        let extractor = PdfTextExtractor::with_engine(FakeEngine {
            pages: None,
            open_error: true,
        });
        let err = extractor.extract_bytes(b"junk").unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::Processing);
        assert_eq!(err.to_string(), "Failed to process PDF file");
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_media_type() {
        let extractor = PdfTextExtractor::new();
        let file = InMemoryFile::new("notes.txt", "text/plain", b"hello".to_vec());

        let err = extractor.extract(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "File must be a PDF document");
    }

    #[tokio::test]
    async fn test_rejects_empty_untyped_blob() {
        let extractor = PdfTextExtractor::new();
        let file = InMemoryFile::new("", "", Vec::new());

        let err = extractor.extract(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid file provided");
    }

    #[tokio::test]
    async fn test_read_failure_wraps_cause() {
        let extractor = PdfTextExtractor::new();

        let err = extractor.extract(&UnreadableFile).await.unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::Read);
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "disk went away");
    }

    #[tokio::test]
    async fn test_extracts_two_page_sample() {
        let data = pdf_with_pages(&[&["Hello"], &["World"]]);
        let file = InMemoryFile::pdf("sample.pdf", data);

        let text = PdfTextExtractor::new().extract(&file).await.unwrap();
        assert_eq!(text, "Hello\n\nWorld");
    }

    #[test]
    fn test_lines_in_one_text_object_are_space_separated() {
        let data = pdf_with_content(vec![text_object(&["Hello", "World"]), text_object(&["Again"])]);

        let text = PdfTextExtractor::new().extract_bytes(&data).unwrap();
        assert_eq!(text, "Hello World\n\nAgain");
    }

    #[tokio::test]
    async fn test_real_pdf_with_blank_page_names_page() {
        let data = pdf_with_pages(&[&["Chapter one"], &[], &["Chapter two"]]);
        let file = InMemoryFile::pdf("gap.pdf", data);

        let err = PdfTextExtractor::new().extract(&file).await.unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::PageExtraction(2));
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_processing_failure() {
        let file = InMemoryFile::pdf("fake.pdf", b"not really a pdf".to_vec());

        let err = PdfTextExtractor::new().extract(&file).await.unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::Processing);
    }

    #[test]
    fn test_custom_separator() {
        let extractor = fake(vec![Ok(vec!["a"]), Ok(vec!["b"])]).with_page_separator("\n---\n");
        assert_eq!(extractor.extract_bytes(b"%PDF-").unwrap(), "a\n---\nb");
    }
}
