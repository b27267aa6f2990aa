//! Error types for the readaloud-core library.

use thiserror::Error;

/// Main error type for the readaloud library.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Text extraction error.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Speech engine error.
    #[error(transparent)]
    Speech(#[from] SpeechError),

    /// File was refused at the upload boundary.
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task did not run to completion.
    #[error("task failed: {0}")]
    Task(String),
}

/// Errors raised by the PDF parsing engine itself.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The parser panicked while handling the document.
    #[error("parser aborted: {0}")]
    Aborted(String),
}

/// Errors produced while turning an uploaded file into text.
///
/// The `Display` text of every variant is meant to be shown to the user as is.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The blob is not a usable file.
    #[error("Invalid file provided")]
    InvalidInput,

    /// The blob does not declare a PDF media type.
    #[error("File must be a PDF document")]
    NotPdf,

    /// Reading the blob into memory failed.
    #[error("Failed to read PDF file")]
    Read(#[source] std::io::Error),

    /// The document opened but exposes no usable page tree.
    #[error("Invalid PDF document structure")]
    MalformedDocument,

    /// A page produced no text items at all.
    #[error("Page {page} contains no readable text")]
    EmptyPage { page: u32 },

    /// Any other failure while reading one page.
    #[error("Failed to extract text from page {page}")]
    Page {
        page: u32,
        #[source]
        source: PdfError,
    },

    /// All pages together produced nothing but whitespace.
    #[error("No readable text found in the PDF")]
    NoText,

    /// Catch-all for engine failures outside a specific page.
    #[error("Failed to process PDF file")]
    Processing(#[source] PdfError),
}

/// Failure category of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractErrorKind {
    InvalidInput,
    Read,
    MalformedDocument,
    /// Carries the 1-based page number.
    PageExtraction(u32),
    NoText,
    Processing,
}

impl ExtractError {
    /// Get the failure category.
    pub fn kind(&self) -> ExtractErrorKind {
        match self {
            Self::InvalidInput | Self::NotPdf => ExtractErrorKind::InvalidInput,
            Self::Read(_) => ExtractErrorKind::Read,
            Self::MalformedDocument => ExtractErrorKind::MalformedDocument,
            Self::EmptyPage { page } | Self::Page { page, .. } => {
                ExtractErrorKind::PageExtraction(*page)
            }
            Self::NoText => ExtractErrorKind::NoText,
            Self::Processing(_) => ExtractErrorKind::Processing,
        }
    }
}

/// Errors related to the speech engine.
#[derive(Error, Debug)]
pub enum SpeechError {
    /// No speech engine is available on this platform.
    #[error("Speech synthesis is not supported on this platform")]
    NotSupported,

    /// The engine refused or failed an operation.
    #[error("speech engine error: {0}")]
    Engine(String),
}

/// Reasons a file is refused at the upload boundary.
///
/// These are shown to the user as a blocking notification rather than
/// through the error banner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    /// The file exceeds the size ceiling.
    #[error("File is too large. Please upload a PDF smaller than {limit_mb}MB.")]
    TooLarge { size: u64, limit_mb: u64 },

    /// The file does not have a PDF media type.
    #[error("Please upload a valid PDF file.")]
    WrongType { media_type: String },

    /// More than one file was dropped at once.
    #[error("Please upload a single PDF file.")]
    TooManyFiles { count: usize },
}

/// Result type for the readaloud library.
pub type Result<T> = std::result::Result<T, ReaderError>;
