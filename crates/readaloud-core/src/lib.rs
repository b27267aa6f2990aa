//! Core library for reading PDF documents aloud.
//!
//! This crate provides:
//! - PDF text extraction, page by page, with typed failures
//! - The upload boundary (single PDF under a size ceiling)
//! - A speech engine abstraction with thin wrapper operations
//! - The reader screen state machine tying uploads and playback together
//! - Presentational view models for front ends

pub mod error;
pub mod models;
pub mod pdf;
pub mod session;
pub mod speech;
pub mod upload;
pub mod view;

pub use error::{ExtractError, ExtractErrorKind, PdfError, ReaderError, Result, SpeechError, UploadRejection};
pub use models::config::ReaderConfig;
pub use pdf::{FileBlob, InMemoryFile, LocalFile, LopdfEngine, PdfDocument, PdfEngine, PdfTextExtractor};
pub use session::{Phase, Playback, ReaderScreen, ReaderState, UploadTicket};
pub use speech::{SpeechEngine, SpeechEvent, SpeechEventKind, Utterance, UtteranceId};
pub use upload::UploadPolicy;
pub use view::ScreenView;
