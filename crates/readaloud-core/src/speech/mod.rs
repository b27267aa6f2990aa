//! Speech engine abstraction and thin wrappers around it.
//!
//! The platform speech engine is a single shared resource with one queue.
//! Front ends inject their engine through [`SpeechEngine`]; completion and
//! failure of an utterance are reported back as [`SpeechEvent`]s.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::error::SpeechError;

static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one utterance for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UtteranceId(u64);

impl UtteranceId {
    fn next() -> Self {
        Self(NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A one-shot speakable unit of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    id: UtteranceId,
    text: String,
    volume: f32,
}

impl Utterance {
    pub fn id(&self) -> UtteranceId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

/// What happened to an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEventKind {
    /// Playback reached the end.
    Ended,
    /// The engine reported a playback error.
    Failed(String),
}

/// Completion notice delivered by an engine for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechEvent {
    pub utterance: UtteranceId,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn ended(utterance: UtteranceId) -> Self {
        Self {
            utterance,
            kind: SpeechEventKind::Ended,
        }
    }

    pub fn failed(utterance: UtteranceId, reason: impl Into<String>) -> Self {
        Self {
            utterance,
            kind: SpeechEventKind::Failed(reason.into()),
        }
    }
}

/// The platform speech engine.
///
/// Implementations report completion asynchronously as [`SpeechEvent`]s
/// through whatever channel they were built with.
pub trait SpeechEngine {
    /// Whether speech synthesis is available at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Queue an utterance for playback.
    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Drop everything queued or speaking.
    fn cancel(&self) -> Result<(), SpeechError>;

    fn pause(&self) -> Result<(), SpeechError>;

    fn resume(&self) -> Result<(), SpeechError>;

    /// Change the volume of a live utterance. Engines may apply it only to
    /// the next utterance.
    fn set_volume(&self, utterance: UtteranceId, volume: f32) -> Result<(), SpeechError>;
}

/// Build an utterance over `text` at `volume`.
///
/// The volume is taken as is; the slider clamps it.
pub fn create_utterance<E: SpeechEngine + ?Sized>(
    engine: &E,
    text: &str,
    volume: f32,
) -> Result<Utterance, SpeechError> {
    if !engine.is_supported() {
        return Err(SpeechError::NotSupported);
    }

    let utterance = Utterance {
        id: UtteranceId::next(),
        text: text.to_string(),
        volume,
    };
    debug!(
        "Created utterance {} ({} chars, volume {:.1})",
        utterance.id,
        utterance.text.len(),
        volume
    );
    Ok(utterance)
}

/// Cancel any queued or speaking utterance. No-op without an engine.
pub fn stop<E: SpeechEngine + ?Sized>(engine: &E) -> Result<(), SpeechError> {
    if !engine.is_supported() {
        return Ok(());
    }
    engine.cancel()
}

/// Pause playback. No-op without an engine.
pub fn pause<E: SpeechEngine + ?Sized>(engine: &E) -> Result<(), SpeechError> {
    if !engine.is_supported() {
        return Ok(());
    }
    engine.pause()
}

/// Resume paused playback. No-op without an engine.
pub fn resume<E: SpeechEngine + ?Sized>(engine: &E) -> Result<(), SpeechError> {
    if !engine.is_supported() {
        return Ok(());
    }
    engine.resume()
}
