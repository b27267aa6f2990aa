//! Explicit reader state.

use crate::speech::{Utterance, UtteranceId};

/// Playback of the extracted text.
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    /// No live utterance.
    Stopped,
    /// The utterance is being spoken.
    Speaking(Utterance),
    /// The utterance was paused and is still held by the engine.
    Paused(Utterance),
}

impl Playback {
    /// The live utterance, if any.
    pub fn utterance(&self) -> Option<&Utterance> {
        match self {
            Self::Stopped => None,
            Self::Speaking(u) | Self::Paused(u) => Some(u),
        }
    }

    pub(crate) fn utterance_mut(&mut self) -> Option<&mut Utterance> {
        match self {
            Self::Stopped => None,
            Self::Speaking(u) | Self::Paused(u) => Some(u),
        }
    }

    pub fn utterance_id(&self) -> Option<UtteranceId> {
        self.utterance().map(Utterance::id)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, Self::Speaking(_))
    }
}

/// Where the reader is in its lifecycle.
///
/// Processing and speaking cannot be true at the same time: a document is
/// either being extracted or its text is ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderState {
    /// No text and nothing in flight.
    Idle,
    /// An accepted upload is being extracted.
    Processing,
    /// Text is available.
    Ready { text: String, playback: Playback },
}

/// Coarse label for [`ReaderState`], handy for logs and views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Processing,
    ReadyIdle,
    ReadySpeaking,
}

impl ReaderState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Processing => Phase::Processing,
            Self::Ready { playback, .. } if playback.is_speaking() => Phase::ReadySpeaking,
            Self::Ready { .. } => Phase::ReadyIdle,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ready { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn playback(&self) -> Option<&Playback> {
        match self {
            Self::Ready { playback, .. } => Some(playback),
            _ => None,
        }
    }
}
