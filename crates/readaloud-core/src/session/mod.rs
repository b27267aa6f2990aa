//! Reader screen: owns the session state and wires uploads and controls to
//! the extractor and the speech engine.

mod state;

pub use state::{Phase, Playback, ReaderState};

use tracing::{debug, error, info, warn};

use crate::error::{ReaderError, SpeechError};
use crate::pdf::{FileBlob, PdfEngine, PdfTextExtractor};
use crate::speech::{self, SpeechEngine, SpeechEvent, SpeechEventKind, UtteranceId};
use crate::view::AudioControls;

/// Shown when extraction fails with something other than an extraction error.
pub const UNEXPECTED_EXTRACTION_ERROR: &str =
    "An unexpected error occurred while processing the PDF";
/// Shown when playback could not start or failed while speaking.
pub const SPEECH_FAILED: &str = "Failed to start text-to-speech. Please try again.";
/// Shown when no speech engine is available.
pub const SPEECH_UNSUPPORTED: &str = "Text-to-speech is not supported on this platform";
pub const PAUSE_FAILED: &str = "Failed to pause speech";
pub const STOP_FAILED: &str = "Failed to stop speech";

/// Default playback volume.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Handle for one extraction started by [`ReaderScreen::begin_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket(u64);

/// Session state for a single reader.
///
/// Dropping the screen cancels any live utterance.
pub struct ReaderScreen<E: SpeechEngine> {
    engine: E,
    state: ReaderState,
    volume: f32,
    error: Option<String>,
    upload_seq: u64,
}

impl<E: SpeechEngine> ReaderScreen<E> {
    /// Create a screen at full volume.
    pub fn new(engine: E) -> Self {
        Self::with_volume(engine, DEFAULT_VOLUME)
    }

    /// Create a screen with a starting volume.
    pub fn with_volume(engine: E, volume: f32) -> Self {
        Self {
            engine,
            state: ReaderState::Idle,
            volume: AudioControls::clamp_volume(volume).unwrap_or(DEFAULT_VOLUME),
            error: None,
            upload_seq: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Extracted text, if any.
    pub fn text(&self) -> Option<&str> {
        self.state.text()
    }

    pub fn is_playing(&self) -> bool {
        self.state.phase() == Phase::ReadySpeaking
    }

    pub fn is_processing(&self) -> bool {
        self.state.phase() == Phase::Processing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Current error banner message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Utterance currently held by the screen (speaking or paused).
    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.state.playback().and_then(Playback::utterance_id)
    }

    /// Mark an accepted upload as being processed.
    ///
    /// Clears the error banner and any previous text and stops speech.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.error = None;
        if let Err(e) = speech::stop(&self.engine) {
            warn!("Failed to stop speech before upload: {}", e);
        }
        self.state = ReaderState::Processing;
        self.upload_seq += 1;
        debug!("Upload {} processing", self.upload_seq);
        UploadTicket(self.upload_seq)
    }

    /// Store the outcome of an extraction.
    ///
    /// Returns `false` if the ticket belongs to an upload that has since been
    /// superseded; its result is dropped.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, ReaderError>,
    ) -> bool {
        if ticket.0 != self.upload_seq || self.state != ReaderState::Processing {
            debug!("Ignoring result of superseded upload {}", ticket.0);
            return false;
        }

        match result {
            Ok(text) => {
                info!("Extracted {} characters", text.len());
                self.state = ReaderState::Ready {
                    text,
                    playback: Playback::Stopped,
                };
            }
            Err(e) => {
                error!("PDF processing error: {}", e);
                self.error = Some(match &e {
                    ReaderError::Extract(extract) => extract.to_string(),
                    _ => UNEXPECTED_EXTRACTION_ERROR.to_string(),
                });
                self.state = ReaderState::Idle;
            }
        }
        true
    }

    /// Run a whole upload: processing, extraction, result.
    pub async fn upload<P, F>(&mut self, extractor: &PdfTextExtractor<P>, file: &F) -> bool
    where
        P: PdfEngine,
        F: FileBlob + ?Sized,
    {
        let ticket = self.begin_upload();
        let result = extractor.extract(file).await.map_err(ReaderError::from);
        self.finish_upload(ticket, result)
    }

    /// Start speaking the extracted text from the beginning.
    ///
    /// Does nothing when there is no text.
    pub fn play(&mut self) {
        let ReaderState::Ready { text, playback } = &mut self.state else {
            debug!("Play ignored: no text");
            return;
        };
        if text.is_empty() {
            return;
        }

        // One queue per engine: clear whatever is still there first.
        if let Err(e) = speech::stop(&self.engine) {
            warn!("Failed to cancel previous utterance: {}", e);
        }
        *playback = Playback::Stopped;

        let utterance = match speech::create_utterance(&self.engine, text, self.volume) {
            Ok(utterance) => utterance,
            Err(e) => {
                error!("Speech synthesis error: {}", e);
                self.error = Some(speech_error_message(&e).to_string());
                return;
            }
        };

        if let Err(e) = self.engine.speak(&utterance) {
            error!("Speech synthesis error: {}", e);
            self.error = Some(speech_error_message(&e).to_string());
            return;
        }

        info!("Speaking utterance {}", utterance.id());
        *playback = Playback::Speaking(utterance);
    }

    /// Pause speaking. The utterance stays with the engine.
    pub fn pause(&mut self) {
        let ReaderState::Ready { playback, .. } = &mut self.state else {
            return;
        };
        if !playback.is_speaking() {
            debug!("Pause ignored: not speaking");
            return;
        }

        match speech::pause(&self.engine) {
            Ok(()) => {
                if let Playback::Speaking(utterance) =
                    std::mem::replace(playback, Playback::Stopped)
                {
                    debug!("Paused utterance {}", utterance.id());
                    *playback = Playback::Paused(utterance);
                }
            }
            Err(e) => {
                warn!("Failed to pause speech: {}", e);
                self.error = Some(PAUSE_FAILED.to_string());
            }
        }
    }

    /// Stop playback and forget the utterance, even if the engine fails.
    pub fn stop(&mut self) {
        let ReaderState::Ready { playback, .. } = &mut self.state else {
            return;
        };

        let result = speech::stop(&self.engine);
        *playback = Playback::Stopped;

        if let Err(e) = result {
            warn!("Failed to stop speech: {}", e);
            self.error = Some(STOP_FAILED.to_string());
        }
    }

    /// Update the volume, applying it to a live utterance in place.
    ///
    /// Values are clamped to `[0, 1]`; NaN is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = AudioControls::clamp_volume(volume) else {
            return;
        };
        self.volume = volume;

        let ReaderState::Ready { playback, .. } = &mut self.state else {
            return;
        };
        if let Some(utterance) = playback.utterance_mut() {
            utterance.set_volume(volume);
            if let Err(e) = self.engine.set_volume(utterance.id(), volume) {
                warn!("Engine did not accept volume change: {}", e);
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Apply a completion notice from the engine.
    ///
    /// Notices for any utterance other than the live one are ignored and
    /// `false` is returned.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> bool {
        let ReaderState::Ready { playback, .. } = &mut self.state else {
            debug!("Ignoring speech event for {}: no text", event.utterance);
            return false;
        };
        if playback.utterance_id() != Some(event.utterance) {
            debug!("Ignoring stale speech event for {}", event.utterance);
            return false;
        }

        match event.kind {
            SpeechEventKind::Ended => {
                info!("Utterance {} finished", event.utterance);
            }
            SpeechEventKind::Failed(reason) => {
                error!("Speech synthesis error: {}", reason);
                self.error = Some(SPEECH_FAILED.to_string());
            }
        }
        *playback = Playback::Stopped;
        true
    }
}

impl<E: SpeechEngine> Drop for ReaderScreen<E> {
    fn drop(&mut self) {
        if self.active_utterance().is_some() {
            if let Err(e) = speech::stop(&self.engine) {
                warn!("Failed to cancel speech on close: {}", e);
            }
        }
    }
}

fn speech_error_message(error: &SpeechError) -> &'static str {
    match error {
        SpeechError::NotSupported => SPEECH_UNSUPPORTED,
        SpeechError::Engine(_) => SPEECH_FAILED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::pdf::testing::pdf_with_pages;
    use crate::pdf::InMemoryFile;
    use crate::speech::fake::{Call, FakeEngine};
    use pretty_assertions::assert_eq;

    fn ready_screen(text: &str) -> (ReaderScreen<FakeEngine>, FakeEngine) {
        let engine = FakeEngine::default();
        let mut screen = ReaderScreen::new(engine.clone());
        let ticket = screen.begin_upload();
        assert!(screen.finish_upload(ticket, Ok(text.to_string())));
        engine.state.borrow_mut().calls.clear();
        (screen, engine)
    }

    #[tokio::test]
    async fn test_upload_play_and_finish() {
        let engine = FakeEngine::default();
        let mut screen = ReaderScreen::with_volume(engine.clone(), 0.7);
        let file = InMemoryFile::pdf("sample.pdf", pdf_with_pages(&[&["Hello"], &["World"]]));

        assert!(screen.upload(&PdfTextExtractor::new(), &file).await);
        assert_eq!(screen.text(), Some("Hello\n\nWorld"));
        assert_eq!(screen.phase(), Phase::ReadyIdle);

        screen.play();
        let id = screen.active_utterance().unwrap();
        let spoken: Vec<Call> = engine
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Speak { .. }))
            .collect();
        assert_eq!(
            spoken,
            vec![Call::Speak {
                id,
                text: "Hello\n\nWorld".to_string(),
                volume: 0.7,
            }]
        );
        assert!(screen.is_playing());

        assert!(screen.handle_speech_event(SpeechEvent::ended(id)));
        assert!(!screen.is_playing());
        assert_eq!(screen.active_utterance(), None);
    }

    #[test]
    fn test_play_without_text_is_noop() {
        let engine = FakeEngine::default();
        let mut screen = ReaderScreen::new(engine.clone());

        screen.play();
        assert!(engine.calls().is_empty());
        assert_eq!(screen.state(), &ReaderState::Idle);
        assert_eq!(screen.error(), None);
    }

    #[test]
    fn test_play_cancels_before_speaking() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();

        let calls = engine.calls();
        assert_eq!(calls[0], Call::Cancel);
        assert!(matches!(calls[1], Call::Speak { .. }));
    }

    #[test]
    fn test_second_upload_clears_text_and_error() {
        let (mut screen, engine) = ready_screen("old text");
        engine.state.borrow_mut().fail_cancel = true;
        screen.stop();
        assert_eq!(screen.error(), Some(STOP_FAILED));

        let ticket = screen.begin_upload();
        assert_eq!(screen.error(), None);
        assert_eq!(screen.text(), None);
        assert!(screen.is_processing());

        screen.finish_upload(ticket, Ok("new text".to_string()));
        assert_eq!(screen.text(), Some("new text"));
    }

    #[test]
    fn test_extraction_failure_shows_its_message() {
        let mut screen = ReaderScreen::new(FakeEngine::default());
        let ticket = screen.begin_upload();
        screen.finish_upload(ticket, Err(ExtractError::EmptyPage { page: 2 }.into()));

        assert_eq!(screen.error(), Some("Page 2 contains no readable text"));
        assert_eq!(screen.phase(), Phase::Idle);
    }

    #[test]
    fn test_other_failures_show_fallback() {
        let mut screen = ReaderScreen::new(FakeEngine::default());
        let ticket = screen.begin_upload();
        screen.finish_upload(ticket, Err(ReaderError::Task("worker panicked".to_string())));

        assert_eq!(screen.error(), Some(UNEXPECTED_EXTRACTION_ERROR));
        assert!(!screen.is_processing());
    }

    #[test]
    fn test_superseded_upload_result_is_dropped() {
        let mut screen = ReaderScreen::new(FakeEngine::default());
        let first = screen.begin_upload();
        let second = screen.begin_upload();

        assert!(!screen.finish_upload(first, Ok("first".to_string())));
        assert!(screen.is_processing());
        assert!(screen.finish_upload(second, Ok("second".to_string())));
        assert_eq!(screen.text(), Some("second"));
    }

    #[test]
    fn test_stop_clears_playback_even_if_engine_fails() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        engine.state.borrow_mut().fail_cancel = true;

        screen.stop();
        assert!(!screen.is_playing());
        assert_eq!(screen.active_utterance(), None);
        assert_eq!(screen.error(), Some(STOP_FAILED));
    }

    #[test]
    fn test_pause_keeps_utterance() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        let id = screen.active_utterance().unwrap();

        screen.pause();
        assert!(!screen.is_playing());
        assert_eq!(screen.active_utterance(), Some(id));
        assert_eq!(engine.count(&Call::Pause), 1);
    }

    #[test]
    fn test_pause_failure_reports_and_keeps_speaking() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        engine.state.borrow_mut().fail_pause = true;

        screen.pause();
        assert!(screen.is_playing());
        assert_eq!(screen.error(), Some(PAUSE_FAILED));
    }

    #[test]
    fn test_play_after_pause_restarts() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        let first = screen.active_utterance().unwrap();
        screen.pause();
        screen.play();

        let second = screen.active_utterance().unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.last_spoken(), Some(second));
        assert!(screen.is_playing());
    }

    #[test]
    fn test_volume_change_while_speaking() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        let id = screen.active_utterance().unwrap();

        screen.set_volume(0.3);
        assert_eq!(screen.volume(), 0.3);
        assert!(screen.is_playing());
        let live = screen.state().playback().unwrap().utterance().unwrap();
        assert_eq!(live.volume(), 0.3);
        assert_eq!(engine.count(&Call::SetVolume { id, volume: 0.3 }), 1);
        let speaks = engine
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Speak { .. }))
            .count();
        assert_eq!(speaks, 1);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut screen = ReaderScreen::new(FakeEngine::default());
        screen.set_volume(1.8);
        assert_eq!(screen.volume(), 1.0);
        screen.set_volume(-0.5);
        assert_eq!(screen.volume(), 0.0);
        screen.set_volume(f32::NAN);
        assert_eq!(screen.volume(), 0.0);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let (mut screen, _engine) = ready_screen("text");
        screen.play();
        let first = screen.active_utterance().unwrap();
        screen.play();
        let second = screen.active_utterance().unwrap();

        assert!(!screen.handle_speech_event(SpeechEvent::failed(first, "interrupted")));
        assert!(screen.is_playing());
        assert_eq!(screen.error(), None);

        assert!(screen.handle_speech_event(SpeechEvent::ended(second)));
        assert!(!screen.is_playing());
    }

    #[test]
    fn test_speech_failure_event() {
        let (mut screen, _engine) = ready_screen("text");
        screen.play();
        let id = screen.active_utterance().unwrap();

        assert!(screen.handle_speech_event(SpeechEvent::failed(id, "synthesis-failed")));
        assert_eq!(screen.error(), Some(SPEECH_FAILED));
        assert_eq!(screen.active_utterance(), None);

        screen.dismiss_error();
        assert_eq!(screen.error(), None);
        assert_eq!(screen.phase(), Phase::ReadyIdle);
    }

    #[test]
    fn test_unsupported_engine() {
        let (mut screen, engine) = ready_screen("text");
        engine.state.borrow_mut().unsupported = true;

        screen.play();
        assert_eq!(screen.error(), Some(SPEECH_UNSUPPORTED));
        assert!(!screen.is_playing());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_speak_failure() {
        let (mut screen, engine) = ready_screen("text");
        engine.state.borrow_mut().fail_speak = true;

        screen.play();
        assert_eq!(screen.error(), Some(SPEECH_FAILED));
        assert!(!screen.is_playing());
    }

    #[test]
    fn test_drop_while_speaking_cancels_once() {
        let (mut screen, engine) = ready_screen("text");
        screen.play();
        let before = engine.count(&Call::Cancel);

        drop(screen);
        assert_eq!(engine.count(&Call::Cancel), before + 1);
    }

    #[test]
    fn test_drop_when_idle_does_not_cancel() {
        let (screen, engine) = ready_screen("text");
        drop(screen);
        assert_eq!(engine.count(&Call::Cancel), 0);
    }
}
