//! Speech engine over `window.speechSynthesis`.

use std::cell::RefCell;

use futures::channel::mpsc::UnboundedSender;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance};

use readaloud_core::error::SpeechError;
use readaloud_core::speech::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};

/// The utterance handed to the browser, with its callbacks kept alive.
struct Live {
    id: UtteranceId,
    utterance: SpeechSynthesisUtterance,
    _on_end: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl Drop for Live {
    fn drop(&mut self) {
        // Unhook before the closures are freed so the browser never calls
        // into a dropped closure.
        self.utterance.set_onend(None);
        self.utterance.set_onerror(None);
    }
}

/// Browser speech synthesis.
///
/// `onend` / `onerror` push [`SpeechEvent`]s into a channel; they never
/// touch the reader directly.
pub struct BrowserSpeech {
    synth: Option<SpeechSynthesis>,
    events: UnboundedSender<SpeechEvent>,
    live: RefCell<Option<Live>>,
}

impl BrowserSpeech {
    pub fn new(events: UnboundedSender<SpeechEvent>) -> Self {
        let synth = web_sys::window().and_then(|window| window.speech_synthesis().ok());
        Self {
            synth,
            events,
            live: RefCell::new(None),
        }
    }

    fn synth(&self) -> Result<&SpeechSynthesis, SpeechError> {
        self.synth.as_ref().ok_or(SpeechError::NotSupported)
    }
}

fn js_error(value: JsValue) -> SpeechError {
    SpeechError::Engine(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

impl SpeechEngine for BrowserSpeech {
    fn is_supported(&self) -> bool {
        self.synth.is_some()
    }

    fn speak(&self, utterance: &Utterance) -> Result<(), SpeechError> {
        let synth = self.synth()?;
        let id = utterance.id();

        let inner = SpeechSynthesisUtterance::new_with_text(utterance.text()).map_err(js_error)?;
        inner.set_volume(utterance.volume());

        let events = self.events.clone();
        let on_end = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
            let _ = events.unbounded_send(SpeechEvent::ended(id));
        });
        let events = self.events.clone();
        let on_error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            let reason = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| "unknown".to_string());
            let _ = events.unbounded_send(SpeechEvent::failed(id, reason));
        });
        inner.set_onend(Some(on_end.as_ref().unchecked_ref()));
        inner.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        synth.speak(&inner);
        debug!("Submitted utterance {}", id);

        *self.live.borrow_mut() = Some(Live {
            id,
            utterance: inner,
            _on_end: on_end,
            _on_error: on_error,
        });
        Ok(())
    }

    fn cancel(&self) -> Result<(), SpeechError> {
        self.synth()?.cancel();
        self.live.borrow_mut().take();
        Ok(())
    }

    fn pause(&self) -> Result<(), SpeechError> {
        self.synth()?.pause();
        Ok(())
    }

    fn resume(&self) -> Result<(), SpeechError> {
        self.synth()?.resume();
        Ok(())
    }

    fn set_volume(&self, utterance: UtteranceId, volume: f32) -> Result<(), SpeechError> {
        if let Some(live) = self.live.borrow().as_ref() {
            if live.id == utterance {
                live.utterance.set_volume(volume);
            }
        }
        Ok(())
    }
}
