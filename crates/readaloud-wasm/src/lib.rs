//! WASM bindings for reading PDF documents aloud.
//!
//! This crate exposes a `PdfReaderApp` class that a page drives from its
//! drop target, file picker and control buttons, re-rendering from `view()`
//! whenever the change callback fires.

mod file;
mod speech;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::mpsc;
use futures::StreamExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::FileList;

use readaloud_core::error::ReaderError;
use readaloud_core::models::config::ReaderConfig;
use readaloud_core::pdf::PdfTextExtractor;
use readaloud_core::session::ReaderScreen;
use readaloud_core::view::{ScreenView, ViewOptions};

pub use file::BrowserFile;
pub use speech::BrowserSpeech;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract the readable text of PDF bytes.
///
/// Rejects with the user-facing extraction message.
#[wasm_bindgen]
pub fn extract_text(data: &[u8]) -> Result<String, JsValue> {
    PdfTextExtractor::new()
        .extract_bytes(data)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Default configuration as a plain object.
#[wasm_bindgen]
pub fn default_config() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&ReaderConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

struct Shared {
    screen: RefCell<ReaderScreen<BrowserSpeech>>,
    extractor: PdfTextExtractor,
    config: ReaderConfig,
    drag_active: Cell<bool>,
    on_change: RefCell<Option<js_sys::Function>>,
}

impl Shared {
    fn notify(&self) {
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                web_sys::console::error_2(&JsValue::from_str("change callback failed:"), &e);
            }
        }
    }

    fn view(&self) -> ScreenView {
        ScreenView::render(
            &self.screen.borrow(),
            ViewOptions {
                drag_active: self.drag_active.get(),
                max_file_size: self.config.upload.max_file_size,
                volume_step: self.config.speech.volume_step,
            },
        )
    }

    /// Apply a control action, then tell the page to re-render.
    fn update(&self, action: impl FnOnce(&mut ReaderScreen<BrowserSpeech>)) {
        action(&mut self.screen.borrow_mut());
        self.notify();
    }
}

fn alert(message: &str) {
    let shown = web_sys::window().map(|window| window.alert_with_message(message));
    if !matches!(shown, Some(Ok(()))) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }
}

/// The reader screen for one page.
///
/// Calling `free()` unmounts it and cancels any speech still playing.
#[wasm_bindgen]
pub struct PdfReaderApp {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl PdfReaderApp {
    /// Create a reader. `config` may be omitted to use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<PdfReaderApp, JsValue> {
        let config: ReaderConfig = if config.is_undefined() || config.is_null() {
            ReaderConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;

        let (tx, mut rx) = mpsc::unbounded();
        let screen = ReaderScreen::with_volume(BrowserSpeech::new(tx), config.speech.default_volume);
        let extractor = PdfTextExtractor::new().with_page_separator(config.pdf.page_separator.clone());

        let shared = Rc::new(Shared {
            screen: RefCell::new(screen),
            extractor,
            config,
            drag_active: Cell::new(false),
            on_change: RefCell::new(None),
        });

        // Speech callbacks land here, one at a time, outside any borrow.
        let weak = Rc::downgrade(&shared);
        spawn_local(async move {
            while let Some(event) = rx.next().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let handled = shared.screen.borrow_mut().handle_speech_event(event);
                if handled {
                    shared.notify();
                }
            }
        });

        Ok(PdfReaderApp { shared })
    }

    /// Register the function called after every state change.
    #[wasm_bindgen]
    pub fn on_change(&self, callback: js_sys::Function) {
        *self.shared.on_change.borrow_mut() = Some(callback);
    }

    /// Current view model as a plain object.
    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.shared.view())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Track whether a drag is hovering the drop target.
    #[wasm_bindgen]
    pub fn set_drag_active(&self, active: bool) {
        if self.shared.drag_active.replace(active) != active {
            self.shared.notify();
        }
    }

    /// Handle files from a drop or the picker.
    ///
    /// Resolves to `true` once extracted text is shown, `false` if the
    /// selection was rejected, empty, failed, or superseded.
    #[wasm_bindgen]
    pub fn accept_files(&self, files: FileList) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        shared.drag_active.set(false);
        let files: Vec<BrowserFile> = (0..files.length())
            .filter_map(|i| files.get(i))
            .map(BrowserFile::new)
            .collect();

        future_to_promise(async move {
            let policy = shared.config.upload_policy();
            let file = match policy.accept_single(&files) {
                Ok(Some(file)) => file,
                Ok(None) => return Ok(JsValue::FALSE),
                Err(rejection) => {
                    shared.notify();
                    alert(&rejection.to_string());
                    return Ok(JsValue::FALSE);
                }
            };

            let ticket = shared.screen.borrow_mut().begin_upload();
            shared.notify();

            let result = shared.extractor.extract(file).await.map_err(ReaderError::from);
            let ok = result.is_ok();
            if let Err(e) = &result {
                web_sys::console::error_1(&JsValue::from_str(&format!("PDF processing error: {}", e)));
            }
            let applied = shared.screen.borrow_mut().finish_upload(ticket, result);
            shared.notify();

            Ok(JsValue::from_bool(applied && ok))
        })
    }

    #[wasm_bindgen]
    pub fn play(&self) {
        self.shared.update(|screen| screen.play());
    }

    #[wasm_bindgen]
    pub fn pause(&self) {
        self.shared.update(|screen| screen.pause());
    }

    /// Reset: stop speaking and forget the utterance.
    #[wasm_bindgen]
    pub fn stop(&self) {
        self.shared.update(|screen| screen.stop());
    }

    /// Play when stopped or paused, pause when speaking.
    #[wasm_bindgen]
    pub fn toggle(&self) {
        self.shared.update(|screen| {
            if screen.is_playing() {
                screen.pause();
            } else {
                screen.play();
            }
        });
    }

    #[wasm_bindgen]
    pub fn set_volume(&self, volume: f32) {
        self.shared.update(|screen| screen.set_volume(volume));
    }

    #[wasm_bindgen]
    pub fn dismiss_error(&self) {
        self.shared.update(|screen| screen.dismiss_error());
    }

    /// Extracted text, if any.
    #[wasm_bindgen]
    pub fn text(&self) -> Option<String> {
        self.shared.screen.borrow().text().map(str::to_string)
    }

    #[wasm_bindgen]
    pub fn is_playing(&self) -> bool {
        self.shared.screen.borrow().is_playing()
    }
}
