//! Presentational view models.
//!
//! Each piece is a plain value rendered from the reader screen; front ends
//! draw them and route user input back to the screen.

use serde::Serialize;

use crate::session::{Phase, ReaderScreen};
use crate::speech::SpeechEngine;

pub const TITLE: &str = "PDF Audio Reader";
pub const SUBTITLE: &str = "Upload your PDF and listen to it";

/// Dismissible error banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
    pub dismiss_label: &'static str,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            dismiss_label: "×",
        }
    }
}

/// Drop target / file picker prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadPrompt {
    pub prompt: &'static str,
    pub hint: String,
    pub drag_active: bool,
}

impl UploadPrompt {
    pub fn new(drag_active: bool, max_file_size: u64) -> Self {
        let prompt = if drag_active {
            "Drop your PDF here"
        } else {
            "Drag & drop a PDF file here, or click to select one"
        };
        Self {
            prompt,
            hint: format!("Maximum file size: {}MB", max_file_size / (1024 * 1024)),
            drag_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadingSpinner {
    pub label: &'static str,
}

impl Default for LoadingSpinner {
    fn default() -> Self {
        Self {
            label: "Processing PDF...",
        }
    }
}

/// Action bound to the main control button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Play,
    Pause,
}

/// Control strip: reset, play/pause toggle and volume slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioControls {
    pub is_playing: bool,
    pub volume: f32,
    pub primary: ControlAction,
    pub reset_label: &'static str,
    pub min_volume: f32,
    pub max_volume: f32,
    pub volume_step: f32,
}

impl AudioControls {
    pub const MIN_VOLUME: f32 = 0.0;
    pub const MAX_VOLUME: f32 = 1.0;

    pub fn new(is_playing: bool, volume: f32, volume_step: f32) -> Self {
        Self {
            is_playing,
            volume,
            primary: if is_playing {
                ControlAction::Pause
            } else {
                ControlAction::Play
            },
            reset_label: "Reset",
            min_volume: Self::MIN_VOLUME,
            max_volume: Self::MAX_VOLUME,
            volume_step,
        }
    }

    pub fn primary_label(&self) -> &'static str {
        match self.primary {
            ControlAction::Play => "Play",
            ControlAction::Pause => "Pause",
        }
    }

    /// Clamp a raw slider value into range. NaN is not a volume.
    pub fn clamp_volume(value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        Some(value.clamp(Self::MIN_VOLUME, Self::MAX_VOLUME))
    }

    /// Volume one slider step up or down from the current value.
    pub fn stepped(&self, up: bool) -> f32 {
        let delta = if up { self.volume_step } else { -self.volume_step };
        // Round to the slider grid so repeated steps don't drift.
        let steps = ((self.volume + delta) / self.volume_step).round();
        Self::clamp_volume(steps * self.volume_step).unwrap_or(self.volume)
    }
}

/// Scrollable text preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPreview {
    pub title: &'static str,
    pub text: String,
}

impl TextPreview {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            title: "PDF Content Preview:",
            text: text.into(),
        }
    }

    /// Lines `offset..offset + height` of the preview, for scrolling.
    pub fn window(&self, offset: usize, height: usize) -> Vec<&str> {
        self.text.lines().skip(offset).take(height).collect()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Everything a front end needs to draw the reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub phase: Phase,
    pub error: Option<ErrorMessage>,
    pub upload: UploadPrompt,
    pub spinner: Option<LoadingSpinner>,
    pub controls: Option<AudioControls>,
    pub preview: Option<TextPreview>,
}

/// Display options that are not part of the session state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub drag_active: bool,
    pub max_file_size: u64,
    pub volume_step: f32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            drag_active: false,
            max_file_size: crate::upload::MAX_FILE_SIZE,
            volume_step: 0.1,
        }
    }
}

impl ScreenView {
    /// Render the current state of a screen.
    ///
    /// Controls and preview only appear once text is ready.
    pub fn render<E: SpeechEngine>(screen: &ReaderScreen<E>, options: ViewOptions) -> Self {
        let ready_text = screen.text().filter(|_| !screen.is_processing());

        Self {
            title: TITLE,
            subtitle: SUBTITLE,
            phase: screen.phase(),
            error: screen.error().map(|message| ErrorMessage::new(message)),
            upload: UploadPrompt::new(options.drag_active, options.max_file_size),
            spinner: screen.is_processing().then(LoadingSpinner::default),
            controls: ready_text.map(|_| {
                AudioControls::new(screen.is_playing(), screen.volume(), options.volume_step)
            }),
            preview: ready_text.map(|text| TextPreview::new(text)),
        }
    }
}
