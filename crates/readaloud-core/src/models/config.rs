//! Configuration for the reader.

use serde::{Deserialize, Serialize};

use crate::error::ReaderError;
use crate::pdf::DEFAULT_PAGE_SEPARATOR;
use crate::upload::{UploadPolicy, MAX_FILE_SIZE};

/// Main configuration for readaloud.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Upload boundary configuration.
    pub upload: UploadConfig,

    /// Speech configuration.
    pub speech: SpeechConfig,

    /// PDF extraction configuration.
    pub pdf: PdfConfig,
}

/// Upload boundary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted file in bytes.
    pub max_file_size: u64,

    /// Substring the media type must contain.
    pub accepted_type: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            accepted_type: "pdf".to_string(),
        }
    }
}

/// Speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Volume used when a session starts (0.0 - 1.0).
    pub default_volume: f32,

    /// Slider step for volume changes.
    pub volume_step: f32,

    /// Program used by the command-line speech engine.
    pub program: String,

    /// Extra arguments passed before the volume flag.
    pub args: Vec<String>,

    /// Flag taking the amplitude (volume * `amplitude_scale`), or none to
    /// leave volume to the program.
    pub amplitude_arg: Option<String>,

    /// Amplitude at full volume.
    pub amplitude_scale: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            volume_step: 0.1,
            program: "espeak".to_string(),
            args: vec!["--stdin".to_string()],
            amplitude_arg: Some("-a".to_string()),
            amplitude_scale: 100.0,
        }
    }
}

/// PDF extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Separator placed between page texts.
    pub page_separator: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
        }
    }
}

impl ReaderConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.upload.max_file_size == 0 {
            return Err(ReaderError::Config("upload.max_file_size must be positive".into()));
        }
        if self.upload.accepted_type.trim().is_empty() {
            return Err(ReaderError::Config("upload.accepted_type must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.speech.default_volume) {
            return Err(ReaderError::Config(
                "speech.default_volume must be between 0.0 and 1.0".into(),
            ));
        }
        if !(self.speech.volume_step > 0.0 && self.speech.volume_step <= 1.0) {
            return Err(ReaderError::Config(
                "speech.volume_step must be in (0.0, 1.0]".into(),
            ));
        }
        if self.speech.program.trim().is_empty() {
            return Err(ReaderError::Config("speech.program must not be empty".into()));
        }
        Ok(())
    }

    /// Upload rules derived from this configuration.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_file_size: self.upload.max_file_size,
            accepted_type: self.upload.accepted_type.clone(),
        }
    }
}
