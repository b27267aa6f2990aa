//! Subcommands.

pub mod config;
pub mod extract;
pub mod read;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use readaloud_core::models::config::ReaderConfig;
use readaloud_core::pdf::{LocalFile, PdfTextExtractor};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readaloud")
        .join("config.json")
}

/// The file named by `--config`, or the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration file, falling back to defaults when the default
/// file does not exist. A file named by `--config` must exist.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReaderConfig> {
    let path = config_file(config_path);
    let config = if config_path.is_some() || path.exists() {
        debug!("Using config file {}", path.display());
        ReaderConfig::from_file(&path)?
    } else {
        ReaderConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Open a local file and run it through the upload boundary.
pub fn open_upload(path: &Path, config: &ReaderConfig) -> anyhow::Result<LocalFile> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let file = LocalFile::open(path)?;
    config.upload_policy().check(&file)?;
    Ok(file)
}

pub fn extractor(config: &ReaderConfig) -> PdfTextExtractor {
    PdfTextExtractor::new().with_page_separator(config.pdf.page_separator.clone())
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
