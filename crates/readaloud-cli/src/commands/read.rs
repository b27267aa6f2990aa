//! Read command - speak a PDF with interactive controls.

use std::path::PathBuf;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use readaloud_core::models::config::ReaderConfig;
use readaloud_core::session::ReaderScreen;
use readaloud_core::view::{ScreenView, ViewOptions};

use super::{extractor, load_config, open_upload, spinner};
use crate::engine::CommandSpeechEngine;
use crate::render;

/// Arguments for the read command.
#[derive(Args)]
pub struct ReadArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Starting volume (0.0 - 1.0)
    #[arg(long)]
    volume: Option<f32>,

    /// Read once from start to end without keyboard controls
    #[arg(long)]
    no_interactive: bool,
}

/// A line of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    TogglePlay,
    Reset,
    VolumeUp,
    VolumeDown,
    Preview,
    Dismiss,
    Help,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" | " " | "" => Some(Self::TogglePlay),
            "s" | "r" => Some(Self::Reset),
            "+" | "=" => Some(Self::VolumeUp),
            "-" => Some(Self::VolumeDown),
            "t" => Some(Self::Preview),
            "d" => Some(Self::Dismiss),
            "?" | "h" => Some(Self::Help),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn view_options(config: &ReaderConfig) -> ViewOptions {
    ViewOptions {
        drag_active: false,
        max_file_size: config.upload.max_file_size,
        volume_step: config.speech.volume_step,
    }
}

pub async fn run(args: ReadArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let file = open_upload(&args.input, &config)?;
    let options = view_options(&config);

    let (tx, mut events) = mpsc::unbounded_channel();
    let engine = CommandSpeechEngine::new(config.speech.clone(), tx);
    let volume = args.volume.unwrap_or(config.speech.default_volume);
    let mut screen = ReaderScreen::with_volume(engine, volume);

    let pb = spinner("Processing PDF...");
    screen.upload(&extractor(&config), &file).await;
    pb.finish_and_clear();

    if let Some(error) = screen.error() {
        anyhow::bail!("{}", error);
    }

    info!("Reading {}", args.input.display());
    screen.play();
    if let Some(error) = screen.error() {
        anyhow::bail!("{}", error);
    }

    if args.no_interactive {
        while let Some(event) = events.recv().await {
            screen.handle_speech_event(event);
            if !screen.is_playing() {
                break;
            }
        }
        if let Some(error) = screen.error() {
            anyhow::bail!("{}", error);
        }
        return Ok(());
    }

    render::print_help();
    render::print_view(&ScreenView::render(&screen, options));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut preview_offset = 0;

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if screen.handle_speech_event(event) {
                    render::print_view(&ScreenView::render(&screen, options));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                let Some(key) = Key::parse(&line) else {
                    render::print_help();
                    continue;
                };

                let view = ScreenView::render(&screen, options);
                match key {
                    Key::TogglePlay if screen.is_playing() => screen.pause(),
                    Key::TogglePlay => screen.play(),
                    Key::Reset => screen.stop(),
                    Key::VolumeUp | Key::VolumeDown => {
                        if let Some(controls) = &view.controls {
                            screen.set_volume(controls.stepped(key == Key::VolumeUp));
                        }
                    }
                    Key::Preview => {
                        if let Some(preview) = &view.preview {
                            preview_offset = render::print_preview(preview, preview_offset);
                        }
                        continue;
                    }
                    Key::Dismiss => screen.dismiss_error(),
                    Key::Help => {
                        render::print_help();
                        continue;
                    }
                    Key::Quit => break,
                }
                render::print_view(&ScreenView::render(&screen, options));
            }
        }
    }

    // Dropping the screen cancels whatever is still speaking.
    drop(screen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        assert_eq!(Key::parse("p\n"), Some(Key::TogglePlay));
        assert_eq!(Key::parse(""), Some(Key::TogglePlay));
        assert_eq!(Key::parse(" s "), Some(Key::Reset));
        assert_eq!(Key::parse("+"), Some(Key::VolumeUp));
        assert_eq!(Key::parse("q"), Some(Key::Quit));
        assert_eq!(Key::parse("xyz"), None);
    }
}
