//! Terminal rendering of the reader view.

use console::style;

use readaloud_core::view::{AudioControls, ControlAction, ScreenView, TextPreview};

/// Lines of preview shown at once.
pub const PREVIEW_HEIGHT: usize = 12;

pub fn controls_line(controls: &AudioControls) -> String {
    let state = match controls.primary {
        ControlAction::Pause => style("▶ speaking").green().to_string(),
        ControlAction::Play => style("■ stopped").yellow().to_string(),
    };
    let filled = (controls.volume * 10.0).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled.min(10)));
    format!(
        "{}  [p] {}  [s] {}  volume {} {:>3}%",
        state,
        controls.primary_label(),
        controls.reset_label,
        bar,
        (controls.volume * 100.0).round() as u32
    )
}

pub fn print_view(view: &ScreenView) {
    if let Some(error) = &view.error {
        eprintln!("{} {}  [d] dismiss", style("✗").red(), style(&error.message).red());
    }
    if let Some(spinner) = &view.spinner {
        eprintln!("{}", style(spinner.label).dim());
    }
    if let Some(controls) = &view.controls {
        eprintln!("{}", controls_line(controls));
    }
}

pub fn print_preview(preview: &TextPreview, offset: usize) -> usize {
    eprintln!("{}", style(preview.title).bold());
    for line in preview.window(offset, PREVIEW_HEIGHT) {
        eprintln!("  {}", line);
    }
    let next = offset + PREVIEW_HEIGHT;
    if next < preview.line_count() {
        eprintln!("  {}", style("... [t] more").dim());
        next
    } else {
        0
    }
}

pub fn print_help() {
    eprintln!(
        "{}",
        style("Keys: p play/pause, s reset, + / - volume, t preview, d dismiss error, q quit").dim()
    );
}
