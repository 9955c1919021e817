
use indicatif::{ProgressState, ProgressStyle};
use std::fmt::Write;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sequences ({percent}); ETA: {eta_precise}; Speed: {per_sec} {msg}";

/// Shared function to pull our progress bar styling
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.1}%", state.fraction() * 100.0);
        })
        .with_key("per_sec", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.1}/s", state.per_sec());
        })
        .progress_chars("##-")
}
