//! Progress indicators for long-running solver invocations.
//!
//! Thin wrappers over [`indicatif`] that honor the `--no-progress` flag (via
//! the `ENVLOCK_NO_PROGRESS` environment variable) and non-TTY environments
//! by silently swapping in hidden bars. Each platform being resolved gets
//! its own spinner inside a shared [`MultiProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{MultiProgress as IndicatifMulti, ProgressBar as IndicatifBar, ProgressStyle};

use crate::constants::NO_PROGRESS_ENV;

static PROGRESS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable progress rendering for the rest of the process.
///
/// Called once by the CLI when `--no-progress` is passed; the environment
/// variable covers child-process and automation use.
pub fn disable() {
    PROGRESS_DISABLED.store(true, Ordering::Relaxed);
}

/// Whether progress rendering is disabled for this process.
fn is_progress_disabled() -> bool {
    PROGRESS_DISABLED.load(Ordering::Relaxed)
        || std::env::var(NO_PROGRESS_ENV).is_ok_and(|v| !v.is_empty())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:12} {msg}")
        .expect("static template is valid")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

/// A spinner tracking one platform's resolution.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Create a standalone spinner, hidden when progress is disabled.
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    /// Set the message shown next to the spinner.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Set the prefix (typically the platform name).
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Stop the spinner, leaving a final message on screen.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Stop the spinner and erase its line.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Container coordinating one spinner per concurrently-resolving platform.
pub struct MultiProgress {
    inner: IndicatifMulti,
}

impl MultiProgress {
    /// Create a new empty multi-progress container.
    pub fn new() -> Self {
        Self {
            inner: IndicatifMulti::new(),
        }
    }

    /// Add a spinner labeled with the given platform.
    pub fn add_platform_spinner(&self, platform: &str) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        let inner = self.inner.add(bar.inner.clone());
        let bar = ProgressBar { inner };
        bar.set_prefix(platform.to_string());
        bar.set_message("resolving...");
        bar
    }
}

impl Default for MultiProgress {
    fn default() -> Self {
        Self::new()
    }
}
