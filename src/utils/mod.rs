//! Cross-cutting utilities: filesystem helpers and progress reporting.

pub mod fs;
pub mod progress;

/// Expand a leading `~` in a user-supplied path.
///
/// Used for `-f`, `--output-dir`, and config paths so shell-style home
/// references work even when the shell didn't expand them (quoted args,
/// values from config files).
pub fn expand_path(input: &str) -> std::path::PathBuf {
    std::path::PathBuf::from(shellexpand::tilde(input).into_owned())
}
