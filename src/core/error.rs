//! Error handling for envlock.
//!
//! The error system is built around two types:
//! - [`EnvlockError`] — strongly-typed failure cases for every stage of the
//!   merge → filter → resolve → render pipeline
//! - [`ErrorContext`] — a wrapper that adds user-facing details and
//!   actionable suggestions for CLI display
//!
//! # Taxonomy
//!
//! Errors fall into four families with different propagation rules:
//!
//! - **Conflict errors** ([`EnvlockError::DependencyConflict`]): two source
//!   files declare the same `(category, manager, name)` with different
//!   constraints. Fatal for the whole merge — proceeding silently could hide
//!   a user mistake.
//! - **Configuration errors** ([`EnvlockError::UnknownTemplateVariable`],
//!   [`EnvlockError::FilenameCollision`], [`EnvlockError::NothingToDo`],
//!   [`EnvlockError::ConfigError`]): self-contradictory user input, surfaced
//!   before any resolution work begins.
//! - **Resolution errors** ([`EnvlockError::ResolutionFailed`],
//!   [`EnvlockError::BackendUnavailable`]): scoped to individual platforms;
//!   one platform's failure never aborts its siblings. The orchestrator
//!   aggregates them into a final per-platform report, summarized as
//!   [`EnvlockError::PlatformsFailed`].
//! - **Environment errors** (I/O, parse failures): converted from the
//!   underlying library errors and wrapped with context at call sites.
//!
//! Use [`user_friendly_error`] at the binary boundary to turn any
//! `anyhow::Error` into a colored report with suggestions.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for envlock operations.
///
/// Each variant carries the context needed both for programmatic matching
/// and for a self-explanatory CLI message.
#[derive(Error, Debug, Clone)]
pub enum EnvlockError {
    /// An environment file given on the command line (or the default
    /// `environment.yml`) does not exist.
    #[error("Environment file not found: {path}")]
    EnvironmentFileNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// An environment file exists but could not be parsed.
    #[error("Invalid environment file: {file}")]
    EnvironmentFileParseError {
        /// Path to the file that failed to parse.
        file: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Two source files declare the same `(category, manager, name)` key
    /// with different constraints.
    ///
    /// This is fatal for the whole merge: silently preferring one constraint
    /// over the other could hide a genuine mistake in the user's files.
    #[error(
        "Conflicting constraints for {manager} package '{name}' in category '{category}': \
         '{existing}' vs '{incoming}'"
    )]
    DependencyConflict {
        /// Package name declared twice.
        name: String,
        /// Manager of the conflicting records.
        manager: String,
        /// Category both records belong to.
        category: String,
        /// Constraint seen first (file order).
        existing: String,
        /// Conflicting constraint seen later.
        incoming: String,
    },

    /// The filename template references a variable envlock does not know.
    #[error("Unknown variable '{{{variable}}}' in filename template '{template}'")]
    UnknownTemplateVariable {
        /// The unrecognized variable name, without braces.
        variable: String,
        /// The full template it appeared in.
        template: String,
    },

    /// The filename template renders to the same file name for more than one
    /// platform while a per-platform output kind was requested.
    #[error("Filename template renders '{filename}' for multiple platforms: {}", platforms.join(", "))]
    FilenameCollision {
        /// The colliding rendered file name.
        filename: String,
        /// Platforms that would all write this file.
        platforms: Vec<String>,
    },

    /// Zero platforms were requested or zero dependencies survived filtering.
    #[error("Nothing to lock: {reason}")]
    NothingToDo {
        /// What exactly was empty.
        reason: String,
    },

    /// A platform's dependency set is unsatisfiable by its solver backend.
    ///
    /// Scoped to one platform; sibling platforms keep resolving.
    #[error("Resolution failed for platform {platform}: {reason}")]
    ResolutionFailed {
        /// Platform whose resolution failed.
        platform: String,
        /// Package names the solver reported as unsatisfiable, when known.
        unsatisfied: Vec<String>,
        /// Solver diagnostic.
        reason: String,
    },

    /// A solver executable could not be found or invoked.
    ///
    /// Fatal only for platforms whose records need this backend.
    #[error("Solver backend '{backend}' is unavailable: {reason}")]
    BackendUnavailable {
        /// Backend name (e.g. "conda", "pip").
        backend: String,
        /// Why it could not be used.
        reason: String,
    },

    /// A solver ran but produced output envlock could not interpret.
    #[error("Unexpected output from solver backend '{backend}': {reason}")]
    BackendOutputError {
        /// Backend name.
        backend: String,
        /// What was wrong with the output.
        reason: String,
    },

    /// Final summary error when at least one platform failed to resolve.
    ///
    /// The per-platform causes have already been reported; this variant
    /// exists to drive the non-zero exit status.
    #[error("{failed} of {total} platform(s) failed to resolve")]
    PlatformsFailed {
        /// Number of platforms that failed.
        failed: usize,
        /// Number of platforms requested.
        total: usize,
    },

    /// Global configuration file problem.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error.
        message: String,
    },

    /// Catch-all for errors that do not fit the variants above.
    #[error("{message}")]
    Other {
        /// Free-form error description.
        message: String,
    },
}

/// Wrapper that pairs an [`EnvlockError`] with user-facing context.
///
/// The `details` field explains why the error occurred; the `suggestion`
/// field tells the user what to do about it. Both are optional and rendered
/// in distinct colors by [`display`](Self::display).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying envlock error.
    pub error: EnvlockError,
    /// Optional actionable suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Optional additional details about the error.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no additional details.
    #[must_use]
    pub const fn new(error: EnvlockError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error. Rendered in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error. Rendered in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with colors.
    ///
    /// This is how envlock presents terminal-level failures to users.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`] for CLI display.
///
/// Recognizes [`EnvlockError`] variants and common I/O failures and attaches
/// tailored suggestions; everything else is wrapped generically.
///
/// # Examples
///
/// ```rust
/// use envlock::core::{EnvlockError, user_friendly_error};
///
/// let err = anyhow::Error::from(EnvlockError::NothingToDo {
///     reason: "no platforms requested".to_string(),
/// });
/// let ctx = user_friendly_error(err);
/// assert!(ctx.suggestion.is_some());
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(envlock_error) = error.downcast_ref::<EnvlockError>() {
        return create_error_context(envlock_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context = match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorContext::new(EnvlockError::Other {
                message: format!("{error:#}"),
            })
            .with_suggestion("Check file ownership or re-run with elevated permissions"),
            std::io::ErrorKind::NotFound => ErrorContext::new(EnvlockError::Other {
                message: format!("{error:#}"),
            })
            .with_suggestion("Check that the file or directory exists and the path is correct"),
            _ => ErrorContext::new(EnvlockError::Other {
                message: format!("{error:#}"),
            }),
        };
        return context;
    }

    ErrorContext::new(EnvlockError::Other {
        message: format!("{error:#}"),
    })
}

/// Attach the standard details/suggestion pair for each error variant.
fn create_error_context(error: EnvlockError) -> ErrorContext {
    match &error {
        EnvlockError::EnvironmentFileNotFound { path } => {
            let path = path.clone();
            ErrorContext::new(error)
                .with_details(format!(
                    "envlock reads dependency declarations from '{path}' but the file does not exist"
                ))
                .with_suggestion(
                    "Create an environment file or pass explicit paths with '-f <FILE>'",
                )
        }
        EnvlockError::EnvironmentFileParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the file for syntax errors; see '--help' for the accepted keys"),
        EnvlockError::DependencyConflict { name, .. } => {
            let name = name.clone();
            ErrorContext::new(error)
                .with_details(
                    "Two of the given environment files pin the same package differently; \
                     envlock refuses to pick one silently",
                )
                .with_suggestion(format!(
                    "Align the constraints for '{name}' across your environment files"
                ))
        }
        EnvlockError::UnknownTemplateVariable { .. } => ErrorContext::new(error)
            .with_suggestion("Supported template variables are {platform} and {dev-dependencies}"),
        EnvlockError::FilenameCollision { .. } => ErrorContext::new(error)
            .with_details(
                "Per-platform output kinds need one file per platform, so the template must \
                 produce distinct names",
            )
            .with_suggestion("Add {platform} to the filename template or request a single platform"),
        EnvlockError::NothingToDo { .. } => ErrorContext::new(error)
            .with_suggestion("Check your environment files and category/platform selection"),
        EnvlockError::BackendUnavailable { backend, .. } => {
            let backend = backend.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Install a {backend} solver or point envlock at one with '--{backend} <EXE>'"
            ))
        }
        EnvlockError::ResolutionFailed { unsatisfied, .. } if !unsatisfied.is_empty() => {
            let packages = unsatisfied.join(", ");
            ErrorContext::new(error).with_details(format!("Unsatisfiable packages: {packages}"))
        }
        EnvlockError::PlatformsFailed { .. } => ErrorContext::new(error)
            .with_details("Per-platform causes are listed in the summary above"),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_names_both_constraints() {
        let err = EnvlockError::DependencyConflict {
            name: "tzcode".to_string(),
            manager: "conda".to_string(),
            category: "main".to_string(),
            existing: ">=2022a".to_string(),
            incoming: "==2021e".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains(">=2022a"));
        assert!(msg.contains("==2021e"));
        assert!(msg.contains("tzcode"));
    }

    #[test]
    fn user_friendly_error_adds_suggestions() {
        let ctx = user_friendly_error(anyhow::Error::from(EnvlockError::BackendUnavailable {
            backend: "conda".to_string(),
            reason: "not found in PATH".to_string(),
        }));
        assert!(ctx.suggestion.unwrap().contains("--conda"));
    }

    #[test]
    fn error_context_display_includes_details() {
        let ctx = ErrorContext::new(EnvlockError::Other {
            message: "boom".to_string(),
        })
        .with_details("details here")
        .with_suggestion("try again");

        let rendered = ctx.to_string();
        assert!(rendered.contains("boom"));
        assert!(rendered.contains("Details: details here"));
        assert!(rendered.contains("Suggestion: try again"));
    }
}
