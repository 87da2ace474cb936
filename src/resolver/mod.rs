//! The platform resolution orchestrator.
//!
//! Per-platform resolution is embarrassingly parallel: each platform is an
//! independent resolution problem, so the orchestrator fans out one async
//! task per platform and joins them with `futures::future::join_all`. The
//! only suspension points are the solver subprocess awaits inside the
//! backends.
//!
//! Failure isolation is the core contract here: one platform's failure
//! never aborts its siblings. Every platform reports its own
//! [`PlatformOutcome`], and partial success is a valid run state — the
//! caller renders the successes and reports the failures side by side.
//!
//! The filtered spec and backend set are shared read-only (`Arc`) across
//! workers; each worker exclusively owns its resulting [`PlatformLock`].
//! Results come back through the joined futures, not through shared mutable
//! accumulation.

pub mod backend;

pub use backend::{BackendSet, CondaBackend, PipBackend, ResolverBackend};

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::core::EnvlockError;
use crate::filter::FilteredSpec;
use crate::lockfile::PlatformLock;
use crate::models::Manager;
use crate::utils::progress::MultiProgress;

/// The result of resolving one platform: a lock or a scoped error.
#[derive(Debug)]
pub struct PlatformOutcome {
    /// Platform this outcome belongs to.
    pub platform: String,
    /// The lock on success, or the platform-scoped failure.
    pub result: Result<PlatformLock, EnvlockError>,
}

impl PlatformOutcome {
    /// Whether this platform resolved successfully.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Resolve every requested platform concurrently.
///
/// Outcomes are returned in the order `platforms` was given, regardless of
/// completion order. Each outcome carries either the platform's lock or the
/// error that failed it; this function itself never fails.
pub async fn resolve_all(
    filtered: Arc<FilteredSpec>,
    platforms: &[String],
    backends: Arc<BackendSet>,
    progress: &MultiProgress,
) -> Vec<PlatformOutcome> {
    let tasks = platforms.iter().map(|platform| {
        let filtered = Arc::clone(&filtered);
        let backends = Arc::clone(&backends);
        let spinner = progress.add_platform_spinner(platform);
        let platform = platform.clone();

        async move {
            let result = resolve_platform(&filtered, &backends, &platform).await;
            match &result {
                Ok(lock) => {
                    spinner.finish_with_message(format!("{} packages pinned", lock.packages().len()));
                }
                Err(error) => spinner.finish_with_message(format!("failed: {error}")),
            }
            PlatformOutcome { platform, result }
        }
    });

    join_all(tasks).await
}

/// Resolve one platform: route each manager's records to its backend and
/// merge the pinned outputs into a single lock.
///
/// Managers run in [`Manager::all`] order — conda before pip, since the pip
/// environment is resolved against the interpreter the conda set provides.
async fn resolve_platform(
    filtered: &FilteredSpec,
    backends: &BackendSet,
    platform: &str,
) -> Result<PlatformLock, EnvlockError> {
    let mut packages = Vec::new();

    for manager in Manager::all() {
        let records = filtered.records_for_manager(manager);
        if records.is_empty() {
            continue;
        }

        let backend = backends.for_manager(manager)?;
        debug!(platform, backend = backend.name(), records = records.len(), "dispatching to backend");

        let pinned = backend
            .resolve(&records, filtered.channels(), platform)
            .await
            .map_err(|e| into_platform_error(e, platform))?;
        packages.extend(pinned);
    }

    Ok(PlatformLock::new(platform, packages))
}

/// Flatten an `anyhow::Error` from a backend into the platform-scoped
/// error taxonomy.
fn into_platform_error(error: anyhow::Error, platform: &str) -> EnvlockError {
    match error.downcast::<EnvlockError>() {
        Ok(envlock_error) => envlock_error,
        Err(other) => EnvlockError::ResolutionFailed {
            platform: platform.to_string(),
            unsatisfied: Vec::new(),
            reason: format!("{other:#}"),
        },
    }
}

#[cfg(test)]
mod tests;
