//! Solver backends: the capability boundary to external resolvers.
//!
//! The orchestrator is backend-agnostic. Each backend implements
//! [`ResolverBackend`] — resolve a record set for one platform into pinned
//! packages — and is selected by the `manager` field of the records it
//! receives. Two implementations exist:
//!
//! - [`CondaBackend`] shells out to a conda-family solver (micromamba,
//!   mamba, or conda) in `create --dry-run --json` mode, pinning the
//!   platform through `CONDA_SUBDIR`.
//! - [`PipBackend`] shells out to pip in `install --dry-run --report` mode
//!   with cross-platform wheel tags.
//!
//! Both treat the solver as an opaque black box: a dependency set and a
//! platform go in, a fully pinned package list (or a failure) comes out.
//! envlock never interprets constraints itself.
//!
//! Solver subprocesses are spawned with `kill_on_drop`, so cancelling a
//! platform's resolution (user interrupt, dropped future) terminates the
//! in-flight solver rather than leaving it running.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::config::GlobalConfig;
use crate::constants::{CONDA_EXE_CANDIDATES, CONDA_EXE_ENV, PIP_EXE_CANDIDATES, PIP_EXE_ENV};
use crate::core::EnvlockError;
use crate::models::{DependencyRecord, Manager, PackageHash, PinnedPackage};

/// Capability interface every solver backend implements.
///
/// Implementations must be cheap to share across concurrent platform
/// workers; all state is immutable after construction.
pub trait ResolverBackend: Send + Sync {
    /// Short backend name for diagnostics ("conda", "pip").
    fn name(&self) -> &'static str;

    /// The manager whose records this backend resolves.
    fn manager(&self) -> Manager;

    /// Resolve `records` for `platform` into a fully pinned package list.
    ///
    /// `records` is already restricted to this backend's manager. The
    /// returned list need not be sorted; the orchestrator canonicalizes
    /// ordering when it builds the platform lock.
    fn resolve<'a>(
        &'a self,
        records: &'a [&'a DependencyRecord],
        channels: &'a [String],
        platform: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PinnedPackage>>>;
}

/// The set of backends available to one resolution run, keyed by manager.
///
/// Discovery is lenient: a missing solver executable is recorded as an
/// error but only surfaces for platforms whose records actually need that
/// backend.
pub struct BackendSet {
    backends: HashMap<Manager, Result<Arc<dyn ResolverBackend>, EnvlockError>>,
}

impl BackendSet {
    /// Discover solver executables from CLI overrides, environment
    /// variables, global config, and finally PATH probing.
    pub fn discover(
        conda_override: Option<&str>,
        pip_override: Option<&str>,
        config: &GlobalConfig,
    ) -> Self {
        let mut backends: HashMap<Manager, Result<Arc<dyn ResolverBackend>, EnvlockError>> =
            HashMap::new();

        backends.insert(
            Manager::Conda,
            locate_executable(
                "conda",
                conda_override,
                CONDA_EXE_ENV,
                config.conda_exe.as_deref(),
                CONDA_EXE_CANDIDATES,
            )
            .map(|exe| Arc::new(CondaBackend::new(exe)) as Arc<dyn ResolverBackend>),
        );
        backends.insert(
            Manager::Pip,
            locate_executable(
                "pip",
                pip_override,
                PIP_EXE_ENV,
                config.pip_exe.as_deref(),
                PIP_EXE_CANDIDATES,
            )
            .map(|exe| Arc::new(PipBackend::new(exe)) as Arc<dyn ResolverBackend>),
        );

        Self { backends }
    }

    /// Build a set from explicit backends (used by tests to inject fakes).
    pub fn from_backends(backends: Vec<Arc<dyn ResolverBackend>>) -> Self {
        Self {
            backends: backends.into_iter().map(|b| (b.manager(), Ok(b))).collect(),
        }
    }

    /// The backend for a manager, or the discovery error recorded for it.
    pub fn for_manager(&self, manager: Manager) -> Result<&Arc<dyn ResolverBackend>, EnvlockError> {
        match self.backends.get(&manager) {
            Some(Ok(backend)) => Ok(backend),
            Some(Err(error)) => Err(error.clone()),
            None => Err(EnvlockError::BackendUnavailable {
                backend: manager.to_string(),
                reason: "no backend registered".to_string(),
            }),
        }
    }
}

/// Resolve a solver executable: explicit override, then env var, then
/// global config, then PATH candidates in order.
fn locate_executable(
    backend: &str,
    explicit: Option<&str>,
    env_var: &str,
    configured: Option<&str>,
    candidates: &[&str],
) -> Result<PathBuf, EnvlockError> {
    let requested = explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
        .or_else(|| configured.map(str::to_string));

    if let Some(requested) = requested {
        let path = crate::utils::expand_path(&requested);
        // An explicit path must exist; a bare name is looked up on PATH.
        if path.components().count() > 1 {
            if path.exists() {
                return Ok(path);
            }
            return Err(EnvlockError::BackendUnavailable {
                backend: backend.to_string(),
                reason: format!("configured executable not found: {}", path.display()),
            });
        }
        return which::which(&requested).map_err(|e| EnvlockError::BackendUnavailable {
            backend: backend.to_string(),
            reason: format!("'{requested}': {e}"),
        });
    }

    for candidate in candidates {
        if let Ok(path) = which::which(candidate) {
            debug!(backend, exe = %path.display(), "discovered solver executable");
            return Ok(path);
        }
    }

    Err(EnvlockError::BackendUnavailable {
        backend: backend.to_string(),
        reason: format!("none of [{}] found in PATH", candidates.join(", ")),
    })
}

/// Backend shelling out to a conda-family solver.
pub struct CondaBackend {
    exe: PathBuf,
}

impl CondaBackend {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }
}

impl ResolverBackend for CondaBackend {
    fn name(&self) -> &'static str {
        "conda"
    }

    fn manager(&self) -> Manager {
        Manager::Conda
    }

    fn resolve<'a>(
        &'a self,
        records: &'a [&'a DependencyRecord],
        channels: &'a [String],
        platform: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PinnedPackage>>> {
        Box::pin(async move {
            if records.is_empty() {
                return Ok(Vec::new());
            }

            // The dry-run still wants a prefix to plan against; it is never
            // created for real and the directory goes away with the guard.
            let prefix = tempfile::TempDir::new()?;

            let mut command = Command::new(&self.exe);
            command
                .arg("create")
                .arg("--dry-run")
                .arg("--json")
                .arg("--prefix")
                .arg(prefix.path().join("env"))
                .env("CONDA_SUBDIR", platform)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            if !channels.is_empty() {
                command.arg("--override-channels");
                for channel in channels {
                    command.arg("-c").arg(channel);
                }
            }
            for record in records {
                command.arg(record.spec_string());
            }

            debug!(platform, specs = records.len(), exe = %self.exe.display(), "invoking conda solver");

            let output = command.output().await.map_err(|e| EnvlockError::BackendUnavailable {
                backend: "conda".to_string(),
                reason: format!("failed to invoke {}: {e}", self.exe.display()),
            })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            if !output.status.success() {
                return Err(parse_conda_failure(platform, &stdout, &output.stderr).into());
            }

            parse_conda_dry_run(&stdout)
        })
    }
}

/// Pull the unsatisfiable-package list out of a failed conda run, falling
/// back to stderr when the solver didn't produce structured output.
fn parse_conda_failure(platform: &str, stdout: &str, stderr: &[u8]) -> EnvlockError {
    #[derive(Deserialize)]
    struct CondaError {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        packages: Vec<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<CondaError>(stdout) {
        return EnvlockError::ResolutionFailed {
            platform: platform.to_string(),
            unsatisfied: parsed.packages,
            reason: parsed.message.unwrap_or_else(|| "solver reported failure".to_string()),
        };
    }

    EnvlockError::ResolutionFailed {
        platform: platform.to_string(),
        unsatisfied: Vec::new(),
        reason: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct CondaDryRun {
    #[serde(default)]
    actions: Option<CondaActions>,
}

#[derive(Debug, Deserialize)]
struct CondaActions {
    #[serde(default, rename = "LINK")]
    link: Vec<CondaLinkEntry>,
}

#[derive(Debug, Deserialize)]
struct CondaLinkEntry {
    name: String,
    version: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    dist_name: Option<String>,
    #[serde(default)]
    md5: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

/// Turn a successful conda dry-run JSON document into pinned packages.
fn parse_conda_dry_run(stdout: &str) -> Result<Vec<PinnedPackage>> {
    let parsed: CondaDryRun =
        serde_json::from_str(stdout).map_err(|e| EnvlockError::BackendOutputError {
            backend: "conda".to_string(),
            reason: format!("unparseable dry-run JSON: {e}"),
        })?;

    let link = parsed.actions.map(|a| a.link).unwrap_or_default();
    let packages = link
        .into_iter()
        .map(|entry| {
            let url = entry.url.unwrap_or_else(|| {
                // Older solvers report the channel and dist name separately.
                let base = entry
                    .base_url
                    .or(entry.channel)
                    .unwrap_or_else(|| "unknown-channel".to_string());
                let file = entry
                    .dist_name
                    .unwrap_or_else(|| format!("{}-{}", entry.name, entry.version));
                format!("{}/{}.conda", base.trim_end_matches('/'), file)
            });
            PinnedPackage {
                name: entry.name,
                manager: Manager::Conda,
                version: entry.version,
                url,
                hash: PackageHash {
                    md5: entry.md5,
                    sha256: entry.sha256,
                },
            }
        })
        .collect();

    Ok(packages)
}

/// Backend shelling out to pip's dry-run resolver.
pub struct PipBackend {
    exe: PathBuf,
}

impl PipBackend {
    pub fn new(exe: PathBuf) -> Self {
        Self { exe }
    }
}

/// Map a conda-style platform string to pip's wheel platform tag.
///
/// Unknown platforms pass through unchanged and are left to pip to reject.
fn pip_platform_tag(platform: &str) -> &str {
    match platform {
        "linux-64" => "manylinux2014_x86_64",
        "linux-aarch64" => "manylinux2014_aarch64",
        "osx-64" => "macosx_10_9_x86_64",
        "osx-arm64" => "macosx_11_0_arm64",
        "win-64" => "win_amd64",
        other => other,
    }
}

impl ResolverBackend for PipBackend {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn manager(&self) -> Manager {
        Manager::Pip
    }

    fn resolve<'a>(
        &'a self,
        records: &'a [&'a DependencyRecord],
        _channels: &'a [String],
        platform: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PinnedPackage>>> {
        Box::pin(async move {
            if records.is_empty() {
                return Ok(Vec::new());
            }

            let target = tempfile::TempDir::new()?;

            let mut command = Command::new(&self.exe);
            command
                .arg("install")
                .arg("--quiet")
                .arg("--dry-run")
                .arg("--ignore-installed")
                .arg("--report")
                .arg("-")
                .arg("--only-binary")
                .arg(":all:")
                .arg("--platform")
                .arg(pip_platform_tag(platform))
                .arg("--target")
                .arg(target.path())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            for record in records {
                command.arg(record.spec_string());
            }

            debug!(platform, specs = records.len(), exe = %self.exe.display(), "invoking pip solver");

            let output = command.output().await.map_err(|e| EnvlockError::BackendUnavailable {
                backend: "pip".to_string(),
                reason: format!("failed to invoke {}: {e}", self.exe.display()),
            })?;

            if !output.status.success() {
                return Err(EnvlockError::ResolutionFailed {
                    platform: platform.to_string(),
                    unsatisfied: Vec::new(),
                    reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
                .into());
            }

            parse_pip_report(&String::from_utf8_lossy(&output.stdout))
        })
    }
}

#[derive(Debug, Deserialize)]
struct PipReport {
    #[serde(default)]
    install: Vec<PipInstallEntry>,
}

#[derive(Debug, Deserialize)]
struct PipInstallEntry {
    metadata: PipMetadata,
    #[serde(default)]
    download_info: Option<PipDownloadInfo>,
}

#[derive(Debug, Deserialize)]
struct PipMetadata {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct PipDownloadInfo {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    archive_info: Option<PipArchiveInfo>,
}

#[derive(Debug, Deserialize)]
struct PipArchiveInfo {
    #[serde(default)]
    hash: Option<String>,
}

/// Turn a pip `--report` JSON document into pinned packages.
fn parse_pip_report(stdout: &str) -> Result<Vec<PinnedPackage>> {
    let report: PipReport =
        serde_json::from_str(stdout).map_err(|e| EnvlockError::BackendOutputError {
            backend: "pip".to_string(),
            reason: format!("unparseable install report: {e}"),
        })?;

    let packages = report
        .install
        .into_iter()
        .map(|entry| {
            let url = entry
                .download_info
                .as_ref()
                .and_then(|d| d.url.clone())
                .unwrap_or_default();
            // Report hashes come as "algorithm=digest".
            let hash = entry
                .download_info
                .and_then(|d| d.archive_info)
                .and_then(|a| a.hash)
                .map(|h| match h.split_once('=') {
                    Some(("sha256", digest)) => PackageHash {
                        md5: None,
                        sha256: Some(digest.to_string()),
                    },
                    Some(("md5", digest)) => PackageHash {
                        md5: Some(digest.to_string()),
                        sha256: None,
                    },
                    _ => PackageHash::default(),
                })
                .unwrap_or_default();

            PinnedPackage {
                name: entry.metadata.name,
                manager: Manager::Pip,
                version: entry.metadata.version,
                url,
                hash,
            }
        })
        .collect();

    Ok(packages)
}
