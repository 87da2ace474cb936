//! The `lock` command: the full merge → filter → resolve → render pipeline.
//!
//! # Examples
//!
//! Lock the default `environment.yml` for the default platforms:
//! ```bash
//! envlock lock
//! ```
//!
//! Merge several files, excluding dev dependencies:
//! ```bash
//! envlock lock -f environment.yml -f environment-dev.yml --no-dev-dependencies
//! ```
//!
//! Per-platform explicit output with a templated name:
//! ```bash
//! envlock lock -p linux-64 -p osx-arm64 -k explicit \
//!     --filename-template 'deps-{platform}-{dev-dependencies}.lock'
//! ```
//!
//! # Exit semantics
//!
//! The command succeeds only if every requested platform resolved. A
//! failing platform never aborts its siblings: successes are rendered and
//! reported alongside the failures, then the command exits non-zero.
//! Requesting zero platforms or filtering away every dependency is an
//! explicit "nothing to lock" error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::GlobalConfig;
use crate::constants::{DEFAULT_ENVIRONMENT_FILE, DEFAULT_PLATFORMS};
use crate::core::EnvlockError;
use crate::envfile::EnvironmentFile;
use crate::filter::{FilteredSpec, InclusionPolicy, filter};
use crate::lockfile::{
    LockDocument, OutputKind, PlatformLock, RenderPlan, plan_outputs, render_explicit,
    write_lock_file,
};
use crate::merge::merge;
use crate::resolver::{BackendSet, PlatformOutcome, resolve_all};
use crate::utils::expand_path;
use crate::utils::progress::MultiProgress;

/// Merge environment files, resolve each platform, and write lock files.
#[derive(Args)]
pub struct LockCommand {
    /// Environment file(s) to merge. Defaults to `environment.yml` in the
    /// working directory. Repeatable; later files merge into earlier ones.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<String>,

    /// Platform(s) to resolve, e.g. `linux-64`. Repeatable. Falls back to
    /// the platforms declared in the environment files, then the config
    /// default, then the built-in platform set.
    #[arg(short = 'p', long = "platform", value_name = "PLATFORM")]
    platforms: Vec<String>,

    /// Include the `dev` category (this is the default).
    #[arg(long, overrides_with = "no_dev_dependencies")]
    dev_dependencies: bool,

    /// Exclude the `dev` category.
    #[arg(long, overrides_with = "dev_dependencies")]
    no_dev_dependencies: bool,

    /// Additional categories to include. Repeatable and comma-separable.
    #[arg(long = "category", value_name = "NAME", value_delimiter = ',')]
    categories: Vec<String>,

    /// Strictly narrow the output to main, requested categories, and (when
    /// enabled) dev.
    #[arg(long)]
    filter_categories: bool,

    /// Filename template for rendered lock files. `{platform}` and
    /// `{dev-dependencies}` are substituted.
    #[arg(long, value_name = "TEMPLATE")]
    filename_template: Option<String>,

    /// Output kind: unified multi-platform document or per-platform
    /// explicit URL lists.
    #[arg(short = 'k', long = "kind", value_enum, default_value_t = OutputKind::Lock)]
    kind: OutputKind,

    /// Conda-family solver executable (overrides config and PATH lookup).
    #[arg(long, value_name = "EXE")]
    conda: Option<String>,

    /// Pip solver executable (overrides config and PATH lookup).
    #[arg(long, value_name = "EXE")]
    pip: Option<String>,

    /// Directory to write lock files into (default: working directory).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,
}

impl LockCommand {
    /// Run the pipeline end to end.
    pub async fn execute(self, config_path: Option<&str>) -> Result<()> {
        let config = GlobalConfig::load(config_path)?;

        // Load and merge the environment files; merge conflicts are fatal
        // before any solver work starts.
        let files = self.load_environment_files()?;
        let mut merged = merge(&files)?;
        merged.add_default_channels(config.channels.iter().cloned());

        let policy = self.inclusion_policy();
        let filtered = filter(&merged, &policy);

        let platforms = self.effective_platforms(merged.platforms(), &config);
        if platforms.is_empty() {
            return Err(EnvlockError::NothingToDo {
                reason: "no platforms requested".to_string(),
            }
            .into());
        }
        if filtered.is_empty() {
            return Err(EnvlockError::NothingToDo {
                reason: "no dependencies matched the inclusion policy".to_string(),
            }
            .into());
        }

        // Template validation and the filename-collision check happen here,
        // before any resolution work begins.
        let output_dir = self
            .output_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| PathBuf::from("."));
        let template = self
            .filename_template
            .as_deref()
            .unwrap_or_else(|| self.kind.default_template());
        let plan = plan_outputs(template, self.kind, &platforms, &policy, &output_dir)?;

        let backends = Arc::new(BackendSet::discover(
            self.conda.as_deref(),
            self.pip.as_deref(),
            &config,
        ));

        let filtered = Arc::new(filtered);
        let progress = MultiProgress::new();
        let outcomes =
            resolve_all(Arc::clone(&filtered), &platforms, backends, &progress).await;

        let written = render_outputs(&plan, &outcomes, &filtered)?;
        print_summary(&outcomes, &written);

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            return Err(EnvlockError::PlatformsFailed {
                failed,
                total: outcomes.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve `-f` arguments, defaulting to `environment.yml` in the
    /// working directory.
    fn load_environment_files(&self) -> Result<Vec<EnvironmentFile>> {
        let paths: Vec<PathBuf> = if self.files.is_empty() {
            vec![PathBuf::from(DEFAULT_ENVIRONMENT_FILE)]
        } else {
            self.files.iter().map(|f| expand_path(f)).collect()
        };

        paths.iter().map(|path| EnvironmentFile::load(path)).collect()
    }

    /// Build the immutable inclusion policy from the CLI flags.
    fn inclusion_policy(&self) -> InclusionPolicy {
        let dev_dependencies = if self.dev_dependencies {
            Some(true)
        } else if self.no_dev_dependencies {
            Some(false)
        } else {
            None
        };

        InclusionPolicy {
            dev_dependencies,
            extra_categories: self.categories.iter().cloned().collect(),
            filter_categories: self.filter_categories,
        }
    }

    /// Platform precedence: CLI flags, then environment files, then global
    /// config, then the built-in default set.
    fn effective_platforms(&self, from_files: &[String], config: &GlobalConfig) -> Vec<String> {
        if !self.platforms.is_empty() {
            return self.platforms.clone();
        }
        if !from_files.is_empty() {
            return from_files.to_vec();
        }
        if !config.default_platforms.is_empty() {
            return config.default_platforms.clone();
        }
        DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect()
    }
}

/// Render every planned file whose platforms resolved.
///
/// Files for failed platforms are skipped entirely; a unified document
/// covering a partially-failed group is written with the succeeded subset
/// only. Returns the written path per platform.
fn render_outputs(
    plan: &RenderPlan,
    outcomes: &[PlatformOutcome],
    filtered: &FilteredSpec,
) -> Result<HashMap<String, PathBuf>> {
    let locks: HashMap<&str, &PlatformLock> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok().map(|lock| (o.platform.as_str(), lock)))
        .collect();

    let mut written = HashMap::new();
    for file in &plan.files {
        let group: Vec<&PlatformLock> = file
            .platforms
            .iter()
            .filter_map(|p| locks.get(p.as_str()).copied())
            .collect();
        if group.is_empty() {
            continue;
        }

        let content = match plan.kind {
            OutputKind::Lock => LockDocument::build(&group, filtered).to_yaml()?,
            OutputKind::Explicit => {
                // Per-platform kinds plan exactly one platform per file.
                let lock = group[0];
                render_explicit(lock, &filtered.content_hash(&lock.platform))
            }
        };

        write_lock_file(&file.path, &content)?;
        for lock in &group {
            written.insert(lock.platform.clone(), file.path.clone());
        }
    }

    Ok(written)
}

/// Print the per-platform result summary.
fn print_summary(outcomes: &[PlatformOutcome], written: &HashMap<String, PathBuf>) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(lock) => {
                let path = written
                    .get(&outcome.platform)
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!(
                    "  {} {} → {} ({} packages)",
                    "✓".green(),
                    outcome.platform,
                    path,
                    lock.packages().len()
                );
            }
            Err(error) => {
                println!("  {} {}: {}", "✗".red(), outcome.platform, error);
            }
        }
    }
}
