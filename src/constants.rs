//! Global constants used throughout the envlock codebase.
//!
//! This module contains category names, default file names, platform lists,
//! and environment variable names that are used across multiple modules.
//! Defining them centrally improves maintainability and makes magic strings
//! more discoverable.

/// The implicit category every dependency belongs to unless a source file
/// declares otherwise.
///
/// `"main"` is never stored as process-wide state; it is assigned as a plain
/// default value when an environment file without a `category:` key is
/// loaded, and never mutated afterward.
pub const MAIN_CATEGORY: &str = "main";

/// The development-dependency category.
///
/// Unlike user-defined extras, `"dev"` is included by default and controlled
/// by the `--dev-dependencies` / `--no-dev-dependencies` flags.
pub const DEV_CATEGORY: &str = "dev";

/// Environment file looked up in the working directory when no `--file`
/// arguments are given.
pub const DEFAULT_ENVIRONMENT_FILE: &str = "environment.yml";

/// Default filename template for rendered lock files.
///
/// Contains no template variables, so all requested platforms land in a
/// single unified multi-platform document.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "envlock.yml";

/// Platforms locked when neither the CLI nor any environment file requests a
/// specific set.
pub const DEFAULT_PLATFORMS: &[&str] = &["linux-64", "osx-64", "osx-arm64", "win-64"];

/// Format version written into unified lock documents.
pub const LOCKFILE_VERSION: u32 = 1;

/// Environment variable overriding the conda-family solver executable.
pub const CONDA_EXE_ENV: &str = "ENVLOCK_CONDA_EXE";

/// Environment variable overriding the pip solver executable.
pub const PIP_EXE_ENV: &str = "ENVLOCK_PIP_EXE";

/// Environment variable pointing at a non-default global config file.
pub const CONFIG_ENV: &str = "ENVLOCK_CONFIG";

/// Environment variable that disables progress bars when set to a non-empty
/// value. Also set by the `--no-progress` flag.
pub const NO_PROGRESS_ENV: &str = "ENVLOCK_NO_PROGRESS";

/// Conda-family executables probed, in order, when no explicit solver path is
/// configured.
pub const CONDA_EXE_CANDIDATES: &[&str] = &["micromamba", "mamba", "conda"];

/// Pip executables probed, in order, when no explicit solver path is
/// configured.
pub const PIP_EXE_CANDIDATES: &[&str] = &["pip", "pip3"];
