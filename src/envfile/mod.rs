//! Environment-file loading (the input adapter).
//!
//! Turns each user-authored environment file into a flat list of
//! [`DependencyRecord`]s plus declared channels and platforms. Two flavors
//! are accepted, chosen by file extension:
//!
//! - **YAML** (`.yml`/`.yaml`) — the `environment.yml` shape: a `channels`
//!   list, an optional `category` tag, an optional `platforms` list, and a
//!   `dependencies` list of conda match specs with an optional nested `pip:`
//!   sub-list.
//! - **TOML** (`.toml`) — a `[tool.envlock]` table with the same keys,
//!   dependencies as `name = "constraint"` tables
//!   (`[tool.envlock.dependencies]` / `[tool.envlock.pip-dependencies]`).
//!
//! The loader is deliberately shallow: it does not validate constraint
//! syntax (that's the solver's job) and ignores keys it doesn't know about.
//! Every record gets its category assigned here — the file's declared
//! `category`, or `"main"` when absent — and is immutable afterward.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::core::EnvlockError;
use crate::models::{DependencyRecord, Manager};

/// One parsed environment file.
///
/// Holds the raw dependency records in declaration order together with the
/// file-level metadata the merger needs (channels, platforms, source path
/// for diagnostics).
#[derive(Debug, Clone)]
pub struct EnvironmentFile {
    /// Path the file was loaded from, for conflict diagnostics.
    pub path: PathBuf,
    /// Category assigned to every record in this file.
    pub category: String,
    /// Channels declared by this file, in order.
    pub channels: Vec<String>,
    /// Platforms requested by this file, in order. Usually empty; the CLI
    /// and config defaults apply then.
    pub platforms: Vec<String>,
    /// Dependency records in declaration order.
    pub dependencies: Vec<DependencyRecord>,
}

impl EnvironmentFile {
    /// Load and parse an environment file, dispatching on its extension.
    ///
    /// # Errors
    ///
    /// Returns [`EnvlockError::EnvironmentFileNotFound`] if the path does
    /// not exist and [`EnvlockError::EnvironmentFileParseError`] for
    /// malformed content or an unrecognized extension.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EnvlockError::EnvironmentFileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(path).map_err(|e| EnvlockError::EnvironmentFileParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "yml" | "yaml" => Self::parse_yaml(path, &content),
            "toml" => Self::parse_toml(path, &content),
            other => Err(EnvlockError::EnvironmentFileParseError {
                file: path.display().to_string(),
                reason: format!("unsupported file extension '{other}' (expected .yml, .yaml, or .toml)"),
            }
            .into()),
        }
    }

    /// Parse the YAML `environment.yml` flavor.
    fn parse_yaml(path: &Path, content: &str) -> Result<Self> {
        let raw: RawYamlEnvironment =
            serde_yaml::from_str(content).map_err(|e| EnvlockError::EnvironmentFileParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let category = raw.category.as_deref();
        let mut dependencies = Vec::new();
        for entry in raw.dependencies {
            match entry {
                RawYamlDependency::Spec(spec) => {
                    dependencies.push(parse_conda_spec(&spec, category));
                }
                RawYamlDependency::Pip { pip } => {
                    for requirement in pip {
                        dependencies.push(parse_pip_requirement(&requirement, category));
                    }
                }
            }
        }

        debug!(
            file = %path.display(),
            records = dependencies.len(),
            category = category.unwrap_or(crate::constants::MAIN_CATEGORY),
            "loaded environment file"
        );

        Ok(Self {
            path: path.to_path_buf(),
            category: category.unwrap_or(crate::constants::MAIN_CATEGORY).to_string(),
            channels: raw.channels,
            platforms: raw.platforms,
            dependencies,
        })
    }

    /// Parse the TOML `[tool.envlock]` flavor.
    fn parse_toml(path: &Path, content: &str) -> Result<Self> {
        let raw: RawTomlFile =
            toml::from_str(content).map_err(|e| EnvlockError::EnvironmentFileParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let env = raw.tool.and_then(|t| t.envlock).ok_or_else(|| {
            EnvlockError::EnvironmentFileParseError {
                file: path.display().to_string(),
                reason: "missing [tool.envlock] table".to_string(),
            }
        })?;

        let category = env.category.as_deref();
        let mut dependencies = Vec::new();
        for (name, dep) in &env.dependencies {
            dependencies.push(dep.to_record(name, Manager::Conda, category));
        }
        for (name, dep) in &env.pip_dependencies {
            dependencies.push(dep.to_record(name, Manager::Pip, category));
        }

        debug!(file = %path.display(), records = dependencies.len(), "loaded environment file");

        Ok(Self {
            path: path.to_path_buf(),
            category: category.unwrap_or(crate::constants::MAIN_CATEGORY).to_string(),
            channels: env.channels,
            platforms: env.platforms,
            dependencies,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawYamlEnvironment {
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    dependencies: Vec<RawYamlDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawYamlDependency {
    /// A conda match spec like `tzcode` or `python 3.11`.
    Spec(String),
    /// The nested `pip:` sub-list of requirement strings.
    Pip { pip: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct RawTomlFile {
    tool: Option<RawTomlTool>,
}

#[derive(Debug, Deserialize)]
struct RawTomlTool {
    envlock: Option<RawTomlEnvironment>,
}

#[derive(Debug, Deserialize)]
struct RawTomlEnvironment {
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, RawTomlDependency>,
    #[serde(default, rename = "pip-dependencies")]
    pip_dependencies: BTreeMap<String, RawTomlDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTomlDependency {
    /// `name = "==1.0"` shorthand.
    Simple(String),
    /// `name = { version = "==1.0", extras = ["x"] }`.
    Detailed {
        version: String,
        #[serde(default)]
        extras: Vec<String>,
    },
}

impl RawTomlDependency {
    fn to_record(&self, name: &str, manager: Manager, category: Option<&str>) -> DependencyRecord {
        match self {
            Self::Simple(version) => {
                DependencyRecord::new(name, manager, category, normalize_constraint(version))
            }
            Self::Detailed { version, extras } => DependencyRecord::with_extras(
                name,
                manager,
                category,
                normalize_constraint(version),
                extras.iter().cloned(),
            ),
        }
    }
}

fn normalize_constraint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "*".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a conda match spec into name and constraint.
///
/// Accepts both the space-separated form (`python 3.11`) and the operator
/// form (`numpy>=1.21`). Build-string pins (`name=1.0=h123`) pass through as
/// part of the constraint.
fn parse_conda_spec(spec: &str, category: Option<&str>) -> DependencyRecord {
    let spec = spec.trim();
    let split_at = spec.find(|c: char| c.is_whitespace() || "=<>!~".contains(c));
    let (name, constraint) = match split_at {
        Some(idx) => (&spec[..idx], spec[idx..].trim_start()),
        None => (spec, ""),
    };
    DependencyRecord::new(name, Manager::Conda, category, normalize_constraint(constraint))
}

/// Split a pip requirement string into name, extras, and constraint.
///
/// Handles the bracket extras syntax (`pydantic[dotenv,email]==1.10.10`).
fn parse_pip_requirement(requirement: &str, category: Option<&str>) -> DependencyRecord {
    let requirement = requirement.trim();

    let (head, rest) = match requirement.find('[') {
        Some(open) => {
            let close = requirement[open..].find(']').map(|i| open + i);
            match close {
                Some(close) => {
                    let extras: Vec<String> = requirement[open + 1..close]
                        .split(',')
                        .map(|e| e.trim().to_string())
                        .filter(|e| !e.is_empty())
                        .collect();
                    let name = requirement[..open].trim();
                    let constraint = requirement[close + 1..].trim();
                    return DependencyRecord::with_extras(
                        name,
                        Manager::Pip,
                        category,
                        normalize_constraint(constraint),
                        extras,
                    );
                }
                // Unbalanced bracket: treat the whole string as a name.
                None => (requirement, ""),
            }
        }
        None => {
            let split_at = requirement.find(|c: char| c.is_whitespace() || "=<>!~".contains(c));
            match split_at {
                Some(idx) => (&requirement[..idx], requirement[idx..].trim_start()),
                None => (requirement, ""),
            }
        }
    };

    DependencyRecord::new(head.trim(), Manager::Pip, category, normalize_constraint(rest))
}
