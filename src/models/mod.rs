//! Shared data models for dependency records and pinned packages.
//!
//! These types flow through the whole pipeline: the environment-file loader
//! produces [`DependencyRecord`]s, the merger and filter shuffle them around
//! without mutation, and the resolver backends turn them into
//! [`PinnedPackage`]s that the lock renderer serializes.
//!
//! All types here are plain data. Records are immutable once constructed by
//! the loader; the implicit `"main"` category is assigned at construction
//! time and never patched in later.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAIN_CATEGORY;

/// The package manager responsible for resolving a dependency.
///
/// Each record carries its manager so the orchestrator can route it to the
/// matching solver backend. Managers are a closed set (there is exactly one
/// backend per manager), unlike categories which are open-ended strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manager {
    /// Resolved by a conda-family solver (conda, mamba, micromamba).
    Conda,
    /// Resolved by a pip-family solver.
    Pip,
}

impl Manager {
    /// All managers, in the order they are resolved within a platform.
    ///
    /// Conda runs first: the pip environment is resolved against the Python
    /// interpreter the conda set provides.
    pub const fn all() -> [Self; 2] {
        [Self::Conda, Self::Pip]
    }

    /// Lowercase name as written into lock files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conda => "conda",
            Self::Pip => "pip",
        }
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Manager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conda" => Ok(Self::Conda),
            "pip" => Ok(Self::Pip),
            other => Err(format!("unknown manager '{other}'")),
        }
    }
}

/// A single dependency declaration from an environment file.
///
/// Identity within a category is `(name, manager)`; the same name may appear
/// under both managers (a conda package and a PyPI package of the same name
/// are different records). The `constraint` is an opaque solver expression —
/// envlock never interprets it beyond equality comparison during merge
/// conflict detection.
///
/// # Examples
///
/// ```rust
/// use envlock::models::{DependencyRecord, Manager};
///
/// let rec = DependencyRecord::new("tzcode", Manager::Conda, None, "*");
/// assert_eq!(rec.category, "main");
/// assert!(rec.extras.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Package name as declared in the source file.
    pub name: String,
    /// Solver family responsible for this record.
    pub manager: Manager,
    /// Category label; `"main"` when the source file declared none.
    pub category: String,
    /// Package extras (pip `name[extra1,extra2]` syntax). Empty for most
    /// records; ordered for deterministic serialization.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub extras: BTreeSet<String>,
    /// Opaque version constraint, `"*"` when unconstrained.
    pub constraint: String,
}

impl DependencyRecord {
    /// Create a record, applying the implicit `"main"` category when the
    /// source file declared none.
    pub fn new(
        name: impl Into<String>,
        manager: Manager,
        category: Option<&str>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            manager,
            category: category.unwrap_or(MAIN_CATEGORY).to_string(),
            extras: BTreeSet::new(),
            constraint: constraint.into(),
        }
    }

    /// Same as [`new`](Self::new) with pip-style extras attached.
    pub fn with_extras(
        name: impl Into<String>,
        manager: Manager,
        category: Option<&str>,
        constraint: impl Into<String>,
        extras: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut record = Self::new(name, manager, category, constraint);
        record.extras = extras.into_iter().collect();
        record
    }

    /// The spec string handed to solver backends: `name` plus constraint,
    /// with extras in pip bracket syntax for pip records.
    pub fn spec_string(&self) -> String {
        let mut spec = self.name.clone();
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            spec.push('[');
            spec.push_str(&extras.join(","));
            spec.push(']');
        }
        if self.constraint != "*" {
            match self.manager {
                // Conda match specs separate name and constraint with a space.
                Manager::Conda => {
                    spec.push(' ');
                    spec.push_str(&self.constraint);
                }
                // Pip requirement strings concatenate directly (`pkg==1.0`).
                Manager::Pip => spec.push_str(&self.constraint),
            }
        }
        spec
    }
}

impl fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, category {})", self.spec_string(), self.manager, self.category)
    }
}

/// Integrity hashes for a pinned package.
///
/// Solvers report whichever digests their index provides; both are optional
/// and at least one is normally present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PackageHash {
    /// Whether no digest was reported at all.
    pub fn is_empty(&self) -> bool {
        self.md5.is_none() && self.sha256.is_none()
    }
}

/// A fully resolved package as reported by a solver backend.
///
/// Pinned packages are exact: one version, one source URL, integrity hashes.
/// They are immutable once returned by a backend, and a platform's full set
/// is sorted by `(manager, name)` before it is stored in a
/// [`PlatformLock`](crate::lockfile::PlatformLock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedPackage {
    /// Package name.
    pub name: String,
    /// Solver family that produced this pin.
    pub manager: Manager,
    /// Exact resolved version.
    pub version: String,
    /// Download URL or channel location.
    pub url: String,
    /// Integrity hashes, as far as the backend reported them.
    #[serde(default, skip_serializing_if = "PackageHash::is_empty")]
    pub hash: PackageHash,
}
