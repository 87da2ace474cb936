//! Lock documents: the durable output of a resolution run.
//!
//! A [`PlatformLock`] is one platform's pinned package set, produced by the
//! orchestrator. The renderer serializes platform locks into files in one
//! of two shapes:
//!
//! - the **unified** YAML document ([`LockDocument`]) covering one or more
//!   platforms, with metadata recording the per-platform content hash of the
//!   inputs, the channels, and the source file list;
//! - the **explicit** per-platform `@EXPLICIT` URL list, installable without
//!   a solver.
//!
//! Rendering is deterministic: packages are sorted by `(manager, name)`
//! inside each platform, platforms keep their request order, and no
//! timestamps or other run-dependent values are embedded. Resolving the
//! same filtered spec against the same solver snapshot re-renders the
//! identical bytes.
//!
//! Lock files are written atomically (temp file + rename, see
//! [`crate::utils::fs::atomic_write`]); a crash mid-run never leaves a
//! truncated or stale lock for a platform, and a platform that failed
//! resolution never gets a file at all.

pub mod template;

mod io;

pub use io::write_lock_file;
pub use template::{OutputKind, PlannedFile, RenderPlan, TemplateVars, expand, plan_outputs};

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::LOCKFILE_VERSION;
use crate::core::EnvlockError;
use crate::filter::FilteredSpec;
use crate::models::{Manager, PackageHash, PinnedPackage};

/// One platform's fully pinned resolution result.
///
/// Immutable after creation; the constructor sorts packages so that
/// identical resolver output always produces identical lock content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLock {
    /// Platform this lock was resolved for.
    pub platform: String,
    /// Pinned packages sorted by `(manager, name)`.
    packages: Vec<PinnedPackage>,
}

impl PlatformLock {
    /// Create a lock, sorting packages into canonical order.
    pub fn new(platform: impl Into<String>, mut packages: Vec<PinnedPackage>) -> Self {
        packages.sort_by(|a, b| (a.manager, &a.name).cmp(&(b.manager, &b.name)));
        Self {
            platform: platform.into(),
            packages,
        }
    }

    /// The pinned packages in canonical order.
    pub fn packages(&self) -> &[PinnedPackage] {
        &self.packages
    }
}

/// The unified lock document, serialized as YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDocument {
    /// Lock format version.
    pub version: u32,
    /// Provenance and staleness-checking metadata.
    pub metadata: LockMetadata,
    /// All pinned packages across the covered platforms.
    #[serde(rename = "package")]
    pub packages: Vec<LockedPackage>,
}

/// Metadata block of the unified document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Digest of the filtered input spec, per platform. Lets a consumer
    /// detect that the lock is stale relative to its environment files.
    pub content_hash: BTreeMap<String, String>,
    /// Channels the resolution drew from, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    /// Platforms covered by this document, in request order.
    pub platforms: Vec<String>,
    /// Environment files the spec was merged from.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// One pinned package entry in the unified document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    pub manager: Manager,
    pub platform: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "PackageHash::is_empty")]
    pub hash: PackageHash,
}

impl LockDocument {
    /// Build the unified document for a group of platform locks.
    ///
    /// `locks` must be in the platform request order of the planned file;
    /// that order is preserved in both the metadata and the package list.
    pub fn build(locks: &[&PlatformLock], filtered: &FilteredSpec) -> Self {
        let mut content_hash = BTreeMap::new();
        let mut platforms = Vec::with_capacity(locks.len());
        let mut packages = Vec::new();

        for lock in locks {
            platforms.push(lock.platform.clone());
            content_hash.insert(lock.platform.clone(), filtered.content_hash(&lock.platform));
            for package in lock.packages() {
                packages.push(LockedPackage {
                    name: package.name.clone(),
                    version: package.version.clone(),
                    manager: package.manager,
                    platform: lock.platform.clone(),
                    url: package.url.clone(),
                    hash: package.hash.clone(),
                });
            }
        }

        Self {
            version: LOCKFILE_VERSION,
            metadata: LockMetadata {
                content_hash,
                channels: filtered.channels().to_vec(),
                platforms,
                sources: filtered.sources().to_vec(),
            },
            packages,
        }
    }

    /// Serialize to the on-disk YAML form, including the header comment.
    pub fn to_yaml(&self) -> Result<String> {
        let mut content =
            String::from("# This lock file was generated by envlock. DO NOT EDIT.\n");
        content.push_str(&serde_yaml::to_string(self)?);
        Ok(content)
    }

    /// Parse a document previously produced by [`to_yaml`](Self::to_yaml).
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or a format version newer than this build
    /// supports.
    pub fn parse(content: &str) -> Result<Self> {
        let document: Self = serde_yaml::from_str(content).map_err(|e| EnvlockError::Other {
            message: format!("invalid lock document: {e}"),
        })?;

        if document.version > LOCKFILE_VERSION {
            return Err(EnvlockError::Other {
                message: format!(
                    "lock file version {} is newer than supported version {}; \
                     update envlock to read this file",
                    document.version, LOCKFILE_VERSION
                ),
            }
            .into());
        }

        Ok(document)
    }
}

/// Render one platform lock in the explicit `@EXPLICIT` format.
///
/// Conda packages become bare URLs (with a `#md5` fragment when the digest
/// is known); pip packages, which the explicit format has no native line
/// for, are emitted as `# pip` comment lines that installers of this format
/// recognize.
pub fn render_explicit(lock: &PlatformLock, content_hash: &str) -> String {
    let mut out = String::from("# Generated by envlock. DO NOT EDIT.\n");
    out.push_str(&format!("# platform: {}\n", lock.platform));
    out.push_str(&format!("# input_hash: {content_hash}\n"));
    out.push_str("@EXPLICIT\n");

    for package in lock.packages() {
        match package.manager {
            Manager::Conda => {
                out.push_str(&package.url);
                if let Some(md5) = &package.hash.md5 {
                    out.push('#');
                    out.push_str(md5);
                }
                out.push('\n');
            }
            Manager::Pip => {
                out.push_str(&format!("# pip {} @ {}\n", package.name, package.url));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests;
