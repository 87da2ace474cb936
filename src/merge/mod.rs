//! The category merger: union of all source files into one [`MergedSpec`].
//!
//! Merging is a pure in-memory transform. Source files are visited in the
//! order the caller gave them — order only matters for conflict diagnostics,
//! the merged content itself is keyed and unordered by file. Within one
//! `(category, manager, name)` key, an identical constraint deduplicates
//! silently (extras are unioned); a different constraint is a hard
//! [`EnvlockError::DependencyConflict`] because silently preferring either
//! side could hide a mistake in the user's files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::core::EnvlockError;
use crate::envfile::EnvironmentFile;
use crate::models::{DependencyRecord, Manager};

/// Identity key for a record inside the merged spec.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecKey {
    pub category: String,
    pub manager: Manager,
    pub name: String,
}

impl SpecKey {
    fn of(record: &DependencyRecord) -> Self {
        Self {
            category: record.category.clone(),
            manager: record.manager,
            name: record.name.clone(),
        }
    }
}

/// The full union of dependency records across all source files.
///
/// Built once per invocation and read-only afterward; the filter projects
/// out of it without mutating it, so several filters with different policies
/// over one `MergedSpec` are independently reproducible.
#[derive(Debug, Clone, Default)]
pub struct MergedSpec {
    records: BTreeMap<SpecKey, DependencyRecord>,
    channels: Vec<String>,
    platforms: Vec<String>,
    sources: Vec<PathBuf>,
}

impl MergedSpec {
    /// All records in deterministic `(category, manager, name)` order.
    pub fn records(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.records.values()
    }

    /// Number of merged records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were merged at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The distinct categories present, in sorted order.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.records.keys().map(|k| k.category.as_str()).collect()
    }

    /// Channels from all source files, first-seen order, deduplicated.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Platforms requested by the source files, first-seen order.
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Paths of the source files this spec was merged from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Append machine-level default channels after the file-declared ones.
    ///
    /// Part of spec construction, before the spec is shared with any
    /// worker; duplicates of file-declared channels are ignored.
    pub fn add_default_channels<I: IntoIterator<Item = String>>(&mut self, channels: I) {
        for channel in channels {
            if !self.channels.contains(&channel) {
                self.channels.push(channel);
            }
        }
    }
}

/// Merge parsed environment files into one [`MergedSpec`].
///
/// # Errors
///
/// Returns [`EnvlockError::DependencyConflict`] when two files declare the
/// same `(category, manager, name)` with different constraint strings.
pub fn merge(files: &[EnvironmentFile]) -> Result<MergedSpec> {
    let mut spec = MergedSpec::default();
    let mut seen_channels = BTreeSet::new();
    let mut seen_platforms = BTreeSet::new();

    for file in files {
        spec.sources.push(file.path.clone());

        for channel in &file.channels {
            if seen_channels.insert(channel.clone()) {
                spec.channels.push(channel.clone());
            }
        }
        for platform in &file.platforms {
            if seen_platforms.insert(platform.clone()) {
                spec.platforms.push(platform.clone());
            }
        }

        for record in &file.dependencies {
            let key = SpecKey::of(record);
            match spec.records.get_mut(&key) {
                None => {
                    spec.records.insert(key, record.clone());
                }
                Some(existing) if existing.constraint == record.constraint => {
                    // Same constraint from another file: dedup, keep the
                    // union of any pip extras.
                    existing.extras.extend(record.extras.iter().cloned());
                }
                Some(existing) => {
                    return Err(EnvlockError::DependencyConflict {
                        name: record.name.clone(),
                        manager: record.manager.to_string(),
                        category: record.category.clone(),
                        existing: existing.constraint.clone(),
                        incoming: record.constraint.clone(),
                    }
                    .into());
                }
            }
        }
    }

    debug!(
        files = files.len(),
        records = spec.len(),
        categories = spec.categories().len(),
        "merged environment files"
    );

    Ok(spec)
}
