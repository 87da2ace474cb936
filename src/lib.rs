//! envlock — reproducible lock files for multi-platform environments.
//!
//! envlock aggregates dependency declarations from one or more environment
//! definition files, classifies them into categories, filters them by user
//! intent (default vs. development vs. custom extras), dispatches
//! per-platform resolution to external solver backends, and renders the
//! resolved package sets into reproducible, template-named lock files.
//!
//! # Architecture Overview
//!
//! The pipeline has five stages, each its own module:
//!
//! 1. [`envfile`] — the input adapter: parses each environment file (YAML
//!    or TOML flavor) into flat dependency records tagged with a category.
//! 2. [`merge`] — unions records from all files into one [`merge::MergedSpec`],
//!    deduplicating identical declarations and surfacing conflicting
//!    constraints as hard errors.
//! 3. [`filter`] — projects the merged spec through the
//!    [`filter::InclusionPolicy`] derived from the CLI flags: `main` always,
//!    `dev` by default, custom categories on request.
//! 4. [`resolver`] — fans out one concurrent task per platform, routing each
//!    record to its manager's solver backend (conda-family or pip) and
//!    collecting pinned results. Platform failures are isolated: partial
//!    success is a valid run state.
//! 5. [`lockfile`] — renders platform locks into files named by a
//!    substitutable template, written atomically.
//!
//! # Key Properties
//!
//! - **Deterministic**: identical inputs against an unchanged solver
//!   snapshot re-render byte-identical lock files. No timestamps, no
//!   ordering dependent on task scheduling.
//! - **Atomic**: lock files are staged to a temp path and renamed into
//!   place; readers never observe partial content.
//! - **Isolated failures**: each platform resolves independently; one
//!   unsatisfiable platform doesn't abort the others, and the exit status
//!   reflects the aggregate.
//!
//! # Example
//!
//! ```bash
//! # Lock environment.yml for two platforms, excluding dev dependencies
//! envlock lock -f environment.yml -p linux-64 -p osx-arm64 --no-dev-dependencies
//! ```

// Pipeline stages
pub mod envfile;
pub mod filter;
pub mod lockfile;
pub mod merge;
pub mod resolver;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod utils;
