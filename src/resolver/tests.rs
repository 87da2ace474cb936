use super::*;
use crate::envfile::EnvironmentFile;
use crate::filter::{InclusionPolicy, filter};
use crate::lockfile::LockDocument;
use crate::merge::merge;
use crate::models::{DependencyRecord, PackageHash, PinnedPackage};
use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic in-memory backend: pins every record at version 1.0.0,
/// failing on platforms it was told to fail on.
struct FakeBackend {
    manager: Manager,
    fail_platforms: BTreeSet<String>,
    calls: AtomicUsize,
}

impl FakeBackend {
    fn new(manager: Manager) -> Self {
        Self {
            manager,
            fail_platforms: BTreeSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(manager: Manager, platforms: &[&str]) -> Self {
        Self {
            manager,
            fail_platforms: platforms.iter().map(|p| p.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ResolverBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn manager(&self) -> Manager {
        self.manager
    }

    fn resolve<'a>(
        &'a self,
        records: &'a [&'a DependencyRecord],
        _channels: &'a [String],
        platform: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Vec<PinnedPackage>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail_platforms.contains(platform) {
                return Err(EnvlockError::ResolutionFailed {
                    platform: platform.to_string(),
                    unsatisfied: records.iter().map(|r| r.name.clone()).collect(),
                    reason: "unsatisfiable in fake index".to_string(),
                }
                .into());
            }

            Ok(records
                .iter()
                .map(|record| PinnedPackage {
                    name: record.name.clone(),
                    manager: record.manager,
                    version: "1.0.0".to_string(),
                    url: format!("https://fake.example/{}/{}-1.0.0", platform, record.name),
                    hash: PackageHash {
                        md5: Some(format!("md5-{}", record.name)),
                        sha256: None,
                    },
                })
                .collect())
        })
    }
}

fn spec_with(records: Vec<DependencyRecord>) -> Arc<FilteredSpec> {
    let file = EnvironmentFile {
        path: Path::new("environment.yml").to_path_buf(),
        category: "main".to_string(),
        channels: vec!["conda-forge".to_string()],
        platforms: vec![],
        dependencies: records,
    };
    let merged = merge(&[file]).unwrap();
    Arc::new(filter(&merged, &InclusionPolicy::default()))
}

fn platforms(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn backend_set(backends: Vec<Arc<dyn ResolverBackend>>) -> Arc<BackendSet> {
    Arc::new(BackendSet::from_backends(backends))
}

#[tokio::test]
async fn resolves_all_platforms_independently() {
    let filtered = spec_with(vec![
        DependencyRecord::new("tzcode", Manager::Conda, None, "*"),
        DependencyRecord::new("requests", Manager::Pip, None, "==2.31.0"),
    ]);
    let backends = backend_set(vec![
        Arc::new(FakeBackend::new(Manager::Conda)),
        Arc::new(FakeBackend::new(Manager::Pip)),
    ]);

    let outcomes = resolve_all(
        filtered,
        &platforms(&["linux-64", "osx-64"]),
        backends,
        &MultiProgress::new(),
    )
    .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(PlatformOutcome::is_ok));
    // Outcomes keep request order regardless of completion order.
    assert_eq!(outcomes[0].platform, "linux-64");
    assert_eq!(outcomes[1].platform, "osx-64");

    let lock = outcomes[0].result.as_ref().unwrap();
    let names: Vec<&str> = lock.packages().iter().map(|p| p.name.as_str()).collect();
    // Conda packages sort before pip packages.
    assert_eq!(names, vec!["tzcode", "requests"]);
}

#[tokio::test]
async fn one_platform_failure_does_not_abort_siblings() {
    let filtered = spec_with(vec![DependencyRecord::new("tzcode", Manager::Conda, None, "*")]);
    let backends = backend_set(vec![Arc::new(FakeBackend::failing_on(
        Manager::Conda,
        &["linux-64"],
    ))]);

    let outcomes = resolve_all(
        filtered,
        &platforms(&["linux-64", "osx-64"]),
        backends,
        &MultiProgress::new(),
    )
    .await;

    assert!(!outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());

    match outcomes[0].result.as_ref().unwrap_err() {
        EnvlockError::ResolutionFailed {
            platform,
            unsatisfied,
            ..
        } => {
            assert_eq!(platform, "linux-64");
            assert_eq!(unsatisfied, &["tzcode"]);
        }
        other => panic!("expected ResolutionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_backend_only_fails_platforms_needing_it() {
    // Records are conda-only; the pip backend is absent entirely and the
    // conda backend works, so resolution must still succeed.
    let filtered = spec_with(vec![DependencyRecord::new("tzcode", Manager::Conda, None, "*")]);
    let backends = backend_set(vec![Arc::new(FakeBackend::new(Manager::Conda))]);

    let outcomes =
        resolve_all(filtered, &platforms(&["linux-64"]), backends, &MultiProgress::new()).await;
    assert!(outcomes[0].is_ok());
}

#[tokio::test]
async fn missing_backend_fails_when_records_need_it() {
    let filtered = spec_with(vec![DependencyRecord::new("requests", Manager::Pip, None, "*")]);
    let backends = backend_set(vec![Arc::new(FakeBackend::new(Manager::Conda))]);

    let outcomes =
        resolve_all(filtered, &platforms(&["linux-64"]), backends, &MultiProgress::new()).await;
    match outcomes[0].result.as_ref().unwrap_err() {
        EnvlockError::BackendUnavailable { backend, .. } => assert_eq!(backend, "pip"),
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn backend_not_invoked_for_empty_manager_subset() {
    let filtered = spec_with(vec![DependencyRecord::new("tzcode", Manager::Conda, None, "*")]);
    let conda = Arc::new(FakeBackend::new(Manager::Conda));
    let pip = Arc::new(FakeBackend::new(Manager::Pip));
    let backends = backend_set(vec![
        conda.clone() as Arc<dyn ResolverBackend>,
        pip.clone() as Arc<dyn ResolverBackend>,
    ]);

    resolve_all(filtered, &platforms(&["linux-64"]), backends, &MultiProgress::new()).await;

    assert_eq!(conda.calls.load(Ordering::SeqCst), 1);
    assert_eq!(pip.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_resolution_is_byte_identical() {
    let filtered = spec_with(vec![
        DependencyRecord::new("tzcode", Manager::Conda, None, "*"),
        DependencyRecord::new("zlib", Manager::Conda, None, ">=1.2"),
    ]);

    let mut rendered = Vec::new();
    for _ in 0..2 {
        let backends = backend_set(vec![Arc::new(FakeBackend::new(Manager::Conda))]);
        let outcomes = resolve_all(
            Arc::clone(&filtered),
            &platforms(&["linux-64"]),
            backends,
            &MultiProgress::new(),
        )
        .await;
        let lock = outcomes[0].result.as_ref().unwrap();
        rendered.push(LockDocument::build(&[lock], &filtered).to_yaml().unwrap());
    }

    assert_eq!(rendered[0], rendered[1]);
}
