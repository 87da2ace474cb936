use super::*;
use crate::envfile::EnvironmentFile;
use crate::filter::{InclusionPolicy, filter};
use crate::merge::merge;
use crate::models::{DependencyRecord, Manager, PackageHash, PinnedPackage};
use std::path::Path;

fn pinned(name: &str, manager: Manager, version: &str) -> PinnedPackage {
    PinnedPackage {
        name: name.to_string(),
        manager,
        version: version.to_string(),
        url: format!("https://example.com/{name}-{version}.conda"),
        hash: PackageHash {
            md5: Some(format!("md5-{name}")),
            sha256: None,
        },
    }
}

fn sample_filtered() -> crate::filter::FilteredSpec {
    let files = vec![EnvironmentFile {
        path: Path::new("environment.yml").to_path_buf(),
        category: "main".to_string(),
        channels: vec!["conda-forge".to_string()],
        platforms: vec![],
        dependencies: vec![DependencyRecord::new("tzcode", Manager::Conda, None, "*")],
    }];
    let spec = merge(&files).unwrap();
    filter(&spec, &InclusionPolicy::default())
}

#[test]
fn platform_lock_sorts_packages_canonically() {
    let lock = PlatformLock::new(
        "linux-64",
        vec![
            pinned("zlib", Manager::Conda, "1.3"),
            pinned("attrs", Manager::Pip, "23.1.0"),
            pinned("abc", Manager::Conda, "1.0"),
        ],
    );

    let order: Vec<(&str, Manager)> =
        lock.packages().iter().map(|p| (p.name.as_str(), p.manager)).collect();
    assert_eq!(
        order,
        vec![
            ("abc", Manager::Conda),
            ("zlib", Manager::Conda),
            ("attrs", Manager::Pip),
        ]
    );
}

#[test]
fn unified_document_round_trips_through_yaml() {
    let filtered = sample_filtered();
    let lock = PlatformLock::new("linux-64", vec![pinned("tzcode", Manager::Conda, "2023c")]);

    let document = LockDocument::build(&[&lock], &filtered);
    let yaml = document.to_yaml().unwrap();
    assert!(yaml.starts_with("# This lock file was generated by envlock."));

    let reparsed = LockDocument::parse(&yaml).unwrap();
    assert_eq!(reparsed, document);
}

#[test]
fn unified_document_records_per_platform_hashes() {
    let filtered = sample_filtered();
    let linux = PlatformLock::new("linux-64", vec![pinned("tzcode", Manager::Conda, "2023c")]);
    let osx = PlatformLock::new("osx-64", vec![pinned("tzcode", Manager::Conda, "2023c")]);

    let document = LockDocument::build(&[&linux, &osx], &filtered);
    assert_eq!(document.metadata.platforms, vec!["linux-64", "osx-64"]);
    assert_eq!(document.metadata.content_hash.len(), 2);
    assert_ne!(
        document.metadata.content_hash["linux-64"],
        document.metadata.content_hash["osx-64"]
    );
    assert_eq!(document.metadata.sources, vec!["environment.yml"]);
}

#[test]
fn rendering_is_deterministic() {
    let filtered = sample_filtered();
    let build = || {
        let lock = PlatformLock::new(
            "linux-64",
            vec![
                pinned("zlib", Manager::Conda, "1.3"),
                pinned("tzcode", Manager::Conda, "2023c"),
            ],
        );
        LockDocument::build(&[&lock], &filtered).to_yaml().unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn newer_version_is_rejected_on_parse() {
    let filtered = sample_filtered();
    let lock = PlatformLock::new("linux-64", vec![]);
    let mut document = LockDocument::build(&[&lock], &filtered);
    document.version = LOCKFILE_VERSION + 1;

    let yaml = serde_yaml::to_string(&document).unwrap();
    let err = LockDocument::parse(&yaml).unwrap_err();
    assert!(err.to_string().contains("newer than supported"));
}

#[test]
fn explicit_format_lists_conda_urls_with_md5() {
    let lock = PlatformLock::new(
        "linux-64",
        vec![
            pinned("tzcode", Manager::Conda, "2023c"),
            pinned("requests", Manager::Pip, "2.31.0"),
        ],
    );

    let rendered = render_explicit(&lock, "deadbeef");
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[1], "# platform: linux-64");
    assert_eq!(lines[2], "# input_hash: deadbeef");
    assert_eq!(lines[3], "@EXPLICIT");
    assert_eq!(lines[4], "https://example.com/tzcode-2023c.conda#md5-tzcode");
    assert_eq!(
        lines[5],
        "# pip requests @ https://example.com/requests-2.31.0.conda"
    );
}
