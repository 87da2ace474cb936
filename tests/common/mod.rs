//! Shared helpers for the integration suite.
//!
//! Integration tests drive the real `envlock` binary with `assert_cmd`
//! inside a temp directory. Solver invocations are satisfied by a fake
//! conda-family executable written on the fly: it speaks just enough of the
//! dry-run JSON protocol to pin every requested spec at version 1.0.0, and
//! fails deterministically for the magic platform `broken-64`.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Build an `envlock` command running in `dir` with progress disabled.
pub fn envlock(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("envlock").expect("binary builds");
    cmd.current_dir(dir).env("ENVLOCK_NO_PROGRESS", "1");
    cmd
}

/// Write the three-category environment files used by the category matrix
/// tests: `tzcode` in main, `pixi` in dev, `micromamba` in the custom `mm`
/// category.
pub fn write_category_files(dir: &Path) -> Vec<PathBuf> {
    let main_file = dir.join("environment.yml");
    fs::write(
        &main_file,
        "channels:\n  - conda-forge\ndependencies:\n  - tzcode\n",
    )
    .unwrap();

    let dev_file = dir.join("environment-dev.yml");
    fs::write(
        &dev_file,
        "channels:\n  - conda-forge\ncategory: dev\ndependencies:\n  - pixi\n",
    )
    .unwrap();

    let mm_file = dir.join("environment-mm.yml");
    fs::write(
        &mm_file,
        "channels:\n  - conda-forge\ncategory: mm\ndependencies:\n  - micromamba\n",
    )
    .unwrap();

    vec![main_file, dev_file, mm_file]
}

/// Write a fake conda-family solver script and return its path.
///
/// The script pins every bare spec argument at 1.0.0 with a deterministic
/// URL and md5, mirroring the `create --dry-run --json` output shape. When
/// `CONDA_SUBDIR` is `broken-64` it reports an unsatisfiable-spec failure
/// instead.
#[cfg(unix)]
pub fn write_fake_conda(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-conda");
    fs::write(
        &script,
        r#"#!/bin/sh
if [ "$CONDA_SUBDIR" = "broken-64" ]; then
    printf '{"message": "nothing provides the requested specs", "packages": ["tzcode"]}\n'
    exit 1
fi

skip=0
specs=""
for arg in "$@"; do
    if [ "$skip" = 1 ]; then
        skip=0
        continue
    fi
    case "$arg" in
        --prefix|-c) skip=1 ;;
        create|--dry-run|--json|--override-channels) ;;
        *) specs="$specs $arg" ;;
    esac
done

out=""
for name in $specs; do
    entry=$(printf '{"name": "%s", "version": "1.0.0", "url": "https://fake.example/%s/%s-1.0.0.conda", "md5": "md5-%s"}' \
        "$name" "$CONDA_SUBDIR" "$name" "$name")
    if [ -z "$out" ]; then
        out="$entry"
    else
        out="$out, $entry"
    fi
done
printf '{"actions": {"LINK": [%s]}}\n' "$out"
"#,
    )
    .unwrap();

    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).unwrap();

    script
}

/// List non-hidden files in a directory, skipping the fixtures the tests
/// themselves wrote.
pub fn output_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let is_fixture = name.starts_with("environment")
                || name == "fake-conda"
                || name.ends_with(".toml");
            (path.is_file() && !is_fixture).then_some(path)
        })
        .collect();
    files.sort();
    files
}
