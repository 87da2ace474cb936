//! Integration tests for the `lock` command, driving the real binary.
//!
//! Configuration failures (missing files, bad templates, collisions) are
//! covered on every platform; end-to-end resolution runs use the fake
//! solver from `common` and are Unix-only.

mod common;

use common::{envlock, output_files, write_category_files};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn missing_environment_file_is_reported() {
    let dir = TempDir::new().unwrap();

    envlock(dir.path())
        .args(["lock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Environment file not found"));
}

#[test]
fn empty_dependency_set_is_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("environment.yml"),
        "channels:\n  - conda-forge\ndependencies: []\n",
    )
    .unwrap();

    envlock(dir.path())
        .args(["lock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to lock"));
}

#[test]
fn unknown_template_variable_fails_before_resolving() {
    let dir = TempDir::new().unwrap();
    write_category_files(dir.path());

    // No solver is configured or needed: the template is rejected before
    // any resolution work begins.
    envlock(dir.path())
        .args(["lock", "--filename-template", "lock-{flavor}.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown variable '{flavor}'"));

    assert!(output_files(dir.path()).is_empty());
}

#[test]
fn explicit_kind_rejects_colliding_filenames() {
    let dir = TempDir::new().unwrap();
    write_category_files(dir.path());

    envlock(dir.path())
        .args([
            "lock",
            "-k",
            "explicit",
            "-p",
            "linux-64",
            "-p",
            "osx-64",
            "--filename-template",
            "fixed.lock",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("renders 'fixed.lock' for multiple platforms"));

    assert!(output_files(dir.path()).is_empty());
}

#[test]
fn conflicting_constraints_across_files_are_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("environment.yml"),
        "dependencies:\n  - python 3.11\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("environment-b.yml"),
        "dependencies:\n  - python 3.12\n",
    )
    .unwrap();

    envlock(dir.path())
        .args([
            "lock",
            "-f",
            "environment.yml",
            "-f",
            "environment-b.yml",
            "-p",
            "linux-64",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflicting constraints"));
}

#[cfg(unix)]
mod with_fake_solver {
    use super::common::{envlock, output_files, write_category_files, write_fake_conda};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Run `envlock lock` against the category fixtures with the fake
    /// solver, returning the command for further configuration.
    fn lock_command(dir: &TempDir, extra_args: &[&str]) -> assert_cmd::Command {
        let solver = write_fake_conda(dir.path());
        let mut cmd = envlock(dir.path());
        cmd.env("ENVLOCK_CONDA_EXE", &solver);
        cmd.args([
            "lock",
            "-f",
            "environment.yml",
            "-f",
            "environment-dev.yml",
            "-f",
            "environment-mm.yml",
            "-p",
            "linux-64",
            "-k",
            "explicit",
            "--filename-template",
            "deps-{dev-dependencies}.lock",
        ]);
        cmd.args(extra_args);
        cmd
    }

    #[test]
    fn default_run_locks_main_and_dev_only() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &[]).assert().success();

        let files = output_files(dir.path());
        assert_eq!(files.len(), 1, "expected exactly one output file, got {files:?}");
        assert_eq!(files[0].file_name().unwrap(), "deps-true.lock");

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("tzcode"));
        assert!(content.contains("pixi"));
        assert!(!content.contains("micromamba"));
    }

    #[test]
    fn no_dev_dependencies_changes_filename_and_content() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &["--no-dev-dependencies"]).assert().success();

        let files = output_files(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "deps-false.lock");

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("tzcode"));
        assert!(!content.contains("pixi"));
    }

    #[test]
    fn requesting_custom_category_adds_it_without_changing_filename() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &["--category", "mm"]).assert().success();

        let files = output_files(dir.path());
        assert_eq!(files.len(), 1);
        // The template value tracks only the dev policy, not the extras.
        assert_eq!(files[0].file_name().unwrap(), "deps-true.lock");

        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("tzcode"));
        assert!(content.contains("pixi"));
        assert!(content.contains("micromamba"));
    }

    #[test]
    fn filter_categories_keeps_default_dev_inclusion() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &["--filter-categories"]).assert().success();

        let files = output_files(dir.path());
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("pixi"));
        assert!(!content.contains("micromamba"));
    }

    #[test]
    fn partial_failure_writes_surviving_platforms_and_exits_nonzero() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());
        let solver = write_fake_conda(dir.path());

        envlock(dir.path())
            .env("ENVLOCK_CONDA_EXE", &solver)
            .args([
                "lock",
                "-p",
                "linux-64",
                "-p",
                "broken-64",
                "-k",
                "explicit",
                "--filename-template",
                "lock-{platform}.lock",
            ])
            .assert()
            .failure()
            .stdout(predicate::str::contains("✓ linux-64"))
            .stdout(predicate::str::contains("✗ broken-64"))
            .stderr(predicate::str::contains("1 of 2 platform(s) failed"));

        assert!(dir.path().join("lock-linux-64.lock").exists());
        assert!(!dir.path().join("lock-broken-64.lock").exists());
    }

    #[test]
    fn unified_document_covers_all_platforms() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());
        let solver = write_fake_conda(dir.path());

        envlock(dir.path())
            .env("ENVLOCK_CONDA_EXE", &solver)
            .args(["lock", "-p", "linux-64", "-p", "osx-64"])
            .assert()
            .success();

        let lockfile = dir.path().join("envlock.yml");
        let content = fs::read_to_string(&lockfile).unwrap();
        assert!(content.contains("platform: linux-64"));
        assert!(content.contains("platform: osx-64"));
        assert!(content.contains("conda-forge"));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &[]).assert().success();
        let first = fs::read(dir.path().join("deps-true.lock")).unwrap();

        lock_command(&dir, &[]).assert().success();
        let second = fs::read(dir.path().join("deps-true.lock")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn no_stale_temp_files_after_rendering() {
        let dir = TempDir::new().unwrap();
        write_category_files(dir.path());

        lock_command(&dir, &[]).assert().success();

        let leftovers: Vec<_> = output_files(dir.path())
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }
}
