//! Integration tests for the mirrorkit binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mirrorkit() -> Command {
    let mut cmd = Command::cargo_bin("mirrorkit").unwrap();
    cmd.env_remove("MIRRORKIT_INTERVAL")
        .env_remove("MIRRORKIT_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn setup_dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let path_src = temp.path().join("src");
    let path_dst = temp.path().join("dst");
    fs::create_dir_all(path_src.join("sub")).unwrap();
    fs::create_dir_all(&path_dst).unwrap();
    fs::write(path_src.join("a.txt"), "alpha").unwrap();
    fs::write(path_src.join("sub").join("b.txt"), "beta").unwrap();
    fs::write(path_dst.join("stale.txt"), "old").unwrap();
    (temp, path_src, path_dst)
}

#[test]
fn test_help() {
    mirrorkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--logfile"));
}

#[test]
fn test_missing_arguments_is_usage_error() {
    mirrorkit().assert().code(2);
}

#[test]
fn test_source_not_directory_fails_at_startup() {
    let temp = TempDir::new().unwrap();
    let path_dst = temp.path().join("dst");
    fs::create_dir_all(&path_dst).unwrap();

    mirrorkit()
        .current_dir(temp.path())
        .arg(temp.path().join("missing"))
        .arg(&path_dst)
        .arg("--once")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: Source is not a directory"));
}

#[test]
fn test_overlapping_roots_fail_at_startup() {
    let (temp, path_src, _) = setup_dirs();

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(path_src.join("sub"))
        .arg("--once")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("overlap"));
}

#[test]
fn test_once_mirrors_and_logs() {
    let (temp, path_src, path_dst) = setup_dirs();
    let path_log = temp.path().join("logs").join("run.log");

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(&path_dst)
        .args(["-i", "5", "--once"])
        .arg("--logfile")
        .arg(&path_log)
        .assert()
        .success()
        .stdout(predicate::str::contains("with sync interval of 5 seconds"))
        .stdout(predicate::str::contains("Sync complete!"));

    assert_eq!(fs::read_to_string(path_dst.join("a.txt")).unwrap(), "alpha");
    assert_eq!(
        fs::read_to_string(path_dst.join("sub").join("b.txt")).unwrap(),
        "beta"
    );
    assert!(!path_dst.join("stale.txt").exists());

    let txt_log = fs::read_to_string(&path_log).unwrap();
    assert!(txt_log.contains(" INFO: Sync starts.."));
    assert!(txt_log.contains(" INFO: Deleting"));
    assert!(txt_log.contains("Copied 1 files, deleted 1 files, modified 0 files."));
}

#[test]
fn test_log_file_from_env() {
    let (temp, path_src, path_dst) = setup_dirs();

    mirrorkit()
        .current_dir(temp.path())
        .env("MIRRORKIT_LOG_FILE", "env.log")
        .arg(&path_src)
        .arg(&path_dst)
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logging to the file env.log"));

    assert!(temp.path().join("env.log").is_file());
}

#[test]
fn test_dry_run_leaves_destination_untouched() {
    let (temp, path_src, path_dst) = setup_dirs();

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(&path_dst)
        .args(["--dry-run", "--once"])
        .assert()
        .success();

    assert!(!path_dst.join("a.txt").exists());
    assert!(path_dst.join("stale.txt").exists());
}

#[test]
fn test_excluded_entries_are_left_alone() {
    let (temp, path_src, path_dst) = setup_dirs();
    fs::write(path_src.join("skip.tmp"), "tmp").unwrap();
    fs::write(path_dst.join("keep.tmp"), "mine").unwrap();

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(&path_dst)
        .args(["-e", "*.tmp", "--once"])
        .assert()
        .success();

    assert!(!path_dst.join("skip.tmp").exists());
    assert!(path_dst.join("keep.tmp").exists());
    assert!(path_dst.join("a.txt").exists());
}

#[test]
fn test_quit_from_stdin_after_first_pass() {
    let (temp, path_src, path_dst) = setup_dirs();

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(&path_dst)
        .args(["-i", "30"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quitting program.."));

    assert!(path_dst.join("a.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_warnings_are_logged_and_summarized() {
    use std::os::unix::net::UnixListener;

    let (temp, path_src, path_dst) = setup_dirs();
    drop(UnixListener::bind(path_src.join("sock")).unwrap());
    let path_log = temp.path().join("run.log");

    mirrorkit()
        .current_dir(temp.path())
        .arg(&path_src)
        .arg(&path_dst)
        .arg("--once")
        .arg("--logfile")
        .arg(&path_log)
        .assert()
        .success();

    let txt_log = fs::read_to_string(&path_log).unwrap();
    assert!(txt_log.contains(" WARNING: Special file skipped: "));
    assert!(txt_log.contains(" WARNING: Total warnings: 1"));
    assert!(!path_dst.join("sock").exists());
}
