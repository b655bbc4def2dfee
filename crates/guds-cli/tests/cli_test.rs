//! Integration tests for the guds binary
//!
//! These run the built binary against argument errors and the credentials
//! template, none of which need a GeoServer.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn guds_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("guds");
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(guds_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("GUDS_URL")
        .env_remove("GUDS_GEOSERVER_USERNAME")
        .env_remove("GUDS_GEOSERVER_PASSWORD")
        .output()
        .expect("Failed to execute command")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_write_json_creates_template() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["--write_json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = std::fs::read_to_string(dir.path().join("geoserver.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    for key in ["url", "remote_username", "geoserver_username", "geoserver_password", "pem", "data"] {
        assert_eq!(parsed[key], "", "{} should be blank", key);
    }
}

#[test]
fn test_write_json_bypass_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("geoserver.json");
    std::fs::write(&path, "{\"url\":\"http://old\"}").unwrap();

    let output = run(dir.path(), &["--write_json", "-y", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["written"], true);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("http://old"));
}

#[test]
fn test_unknown_basin_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["-f", "snow.nc", "-b", "amazon"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("amazon"));
}

#[test]
fn test_unknown_data_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["-f", "snow.nc", "-b", "kings", "-t", "raster"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("raster"));
}

#[test]
fn test_missing_files_fails_before_credentials() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["-b", "kings"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No files to upload"));
}

#[test]
fn test_missing_credentials_file() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["-f", "snow.nc", "-b", "kings"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("File not found"));
    assert!(err.contains("geoserver.json"));
}

#[test]
fn test_blank_template_reports_missing_url() {
    let dir = TempDir::new().unwrap();
    assert!(run(dir.path(), &["--write_json"]).status.success());

    let output = run(dir.path(), &["-f", "snow.nc", "-b", "kings"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Missing credential: url"));
    assert!(err.contains("GUDS_URL"));
}

#[test]
fn test_version_exits_cleanly() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["--version"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
