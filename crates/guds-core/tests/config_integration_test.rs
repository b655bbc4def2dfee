//! Integration tests for layered credentials
//!
//! Precedence: CLI arguments > Environment variables > Credentials file > Defaults

use guds_core::config::{CliCredentialOverrides, ConfigSource, LayeredCredentials};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::Builder;

const ENV_KEYS: &[&str] = &[
    "GUDS_URL",
    "GUDS_GEOSERVER_USERNAME",
    "GUDS_GEOSERVER_PASSWORD",
    "GUDS_REMOTE_USERNAME",
    "GUDS_DATA",
    "GUDS_TIMEOUT_SECS",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn credentials_file() -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{"url":"http://file-host:8080/geoserver","remote_username":"ops","geoserver_username":"admin","geoserver_password":"from-file","pem":"~/.ssh/gs.pem","data":"/geoserver_data"}}"#
    )
    .unwrap();
    file
}

#[test]
fn test_default_credentials() {
    let layered = LayeredCredentials::with_defaults();
    assert_eq!(layered.url.value, "");
    assert_eq!(layered.url.source, ConfigSource::Default);
    assert!(layered.timeout_secs.value.is_none());
}

#[test]
#[serial]
fn test_file_values() {
    clear_env();
    let file = credentials_file();

    let layered = LayeredCredentials::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(layered.geoserver_password.value, "from-file");
    assert_eq!(layered.geoserver_password.source, ConfigSource::File);
    assert_eq!(layered.pem.value.as_deref(), Some("~/.ssh/gs.pem"));

    let creds = layered.resolve().unwrap();
    assert_eq!(creds.rest_url().unwrap().as_str(), "http://file-host:8080/geoserver/rest/");
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = credentials_file();
    env::set_var("GUDS_GEOSERVER_PASSWORD", "from-env");
    env::set_var("GUDS_TIMEOUT_SECS", "45");

    let layered = LayeredCredentials::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    assert_eq!(layered.geoserver_password.value, "from-env");
    assert_eq!(layered.geoserver_password.source, ConfigSource::Environment);
    assert_eq!(layered.timeout_secs.value, Some(45));
    assert_eq!(layered.geoserver_username.source, ConfigSource::File);
}

#[test]
#[serial]
fn test_invalid_env_timeout_is_ignored() {
    clear_env();
    env::set_var("GUDS_TIMEOUT_SECS", "soon");

    let layered = LayeredCredentials::with_defaults().load_from_env();
    clear_env();

    assert!(layered.timeout_secs.value.is_none());
    assert_eq!(layered.timeout_secs.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let file = credentials_file();
    env::set_var("GUDS_URL", "http://env-host/geoserver");

    let mut layered = LayeredCredentials::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    assert_eq!(layered.url.source, ConfigSource::Environment);

    layered.update_from_cli(CliCredentialOverrides {
        url: Some("http://cli-host/geoserver".to_string()),
        timeout_secs: Some(5),
    });

    assert_eq!(layered.url.source, ConfigSource::Cli);
    let creds = layered.resolve().unwrap();
    assert_eq!(creds.rest_url().unwrap().as_str(), "http://cli-host/geoserver/rest/");
    assert_eq!(creds.timeout().unwrap().as_secs(), 5);
}

#[test]
#[serial]
fn test_inspection_map_sources() {
    clear_env();
    let file = credentials_file();
    env::set_var("GUDS_DATA", "/env_data");

    let layered = LayeredCredentials::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    let map = layered.to_inspection_map();
    assert_eq!(map["data"], ("/env_data".to_string(), ConfigSource::Environment));
    assert_eq!(map["url"].1, ConfigSource::File);
    assert_eq!(map["geoserver_password"].0, "********");
    assert_eq!(map["timeout_secs"].0, "none");
    assert_eq!(map["pem"], ("~/.ssh/gs.pem".to_string(), ConfigSource::File));
}

#[test]
fn test_invalid_url_is_rejected() {
    let mut layered = LayeredCredentials::with_defaults();
    layered.url.update("not a url".to_string(), ConfigSource::Cli);
    layered.geoserver_username.update("admin".to_string(), ConfigSource::Cli);
    layered.geoserver_password.update("pw".to_string(), ConfigSource::Cli);

    assert!(layered.resolve().is_err());
}
