use barrister::config::{ConfigError, ServerConfig};
use barrister::IntPolicy;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn reads_full_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("barrister.toml");
    fs::write(
        &path,
        r#"
bind_address = "0.0.0.0:9000"
idl_path = "service.idl"
log_level = "debug"

[validation]
int_policy = "strict"
require_namespace = true

[client]
timeout_secs = 5
"#,
    )
    .unwrap();

    let config = ServerConfig::from_file(&path).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0:9000");
    assert_eq!(config.idl_path, Some(dir.path().join("service.idl")));
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.validation.int_policy, IntPolicy::Strict);
    assert!(config.validation.require_namespace);
    assert_eq!(config.client.timeout(), Duration::from_secs(5));

    let options = config.dispatcher_options();
    assert_eq!(options.int_policy, IntPolicy::Strict);
    assert!(options.validator.require_namespace);
}

#[test]
fn absolute_idl_path_is_kept() {
    let dir = tempdir().unwrap();
    let idl = dir.path().join("abs.idl");
    let path = dir.path().join("barrister.toml");
    fs::write(&path, format!("idl_path = {:?}\n", idl.display().to_string())).unwrap();

    let config = ServerConfig::from_file(&path).unwrap();
    assert_eq!(config.require_idl_path().unwrap(), idl.as_path());
}

#[test]
fn missing_idl_path_is_reported() {
    let config = ServerConfig::default();
    assert!(matches!(config.require_idl_path(), Err(ConfigError::MissingIdlPath)));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = ServerConfig::from_file(&path).unwrap_err();
    assert!(matches!(&err, ConfigError::Read { path: p, .. } if *p == path));
    assert!(err.to_string().starts_with("cannot read config"));
}

#[test]
fn malformed_toml_is_rejected() {
    let err = ServerConfig::from_toml_str("bind_address = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn unknown_int_policy_is_rejected() {
    let err = ServerConfig::from_toml_str("[validation]\nint_policy = \"loose\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn invalid_log_level_is_rejected() {
    let err = ServerConfig::from_toml_str("log_level = \"chatty\"").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn empty_bind_address_is_rejected() {
    let err = ServerConfig::from_toml_str("bind_address = \"  \"").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn toml_round_trip() {
    let config = ServerConfig::default()
        .with_bind_address("10.0.0.1:7000")
        .with_port(7100);
    let text = config.to_toml_string().unwrap();
    let back = ServerConfig::from_toml_str(&text).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.bind_address, "10.0.0.1:7100");
}
