use std::{collections::HashMap, io::Write, time::Duration};

use cohort_config::{
    ConfigGuardRailError, ConfigLoadError, ConfigLoader, EnvConfig, constants::DEV_JWT_SECRET,
};
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> EnvConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::from_lookup(move |key| map.get(key).cloned())
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

const SECRET: &str = "0123456789abcdef0123456789abcdef";

#[test]
fn production_defaults_apply_when_only_required_keys_are_set() {
    let load = ConfigLoader::new()
        .load_with_env(env(&[
            ("DATABASE_URL", "postgres://cohort@localhost/cohort"),
            ("JWT_SECRET", SECRET),
            ("AUTH_PASSWORD_PEPPER", "pepper"),
        ]))
        .expect("config");

    let config = load.config;
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 50051);
    assert_eq!(config.server.shutdown_grace, Duration::from_secs(5));
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.auth.token_ttl_days, 30);
    assert_eq!(config.app_name, "cohort");
    assert!(!config.dev_mode);
    assert!(!config.use_in_memory_store());
}

#[test]
fn missing_secret_outside_dev_mode_is_fatal() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[("DATABASE_URL", "postgres://localhost/cohort")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::MissingJwtSecret)
    ));
}

#[test]
fn missing_database_outside_dev_mode_is_fatal() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[("JWT_SECRET", SECRET)]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::MissingDatabaseUrl)
    ));
}

#[test]
fn dev_mode_falls_back_to_memory_and_builtin_secret() {
    let load = ConfigLoader::new()
        .load_with_env(env(&[
            ("DEV_MODE", "true"),
            ("DEV_OPEN_GROUPS", "0190f5b8-52a1-7d6e-9a51-4f3c2b1a0e9d"),
        ]))
        .expect("dev config");

    assert!(load.config.use_in_memory_store());
    assert_eq!(load.config.auth.jwt_secret, DEV_JWT_SECRET);
    assert_eq!(load.config.dev.open_groups.len(), 1);
    assert!(
        load.warnings
            .iter()
            .any(|w| w.message.contains("JWT_SECRET is unset"))
    );
}

#[test]
fn forced_dev_mode_overrides_environment() {
    let load = ConfigLoader::new()
        .with_dev_mode()
        .load_with_env(env(&[("DEV_MODE", "false")]))
        .expect("forced dev config");
    assert!(load.config.dev_mode);
}

#[test]
fn file_values_are_overridden_by_environment() {
    let file = config_file(
        r#"
        app_name = "tenant-identity"

        [server]
        host = "127.0.0.1"
        port = 7000

        [database]
        url = "postgres://file-host/cohort"
        max_connections = 4

        [auth]
        jwt_secret = "file-secret-file-secret-file-secret"
        token_ttl_days = 7
        "#,
    );

    let load = ConfigLoader::new()
        .with_config_path(file.path())
        .load_with_env(env(&[("SERVER_PORT", "9000")]))
        .expect("config");

    let config = load.config;
    assert_eq!(config.app_name, "tenant-identity");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.database.max_connections, 4);
    assert_eq!(config.auth.token_ttl_days, 7);
    assert_eq!(config.metadata.config_path.as_deref(), Some(file.path()));
}

#[test]
fn dev_groups_from_file_are_parsed() {
    let file = config_file(
        r#"
        dev_mode = true

        [dev]
        groups = ["0190f5b8-52a1-7d6e-9a51-4f3c2b1a0e9d", "not-a-uuid"]
        "#,
    );

    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::InvalidDevGroup { value } if value == "not-a-uuid"));
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn malformed_config_file_is_a_parse_error() {
    let file = config_file("[server\nport = ");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .load_with_env(EnvConfig::default())
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}

#[test]
fn non_positive_token_ttl_is_rejected() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[("DEV_MODE", "1"), ("TOKEN_TTL_DAYS", "0")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidTokenTtl(0))
    ));
}

#[test]
fn wildcard_cors_is_rejected_in_production() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[
            ("DATABASE_URL", "postgres://localhost/cohort"),
            ("JWT_SECRET", SECRET),
            ("CORS_ALLOWED_ORIGINS", "*"),
        ]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::DangerousCorsWildcard)
    ));
}

#[test]
fn oversized_token_ttl_is_rejected() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[("DEV_MODE", "1"), ("TOKEN_TTL_DAYS", "200000000000000")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidTokenTtl(200000000000000))
    ));
}

#[test]
fn ten_year_token_ttl_is_the_ceiling() {
    let load = ConfigLoader::new()
        .load_with_env(env(&[("DEV_MODE", "1"), ("TOKEN_TTL_DAYS", "3650")]))
        .expect("ttl at the ceiling");
    assert_eq!(load.config.auth.token_ttl_days, 3650);

    let err = ConfigLoader::new()
        .load_with_env(env(&[("DEV_MODE", "1"), ("TOKEN_TTL_DAYS", "3651")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidTokenTtl(3651))
    ));
}

#[test]
fn origin_without_scheme_is_rejected() {
    let err = ConfigLoader::new()
        .load_with_env(env(&[
            ("DEV_MODE", "1"),
            ("CORS_ALLOWED_ORIGINS", "https://app.example.com,localhost:3000"),
        ]))
        .unwrap_err();
    match err {
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidCorsConfig { reason }) => {
            assert!(reason.contains("localhost:3000"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn well_formed_origins_are_accepted() {
    let load = ConfigLoader::new()
        .load_with_env(env(&[
            ("DATABASE_URL", "postgres://localhost/cohort"),
            ("JWT_SECRET", SECRET),
            (
                "CORS_ALLOWED_ORIGINS",
                "https://app.example.com, http://localhost:3000",
            ),
        ]))
        .expect("origins are valid");
    assert_eq!(
        load.config.cors.allowed_origins,
        vec!["https://app.example.com", "http://localhost:3000"]
    );
}
