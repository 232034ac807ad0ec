use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{non_blank, parse_bool, parse_csv};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub dev: FileDevConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_grace_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_pepper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ttl_days: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDevConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub app_name: Option<String>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub shutdown_grace_secs: Option<u64>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub jwt_secret: Option<String>,
    pub auth_password_pepper: Option<String>,
    pub token_ttl_days: Option<i64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allowed_methods: Option<Vec<String>>,
    pub cors_allowed_headers: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
    pub dev_open_groups: Option<Vec<String>>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));
        let number = |key: &str| var(key).and_then(|s| s.trim().parse().ok());

        Self {
            config_path: var(crate::constants::CONFIG_PATH_ENV).map(PathBuf::from),
            app_name: var("APP_NAME"),
            server_host: var("SERVER_HOST"),
            server_port: number("SERVER_PORT").or_else(|| number("GRPC_PORT")),
            shutdown_grace_secs: var("SHUTDOWN_GRACE_SECS").and_then(|s| s.trim().parse().ok()),
            database_url: var("DATABASE_URL").or_else(|| var("DSN")),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|s| s.trim().parse().ok()),
            jwt_secret: var("JWT_SECRET"),
            auth_password_pepper: var("AUTH_PASSWORD_PEPPER"),
            token_ttl_days: var("TOKEN_TTL_DAYS").and_then(|s| s.trim().parse().ok()),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS").map(|raw| parse_csv(&raw)),
            cors_allowed_methods: var("CORS_ALLOWED_METHODS").map(|raw| parse_csv(&raw)),
            cors_allowed_headers: var("CORS_ALLOWED_HEADERS").map(|raw| parse_csv(&raw)),
            dev_mode: var("DEV_MODE").and_then(|raw| parse_bool(&raw)),
            dev_open_groups: var("DEV_OPEN_GROUPS").map(|raw| parse_csv(&raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn grpc_port_and_dsn_are_fallbacks() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("GRPC_PORT", "6000"),
            ("DSN", "postgres://localhost/cohort"),
        ]));
        assert_eq!(env.server_port, Some(6000));
        assert_eq!(env.database_url.as_deref(), Some("postgres://localhost/cohort"));
    }

    #[test]
    fn primary_keys_win_over_fallbacks() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "7000"),
            ("GRPC_PORT", "6000"),
            ("DATABASE_URL", "postgres://primary/db"),
            ("DSN", "postgres://fallback/db"),
        ]));
        assert_eq!(env.server_port, Some(7000));
        assert_eq!(env.database_url.as_deref(), Some("postgres://primary/db"));
    }

    #[test]
    fn blank_and_unparsable_values_are_unset() {
        let env = EnvConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "   "),
            ("SERVER_PORT", "eighty"),
            ("DEV_MODE", "yes"),
        ]));
        assert!(env.jwt_secret.is_none());
        assert!(env.server_port.is_none());
        assert_eq!(env.dev_mode, Some(true));
    }
}
