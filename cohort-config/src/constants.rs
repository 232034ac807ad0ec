use std::path::PathBuf;
use std::sync::LazyLock;

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 50051;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;
pub const DEFAULT_APP_NAME: &str = "cohort";
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Signing secret used when dev mode is on and none is configured.
pub const DEV_JWT_SECRET: &str = "cohort-dev-mode-signing-secret-do-not-deploy";

pub const MIN_SECRET_LENGTH: usize = 32;

pub const CONFIG_PATH_ENV: &str = "COHORT_CONFIG";

pub static DEFAULT_CONFIG_LOCATIONS: LazyLock<Vec<PathBuf>> = LazyLock::new(|| {
    vec![
        PathBuf::from("cohort.toml"),
        PathBuf::from("config/cohort.toml"),
    ]
});

pub fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PATCH", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_cors_headers() -> Vec<String> {
    ["authorization", "content-type"]
        .into_iter()
        .map(String::from)
        .collect()
}
