use axum::http::{HeaderValue, Method, header::HeaderName};
use thiserror::Error;
use url::Url;

use crate::constants::{MAX_TOKEN_TTL_DAYS, MIN_SECRET_LENGTH};
use crate::models::{Config, CorsConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("JWT_SECRET must be set when DEV_MODE is false")]
    MissingJwtSecret,
    #[error("DATABASE_URL must be set when DEV_MODE is false")]
    MissingDatabaseUrl,
    #[error("TOKEN_TTL_DAYS must be between 1 and 3650, got {0}")]
    InvalidTokenTtl(i64),
    #[error("DATABASE_MAX_CONNECTIONS must be at least 1")]
    InvalidPoolSize,
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
    #[error("invalid CORS configuration: {reason}")]
    InvalidCorsConfig { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if !(1..=MAX_TOKEN_TTL_DAYS).contains(&config.auth.token_ttl_days) {
        return Err(ConfigGuardRailError::InvalidTokenTtl(config.auth.token_ttl_days));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigGuardRailError::InvalidPoolSize);
    }

    if config.dev_mode {
        if config.auth.is_dev_secret() {
            warnings.push_with_hint(
                "DEV_MODE is on and JWT_SECRET is unset; tokens are signed with a built-in secret",
                "Set JWT_SECRET before exposing this instance",
            );
        }
        if config.database.url.is_none() {
            warnings.push(
                "No DATABASE_URL configured; accounts live in process memory and vanish on restart",
            );
        }
    } else {
        if config.database.url.is_none() {
            return Err(ConfigGuardRailError::MissingDatabaseUrl);
        }
        if config.cors.is_wildcard_included() {
            return Err(ConfigGuardRailError::DangerousCorsWildcard);
        }
        if config.auth.jwt_secret.len() < MIN_SECRET_LENGTH {
            warnings.push_with_hint(
                format!("JWT_SECRET is shorter than {MIN_SECRET_LENGTH} characters"),
                "Generate one with `openssl rand -base64 48`",
            );
        }
        if config.auth.password_pepper.is_empty() {
            warnings.push(
                "AUTH_PASSWORD_PEPPER not set; password digests rely on salts alone",
            );
        }
    }

    validate_cors(&config.cors)?;

    Ok(warnings)
}

fn validate_cors(cors: &CorsConfig) -> Result<(), ConfigGuardRailError> {
    for origin in &cors.allowed_origins {
        if !is_valid_origin(origin) {
            return Err(ConfigGuardRailError::InvalidCorsConfig {
                reason: format!("invalid origin `{origin}` in CORS_ALLOWED_ORIGINS"),
            });
        }
    }

    for method in &cors.allowed_methods {
        Method::from_bytes(method.as_bytes()).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!("invalid HTTP method `{method}` in CORS_ALLOWED_METHODS"),
            }
        })?;
    }

    for header in &cors.allowed_headers {
        HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
            ConfigGuardRailError::InvalidCorsConfig {
                reason: format!("invalid header name `{header}` in CORS_ALLOWED_HEADERS"),
            }
        })?;
    }

    Ok(())
}

/// `*`, or a bare `scheme://host[:port]` that can be sent back as a header.
fn is_valid_origin(origin: &str) -> bool {
    if origin.trim() == "*" {
        return true;
    }
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some()
        && HeaderValue::from_str(origin).is_ok()
}
