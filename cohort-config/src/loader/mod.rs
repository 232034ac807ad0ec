pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;
use url::Url;
use uuid::Uuid;

use self::error::ConfigLoadError;
use crate::{
    constants::{
        DEFAULT_APP_NAME, DEFAULT_CONFIG_LOCATIONS, DEFAULT_MAX_CONNECTIONS,
        DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_SHUTDOWN_GRACE_SECS,
        DEFAULT_TOKEN_TTL_DAYS, DEV_JWT_SECRET, default_cors_headers, default_cors_methods,
    },
    models::{
        AuthConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig, DevConfig, ServerConfig,
        sources::{EnvConfig, FileConfig},
    },
    util::non_blank,
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Force dev mode on regardless of file or environment.
    pub force_dev_mode: bool,
}

/// Fully composed configuration plus anything the operator should hear about.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_dev_mode(mut self) -> Self {
        self.options.force_dev_mode = true;
        self
    }

    /// Load `.env`, then compose file and process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let mut load = self.load_with_env(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Compose against an explicit environment snapshot. Leaves the process
    /// environment and `.env` files alone.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        self.compose_config(file_config, env, config_path)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS.iter().find(|c| c.exists()) {
                Some(found) => (found.clone(), false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        debug!("loaded configuration from {}", path.display());
        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                "No cohort.toml detected; falling back to environment variables",
                format!("Point {} at a config file to pin settings", crate::constants::CONFIG_PATH_ENV),
            );
        }

        let FileConfig {
            app_name: file_app_name,
            server: file_server,
            database: file_database,
            auth: file_auth,
            cors: file_cors,
            dev: file_dev,
            dev_mode: file_dev_mode,
        } = file_config.unwrap_or_default();

        let dev_mode =
            self.options.force_dev_mode || env.dev_mode.or(file_dev_mode).unwrap_or(false);

        let server = ServerConfig {
            host: env
                .server_host
                .or(non_blank(file_server.host))
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: env
                .server_port
                .or(file_server.port)
                .unwrap_or(DEFAULT_SERVER_PORT),
            shutdown_grace: Duration::from_secs(
                env.shutdown_grace_secs
                    .or(file_server.shutdown_grace_secs)
                    .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
            ),
        };

        let database_url = env.database_url.or(non_blank(file_database.url));
        if let Some(url) = database_url.as_deref() {
            Url::parse(url).map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        }
        let database = DatabaseConfig {
            url: database_url,
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        let jwt_secret = match env.jwt_secret.or(non_blank(file_auth.jwt_secret)) {
            Some(secret) => secret,
            None if dev_mode => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigGuardRailError::MissingJwtSecret.into()),
        };
        let auth = AuthConfig {
            jwt_secret,
            password_pepper: env
                .auth_password_pepper
                .or(file_auth.password_pepper)
                .unwrap_or_default(),
            token_ttl_days: env
                .token_ttl_days
                .or(file_auth.token_ttl_days)
                .unwrap_or(DEFAULT_TOKEN_TTL_DAYS),
        };

        let cors = CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .or(file_cors.allowed_origins)
                .unwrap_or_default(),
            allowed_methods: env
                .cors_allowed_methods
                .or(file_cors.allowed_methods)
                .unwrap_or_else(default_cors_methods),
            allowed_headers: env
                .cors_allowed_headers
                .or(file_cors.allowed_headers)
                .unwrap_or_else(default_cors_headers),
        };

        let dev = DevConfig {
            open_groups: parse_group_ids(env.dev_open_groups.unwrap_or(file_dev.groups))?,
        };

        let config = Config {
            app_name: env
                .app_name
                .or(non_blank(file_app_name))
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            server,
            database,
            auth,
            cors,
            dev_mode,
            dev,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded: false,
            },
        };

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_group_ids(raw: Vec<String>) -> Result<Vec<Uuid>, ConfigLoadError> {
    raw.into_iter()
        .map(|value| {
            Uuid::parse_str(value.trim()).map_err(|_| ConfigLoadError::InvalidDevGroup { value })
        })
        .collect()
}
