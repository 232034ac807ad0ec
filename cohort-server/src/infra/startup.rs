use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use cohort_config::{Config, ServerConfig};
use cohort_core::{
    IdentityService, MIGRATOR,
    crypto::CredentialCodec,
    infrastructure::{InMemoryStore, PostgresGroupDirectory, PostgresUsersRepository},
    model::{GroupId, GroupInfo},
    token::TokenService,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::infra::app_state::AppState;

/// Everything `main` needs to serve and later tear down.
#[derive(Debug)]
pub struct Bootstrap {
    pub state: AppState,
    pub pool: Option<PgPool>,
}

/// Wire the identity service against the configured backend.
pub async fn bootstrap(config: &Config) -> anyhow::Result<Bootstrap> {
    let credentials = Arc::new(
        CredentialCodec::new(&config.auth.password_pepper)
            .context("invalid password hashing parameters")?,
    );
    let ttl = Duration::try_days(config.auth.token_ttl_days).with_context(|| {
        format!("token lifetime of {} days is out of range", config.auth.token_ttl_days)
    })?;
    let tokens = Arc::new(
        TokenService::with_ttl(&config.auth.jwt_secret, ttl)
            .context("invalid token signing configuration")?,
    );

    if config.use_in_memory_store() {
        let store = Arc::new(InMemoryStore::new());
        seed_dev_groups(&store, config).await;
        let identity = IdentityService::new(store.clone(), store, credentials, tokens);
        return Ok(Bootstrap {
            state: AppState::new(identity, config.app_name.as_str()),
            pool: None,
        });
    }

    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is required for the PostgreSQL backend")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(
        max_connections = config.database.max_connections,
        "Successfully connected to PostgreSQL"
    );

    MIGRATOR
        .run(&pool)
        .await
        .context("database migration failed")?;
    info!("Database migrations applied");

    let identity = IdentityService::new(
        Arc::new(PostgresUsersRepository::new(pool.clone())),
        Arc::new(PostgresGroupDirectory::new(pool.clone())),
        credentials,
        tokens,
    );

    Ok(Bootstrap {
        state: AppState::new(identity, config.app_name.as_str()),
        pool: Some(pool),
    })
}

/// Bind the configured host and port. The host may be a name (`localhost`)
/// or a bare IPv4/IPv6 literal such as `::`.
pub async fn bind_listener(server: &ServerConfig) -> anyhow::Result<TcpListener> {
    TcpListener::bind((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("failed to bind {}", server.bind_address()))
}

async fn seed_dev_groups(store: &InMemoryStore, config: &Config) {
    if config.dev.open_groups.is_empty() {
        warn!("in-memory store has no groups; every registration will be rejected");
        return;
    }
    for id in &config.dev.open_groups {
        store.add_group(GroupInfo::open(GroupId(*id))).await;
        info!(group_id = %id, "seeded open group");
    }
}
