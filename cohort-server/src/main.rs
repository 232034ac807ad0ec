//! # Cohort Server
//!
//! Group-scoped identity service: registration, login, and profile access for
//! accounts that belong to tenant groups.
//!
//! The server is built on Axum and uses PostgreSQL for persistent storage, or
//! a process-local store in dev mode.

use std::path::PathBuf;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};
use clap::Parser;
use cohort_config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use cohort_server::{
    create_app,
    infra::startup::{Bootstrap, bind_listener, bootstrap},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cohort-server")]
#[command(about = "Group-scoped identity service")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Run against the in-memory store; implies dev mode
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
        force_dev_mode: cli.in_memory,
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if cli.in_memory {
        config.database.url = None;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let Bootstrap { state, pool } = bootstrap(&config).await?;
    let router = create_app(state).layer(cors_layer(&config));

    let listener = bind_listener(&config.server).await?;
    let addr = listener.local_addr().context("listener has no local address")?;

    info!(
        "Starting {} on {} ({} store)",
        config.app_name,
        addr,
        if pool.is_some() { "postgres" } else { "in-memory" }
    );

    serve_until_shutdown(listener, router, &config).await?;

    if let Some(pool) = pool {
        pool.close().await;
        info!("database pool closed");
    }
    info!("shutdown complete");
    Ok(())
}

/// Serve until Ctrl-C or SIGTERM, then drain in-flight requests for at most
/// the configured grace period.
async fn serve_until_shutdown(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    config: &Config,
) -> anyhow::Result<()> {
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")??;
        }
        _ = signalled_rx => {
            let grace = config.server.shutdown_grace;
            info!(grace_secs = grace.as_secs(), "shutdown signal received; draining connections");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => result.context("server task panicked")??,
                Err(_) => {
                    warn!("grace period elapsed; dropping remaining connections");
                    server.abort();
                }
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// Permissive in dev, allow-list in prod. Entries were validated at load.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let methods: Vec<Method> = config
        .cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(AllowHeaders::list(headers))
}
