//! toxscan-relay - analysis submission relay
//!
//! Accepts media uploads on `POST /api/audio/analyze` and forwards them to the
//! external analysis backend named by `backend_url` (CLI → ENV → TOML).
//! Without a backend every submission answers 503, unless demo data was
//! explicitly enabled.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use toxscan_common::config::{load_toml_config, resolve_backend_url};
use toxscan_common::ValidationPolicy;
use toxscan_relay::{build_router, AppState, BackendRelay};

#[derive(Debug, Parser)]
#[command(name = "toxscan-relay", version, about = "Relay media uploads to the analysis backend")]
struct Args {
    /// TOML configuration file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// External analysis backend base URL (overrides TOXSCAN_BACKEND_URL and TOML)
    #[arg(long)]
    backend_url: Option<String>,

    /// Listen host (overrides TOML)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides TOML)
    #[arg(long)]
    port: Option<u16>,

    /// Serve demo data when no backend is configured
    #[arg(long)]
    demo_fallback: bool,

    /// Log level directive (overrides TOML)
    #[arg(long, env = "TOXSCAN_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .init();

    // Build identification first, before anything that can stall
    info!(
        "Starting toxscan-relay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let backend_url = resolve_backend_url(args.backend_url.as_deref(), &toml_config);
    let demo_fallback = args.demo_fallback || toml_config.demo_fallback;

    match (&backend_url, demo_fallback) {
        (Some(url), _) => info!("Analysis backend: {}", url),
        (None, true) => {
            warn!("No analysis backend configured; serving DEMO data (demo_fallback enabled)")
        }
        (None, false) => {
            warn!("No analysis backend configured; submissions will answer 503 until one is set")
        }
    }

    let relay = BackendRelay::new(backend_url, demo_fallback)?;
    let state = AppState::new(relay, ValidationPolicy::default());
    let app = build_router(state);

    let host = args.host.unwrap_or(toml_config.listen.host);
    let port = args.port.unwrap_or(toml_config.listen.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("toxscan-relay listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
