//! toxscan - submit audio/video for toxicity analysis
//!
//! Talks to a running toxscan-relay (`--relay-url`, `TOXSCAN_RELAY_URL`, TOML,
//! or the relay's default listen address). Reports go to stdout, logs and
//! progress to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use toxscan_common::config::{load_toml_config, resolve_relay_url};
use toxscan_common::human_time::{format_elapsed, format_size_mb};
use toxscan_common::ValidationPolicy;
use toxscan_client::error::OfferError;
use toxscan_client::sniff::read_first_offered;
use toxscan_client::{
    AnalysisSession, CaptureController, CaptureError, Microphone, RelayClient, SubmitOutcome,
};

#[derive(Debug, Parser)]
#[command(
    name = "toxscan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about = "Submit audio or video for toxicity analysis"
)]
struct Cli {
    /// TOML configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Relay base URL (overrides TOXSCAN_RELAY_URL and TOML)
    #[arg(long, global = true)]
    relay_url: Option<String>,

    /// Log level directive (overrides TOML)
    #[arg(long, global = true, env = "TOXSCAN_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a media file; with several files only the first is used
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Record from the microphone, then analyze the recording
    Record {
        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,

        /// Input device name (default: system default input)
        #[arg(long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = load_toml_config(cli.config.as_deref())?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?),
        )
        .init();

    info!(
        "Starting toxscan v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let relay_url = resolve_relay_url(cli.relay_url.as_deref(), &toml_config);
    info!("Relay: {}", relay_url);
    let backend = Arc::new(RelayClient::new(relay_url)?);

    let device_name = match &cli.command {
        Command::Record { device, .. } => device.clone(),
        Command::Analyze { .. } => None,
    };
    let tick = Duration::from_millis(toml_config.client.tick_interval_ms.max(1));
    let capture = CaptureController::new(
        Arc::new(Microphone::new(device_name)),
        ValidationPolicy::default(),
    )
    .with_tick_interval(tick);
    let mut session = AnalysisSession::new(capture, backend);

    match cli.command {
        Command::Analyze { files } => select_files(&mut session, &files).await?,
        Command::Record { seconds, .. } => record(&mut session, seconds).await?,
    }

    match session.submit().await {
        SubmitOutcome::Succeeded(_) => {
            if let Some(report) = session.report().await {
                print!("{}", report);
            }
            Ok(())
        }
        SubmitOutcome::Failed(e) => bail!("{} [{}]", e.user_message(), e.kind()),
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => bail!("Nothing to analyze"),
    }
}

async fn select_files(session: &mut AnalysisSession, files: &[PathBuf]) -> Result<()> {
    let policy = session.capture().policy().clone();

    let candidate = match read_first_offered(files, &policy).await {
        Ok(Some(candidate)) => candidate,
        Ok(None) => bail!("No file given"),
        Err(OfferError::Rejected(e)) => bail!("{}", CaptureError::from(e).user_message()),
        Err(e) => return Err(e.into()),
    };

    let selected = if files.len() == 1 {
        session.capture_mut().select_from_picker(candidate)
    } else {
        session.capture_mut().select_from_drop(vec![candidate])
    };
    if let Err(e) = selected {
        bail!("{}", e.user_message());
    }

    if let Some(asset) = session.capture().active_asset() {
        eprintln!(
            "Selected {} ({}, {})",
            asset.name(),
            asset.mime_type(),
            format_size_mb(asset.size_bytes())
        );
    }
    Ok(())
}

async fn record(session: &mut AnalysisSession, seconds: Option<u64>) -> Result<()> {
    if let Err(e) = session.start_recording().await {
        bail!("{} ({})", e.user_message(), e);
    }
    let mut elapsed = session
        .capture()
        .elapsed_updates()
        .context("Recording did not start")?;
    eprintln!("Recording... press Ctrl-C to stop");

    let limit = async {
        match seconds {
            Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(limit);

    loop {
        tokio::select! {
            _ = &mut limit => break,
            _ = tokio::signal::ctrl_c() => break,
            changed = elapsed.changed() => {
                if changed.is_err() {
                    break;
                }
                eprint!("\r{}", format_elapsed(*elapsed.borrow()));
            }
        }
    }
    eprintln!();

    match session.stop_recording().await {
        Ok(Some(asset)) => {
            eprintln!(
                "Recorded {} ({})",
                asset.name(),
                format_size_mb(asset.size_bytes())
            );
            Ok(())
        }
        Ok(None) => bail!("No recording was captured"),
        Err(e) => bail!("{} ({})", e.user_message(), e),
    }
}
