//! TextFrame API server
//!
//! Serves device key registration, nonce issuance and the signed `/search`
//! action over HTTP.
//!
//! Usage:
//!   textframe-api --port 8000 --db textframe.db --transcripts ./transcripts

use std::{path::PathBuf, sync::Arc, time::Duration};
use anyhow::{Context, Result};
use clap::Parser;
use textframe_api::{build_router, AppState, KeyRegistry, NonceBook, TranscriptIndex};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "textframe-api")]
#[command(about = "TextFrame device authentication and search API")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to the SQLite key registry
    #[arg(long, default_value = "textframe-api.db")]
    db: PathBuf,

    /// Directory of `<video_id>.json` transcripts
    #[arg(long, default_value = "transcripts")]
    transcripts: PathBuf,

    /// Seconds an issued nonce stays valid
    #[arg(long, default_value = "300")]
    nonce_ttl_secs: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("TextFrame API starting...");
    anyhow::ensure!(args.nonce_ttl_secs > 0, "--nonce-ttl-secs must be greater than zero");

    let registry = KeyRegistry::open(&args.db)
        .with_context(|| format!("failed to open key registry at {}", args.db.display()))?;
    info!(
        "Key registry at {} ({} devices)",
        args.db.display(),
        registry.count()?
    );

    let ttl = Duration::from_secs(args.nonce_ttl_secs);
    let state = AppState::new(
        registry,
        NonceBook::new(ttl),
        TranscriptIndex::new(&args.transcripts),
    );
    info!("Serving transcripts from {}", args.transcripts.display());

    let nonces = Arc::clone(&state.nonces);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl);
        loop {
            interval.tick().await;
            let purged = nonces.purge_expired().await;
            if purged > 0 {
                debug!("Purged {} expired nonces", purged);
            }
        }
    });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("TextFrame API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down...");
    }
}
