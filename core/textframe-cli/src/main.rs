//! TextFrame host driver
//!
//! Plays the role of the extension host: delivers install/update lifecycle
//! events to the authentication client and runs authenticated actions.
//!
//! Usage:
//!   textframe lifecycle install
//!   textframe search --video https://youtu.be/dQw4w9WgXcQ "never gonna"

use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use textframe_auth::{video_id_from_url, ClientConfig, ClientContext, LifecycleEvent};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "textframe")]
#[command(about = "TextFrame device identity and authenticated search")]
struct Args {
    /// API server base URL
    #[arg(long, global = true, env = "TEXTFRAME_API_URL")]
    api_url: Option<String>,

    /// Key store file
    #[arg(long, global = true, env = "TEXTFRAME_STORE_PATH")]
    store: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deliver a host lifecycle event
    Lifecycle {
        #[arg(value_enum)]
        event: Event,
    },
    /// Bring the identity to a registered state
    Provision,
    /// Show the stored identity
    Status,
    /// Fetch a nonce and print the headers for one authenticated request
    Headers,
    /// Search a video's transcript
    Search {
        /// Video id or YouTube URL
        #[arg(long)]
        video: String,
        query: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Event {
    Install,
    Update,
}

impl From<Event> for LifecycleEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::Install => LifecycleEvent::Install,
            Event::Update => LifecycleEvent::Update,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(path) = args.store {
        config.store_path = Some(path);
    }
    let ctx = ClientContext::open(config).context("failed to set up client")?;
    info!("Using API at {}", ctx.config().api_base_url);

    match args.command {
        Command::Lifecycle { event } => {
            let outcome = ctx.on_lifecycle_event(event.into()).await;
            println!("{:?}", outcome);
            if !outcome.is_ok() {
                bail!("device setup deferred to the next lifecycle event");
            }
        }
        Command::Provision => {
            let outcome = ctx.ensure_identity_provisioned().await;
            println!("{:?}", outcome);
            if !outcome.is_ok() {
                bail!("device setup deferred");
            }
        }
        Command::Status => {
            let identity = ctx.identity();
            match identity.device_id().await? {
                Some(id) => println!("device id:  {}", id),
                None => println!("device id:  (none)"),
            }
            match identity.signing_key().await? {
                Some(key) => println!("public key: {}", key.public_key().to_base64()),
                None => println!("public key: (none)"),
            }
        }
        Command::Headers => {
            let headers = ctx.signer().build_auth_headers_for_device().await?;
            for (name, value) in headers.pairs() {
                println!("{}: {}", name, value);
            }
        }
        Command::Search { video, query } => {
            let video_id = video_id_from_url(&video)
                .with_context(|| format!("not a video id or URL: {video}"))?;
            let positions = ctx.search().try_search(&video_id, &query).await?;
            println!("{}", serde_json::to_string(&positions)?);
        }
    }

    Ok(())
}
