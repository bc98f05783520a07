//! ClassHub CLI entry point.
//!
//! This binary is the composition root for the entire system.
//! Responsibilities:
//!
//! 1. **Parse configuration** — load `classhub.toml` and validate it.
//! 2. **Wire observability** — configure `tracing-subscriber` with a JSON
//!    layer and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure** — create concrete instances of the
//!    adapters (`GithubRestClient`, `MemoryStore`) and inject them into the
//!    bootstrap pipeline and webhook dispatcher.
//! 4. **Select trigger mode** — `serve` binds the webhook endpoint and runs
//!    the event loop; `event` synthesises one delivery from a payload file
//!    and dispatches it once (development mode).

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use classroom::{ClassroomStore, DeliveryId, PlatformClient, Username};
use github::GithubRestClient;
use listener::{decode_event, Dispatcher};
use provisioning::BootstrapPipeline;
use store::MemoryStore;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "classhub", version, about = "ClassHub course-management backend")]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "classhub.toml",
        help = "Path to the configuration file"
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the webhook endpoint.
    Serve,
    /// Dispatch one event payload from a file, then exit.
    Event {
        /// Event-type label, as the platform would send it in the event
        /// header (e.g. `push`).
        #[arg(long)]
        event_type: String,
        /// Path to a JSON payload file.
        #[arg(long)]
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli.config)?;
    let provider = telemetry::init(config.telemetry.otlp_endpoint.as_deref())?;

    let result = run(cli.command, &config).await;
    telemetry::shutdown(provider);
    result
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn ClassroomStore> = Arc::new(MemoryStore::new());
    let platform: Arc<dyn PlatformClient> = Arc::new(GithubRestClient::with_base_url(
        config.github.admin_token.clone(),
        config.github.api_url.clone(),
    )?);
    let bot_login = Username::new(config.github.bot_login.clone())
        .context("github.bot_login must not be empty")?;

    let pipeline = Arc::new(BootstrapPipeline::new(store, platform, bot_login));
    let dispatcher = Arc::new(Dispatcher::new(pipeline));

    match command {
        Commands::Serve => {
            listener::serve(
                config.webhook.bind_addr,
                dispatcher,
                config.webhook.secret.as_str(),
            )
            .await
            .context("webhook listener failed")?;
        }
        Commands::Event {
            event_type,
            payload,
        } => {
            let body = std::fs::read(&payload)
                .with_context(|| format!("reading payload from {}", payload.display()))?;
            let event = decode_event(&event_type, &body)?;
            dispatcher.dispatch(DeliveryId::new_random(), event).await?;
            info!(event_type, "event dispatched");
        }
    }
    Ok(())
}
