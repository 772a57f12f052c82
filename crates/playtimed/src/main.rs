//! playtimed - per-user playtime accounting service
//!
//! This is the main entry point for the playtimed service.
//! It wires together all the components:
//! - Configuration loading
//! - Counter store initialization
//! - Playtime service (ledger, daily reset, limit enforcement)
//! - Tokio clock and timers
//! - NDJSON host bridge on stdin/stdout

use anyhow::{Context, Result};
use clap::Parser;
use playtime_api::{Event, EventPayload, HostMessage};
use playtime_config::load_config_or_default;
use playtime_core::{CoreEvent, PlaytimeService};
use playtime_host_api::TimerFired;
use playtime_host_tokio::{EventWriter, HostReader, SystemClock, TokioScheduler};
use playtime_store::SqliteKvStore;
use playtime_util::{
    default_config_path, PLAYTIME_CONFIG_ENV, PLAYTIME_DATA_DIR_ENV, STORE_FILENAME,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncWrite, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// playtimed - Per-user playtime accounting with a daily cap
#[derive(Parser, Debug)]
#[command(name = "playtimed")]
#[command(about = "Per-user playtime accounting with a daily cap", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/playtime/config.toml)
    #[arg(short, long, env = PLAYTIME_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override
    #[arg(short, long, env = PLAYTIME_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    core: PlaytimeService,
    timers: mpsc::UnboundedReceiver<TimerFired>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            check_interval_secs = settings.limits.check_interval.as_secs(),
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(STORE_FILENAME);
        let store = Arc::new(
            SqliteKvStore::open(&db_path)
                .with_context(|| format!("Failed to open store {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let (scheduler, timers) = TokioScheduler::new();
        let core = PlaytimeService::new(
            settings.limits,
            store,
            Arc::new(SystemClock),
            Arc::new(scheduler),
        );

        if core.is_healthy() {
            debug!("Store health check passed");
        } else {
            warn!(db_path = %db_path.display(), "Store failed its health check, writes may not persist");
        }

        Ok(Self { core, timers })
    }

    async fn run(mut self) -> Result<()> {
        let mut host = HostReader::new(BufReader::new(tokio::io::stdin()));
        let mut events = EventWriter::new(tokio::io::stdout());

        for event in self.core.start() {
            emit(&mut events, event).await;
        }

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                Some(fired) = self.timers.recv() => {
                    for event in self.core.on_timer(fired) {
                        emit(&mut events, event).await;
                    }
                }

                message = host.next_message() => match message {
                    Ok(Some(HostMessage::Shutdown)) => {
                        info!("Host requested shutdown");
                        break;
                    }
                    Ok(Some(message)) => self.handle_host_message(message, &mut events).await,
                    Ok(None) => {
                        info!("Host closed stdin, shutting down");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Host bridge failed, shutting down");
                        break;
                    }
                },
            }
        }

        info!("Shutting down playtimed");
        self.core.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_host_message<W: AsyncWrite + Unpin>(
        &mut self,
        message: HostMessage,
        events: &mut EventWriter<W>,
    ) {
        match message {
            HostMessage::BecameActive { user, name } => {
                self.core.on_became_active(user, &name);
            }
            HostMessage::BecameInactive { user } => {
                self.core.on_became_inactive(user);
            }
            HostMessage::Command {
                sender,
                label,
                args,
            } => match self.core.handle_command(&sender, &label, args.as_slice()) {
                Some(lines) => {
                    let reply = Event::new(EventPayload::CommandReply { sender, lines });
                    if let Err(e) = events.send(&reply).await {
                        warn!(error = %e, "Failed to send command reply");
                    }
                }
                None => debug!(label = %label, "Ignoring command that is not ours"),
            },
            HostMessage::Shutdown => {}
        }
    }
}

fn to_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::LimitExceeded {
            user,
            max_daily_minutes,
            daily_minutes,
            message,
            ..
        } => EventPayload::LimitExceeded {
            user,
            max_daily_minutes,
            daily_minutes,
            message,
        },
        CoreEvent::DailyReset {
            date,
            players_reset,
        } => EventPayload::DailyReset {
            date,
            players_reset,
        },
    }
}

async fn emit<W: AsyncWrite + Unpin>(events: &mut EventWriter<W>, event: CoreEvent) {
    if let CoreEvent::LimitExceeded {
        user, display_name, ..
    } = &event
    {
        info!(user = %user, name = %display_name, "Asking host to end session");
    }

    if let Err(e) = events.send(&Event::new(to_payload(event))).await {
        warn!(error = %e, "Failed to send event to host");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the event stream, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "playtimed starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}
