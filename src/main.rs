//! lcu-bridge daemon.
//!
//! Attaches to the running League client and logs the events it pushes on
//! the watched routes until interrupted or until the client shuts down.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use lcu_bridge::config::load_or_default;
use lcu_bridge::events::KindSet;
use lcu_bridge::lifecycle::{wait_for_signal, Shutdown, ShutdownReason};
use lcu_bridge::observability::{init_logging, metrics};
use lcu_bridge::{Bridge, BridgeConfig, Event, EventKind, EventRouter, Handler};

#[derive(Parser)]
#[command(name = "lcu-bridge")]
#[command(about = "Stream League client events to the log", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route to watch; `/a/` watches everything under `/a/`. Repeatable.
    #[arg(short, long = "route", default_value = "/")]
    routes: Vec<String>,

    /// Event kinds to watch (Create, Update, Delete or All)
    #[arg(short, long, value_delimiter = ',', default_value = "All")]
    kinds: Vec<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Keep running after the client announces its shutdown
    #[arg(long)]
    stay: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lcu-bridge starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    run(cli, config).await?;
    Ok(())
}

async fn run(cli: Cli, config: BridgeConfig) -> lcu_bridge::Result<()> {
    let shutdown = Shutdown::new();
    let router = Arc::new(EventRouter::new());

    let printer = Handler::new(|event: Event| async move {
        tracing::info!(
            uri = event.uri(),
            kind = %event.kind(),
            payload = %event.payload().map(ToString::to_string).unwrap_or_default(),
            "Event"
        );
        Ok(())
    });
    for route in &cli.routes {
        router.register_named(route, &cli.kinds, &printer)?;
    }

    if !cli.stay {
        let latch = shutdown.clone();
        let on_exit = Handler::new(move |_event: Event| {
            let latch = latch.clone();
            async move {
                latch.trigger(ShutdownReason::ServiceExit);
                Ok(())
            }
        });
        router.register(&config.events.shutdown_uri, KindSet::from(EventKind::Update), &on_exit)?;
    }

    {
        let latch = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            latch.trigger(ShutdownReason::Signal);
        });
    }

    tracing::info!(
        routes = ?cli.routes,
        kinds = ?cli.kinds,
        process_names = ?config.discovery.process_names,
        "Configuration loaded"
    );

    let mut bridge = Bridge::new(config, router);

    tokio::select! {
        started = bridge.start() => started?,
        reason = shutdown.triggered() => {
            tracing::info!(%reason, "Shutdown requested before the bridge was up");
            bridge.stop().await;
            return Ok(());
        }
    }

    if let Some(session) = bridge.session() {
        tracing::info!(pid = session.pid, port = session.port, "Attached to client");
    }

    let reason = shutdown.triggered().await;
    tracing::info!(%reason, "Shutting down");
    bridge.stop().await;
    Ok(())
}
