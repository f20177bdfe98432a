// Framework bootstrap for the curling server runtime.

use crate::domain::tuning::RinkTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::spawn_snapshot_serializer;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MatchHandle, MatchSettings};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, static_root: PathBuf) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();

    if !static_root.is_dir() {
        tracing::warn!(static_root = %static_root.display(), "static root missing; assets will 404");
    }
    let router = app(state, &static_root);

    tracing::info!(%address, static_root = %static_root.display(), "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, router).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config::static_root()).await
}

fn build_state() -> Arc<AppState> {
    let tuning = RinkTuning::default();
    tracing::debug!(
        tick_ms = config::TICK_INTERVAL.as_millis(),
        stones_per_team = tuning.stones_per_team,
        "match configured"
    );

    // The one match this process hosts; lives until shutdown.
    let game = MatchHandle::spawn(MatchSettings {
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        snapshot_broadcast_capacity: config::SNAPSHOT_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
        tuning,
    });
    spawn_snapshot_serializer(&game);

    Arc::new(AppState { game })
}
