// Channel wiring for the single match task.

use crate::domain::MatchSnapshot;
use crate::domain::tuning::RinkTuning;
use crate::use_cases::GameEvent;
use crate::use_cases::game::match_task;
use crate::use_cases::session::Session;
use axum::extract::ws::Utf8Bytes;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Shared configuration for spawning the match.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// Capacity for inbound connection events.
    pub event_channel_capacity: usize,
    /// Capacity for broadcast snapshots.
    pub snapshot_broadcast_capacity: usize,
    /// Fixed tick interval for the physics loop.
    pub tick_interval: Duration,
    /// Gameplay constants.
    pub tuning: RinkTuning,
}

/// Channels connected to the running match.
#[derive(Clone)]
pub struct MatchHandle {
    /// Sender for connection events into the match task.
    pub event_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw snapshots.
    pub snapshot_tx: broadcast::Sender<MatchSnapshot>,
    /// Broadcast sender for serialized snapshots.
    pub snapshot_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest snapshot for new and lagging connections.
    pub latest_tx: watch::Sender<MatchSnapshot>,
}

impl MatchHandle {
    /// Creates the channels and spawns the authoritative match task.
    pub fn spawn(settings: MatchSettings) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<GameEvent>(settings.event_channel_capacity);
        let (snapshot_tx, _snapshot_rx) =
            broadcast::channel::<MatchSnapshot>(settings.snapshot_broadcast_capacity);
        let (snapshot_bytes_tx, _snapshot_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(settings.snapshot_broadcast_capacity);
        let (latest_tx, _latest_rx) =
            watch::channel::<MatchSnapshot>(Session::new(settings.tuning).snapshot());

        tokio::spawn(match_task(
            event_rx,
            snapshot_tx.clone(),
            latest_tx.clone(),
            settings.tick_interval,
            settings.tuning,
        ));

        Self {
            event_tx,
            snapshot_tx,
            snapshot_bytes_tx,
            latest_tx,
        }
    }
}
