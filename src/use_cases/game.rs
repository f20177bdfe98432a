use super::session::Session;
use super::types::GameEvent;
use crate::domain::MatchSnapshot;
use crate::domain::tuning::RinkTuning;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

/// Single owner of the match. Connection events and fixed ticks are handled one at a time,
/// so every mutation runs to completion before the next begins.
pub async fn match_task(
    mut event_rx: mpsc::Receiver<GameEvent>,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    latest_tx: watch::Sender<MatchSnapshot>,
    tick_interval: Duration,
    tuning: RinkTuning,
) {
    let mut session = Session::new(tuning);
    publish(&session, &snapshot_tx, &latest_tx);

    // Drive the fixed-step physics loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                let Some(ev) = ev else {
                    // Every sender is gone; nobody can reach this match anymore.
                    info!("event channel closed; match task exiting");
                    break;
                };
                if handle_event(&mut session, ev) {
                    publish(&session, &snapshot_tx, &latest_tx);
                }
            }
            _ = interval.tick() => {
                if session.tick().changed {
                    publish(&session, &snapshot_tx, &latest_tx);
                }
            }
        }
    }
}

// Applies one connection event. Returns true when a broadcast is due.
fn handle_event(session: &mut Session, ev: GameEvent) -> bool {
    match ev {
        GameEvent::RegisterRole {
            conn_id,
            role,
            reply,
        } => {
            let result = session.register(conn_id, role);
            if let Err(err) = &result {
                info!(conn_id, ?role, reason = err.reason(), "registration failed");
            }
            // The connection may already be gone; the broadcast still happens.
            let _ = reply.send(result);
            true
        }
        GameEvent::Shoot { conn_id, shot } => match session.shoot(conn_id, shot) {
            Ok(_) => true,
            Err(reason) => {
                debug!(conn_id, ?reason, "shot rejected");
                false
            }
        },
        GameEvent::RequestRestart { conn_id } => match session.request_restart(conn_id) {
            Ok(()) => true,
            Err(reason) => {
                debug!(conn_id, ?reason, "restart ignored");
                false
            }
        },
        GameEvent::Disconnect { conn_id } => session.disconnect(conn_id),
    }
}

fn publish(
    session: &Session,
    snapshot_tx: &broadcast::Sender<MatchSnapshot>,
    latest_tx: &watch::Sender<MatchSnapshot>,
) {
    let snapshot = session.snapshot();
    latest_tx.send_replace(snapshot.clone());
    // No subscribers is fine; new connections read the latest snapshot.
    let _ = snapshot_tx.send(snapshot);
}
