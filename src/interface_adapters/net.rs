use crate::domain::{MatchSnapshot, Role, ShotVector};
use crate::interface_adapters::protocol::{ClientMessage, RoleDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_conn_id;
use crate::use_cases::{GameEvent, MatchHandle};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    EventsClosed,
    SnapshotsClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn snapshot_serializer(
    mut snapshot_rx: broadcast::Receiver<MatchSnapshot>,
    snapshot_bytes_tx: broadcast::Sender<Utf8Bytes>,
) {
    // Serialize each snapshot once and broadcast the shared bytes.
    loop {
        match snapshot_rx.recv().await {
            Ok(snapshot) => {
                let msg = ServerMessage::GameState(snapshot.into());
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize snapshot");
                        continue;
                    }
                };
                let _ = snapshot_bytes_tx.send(Utf8Bytes::from(txt));
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "snapshot serializer lagged; skipping to latest");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("snapshot channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_snapshot_serializer(game: &MatchHandle) {
    tokio::spawn(snapshot_serializer(
        game.snapshot_tx.subscribe(),
        game.snapshot_bytes_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let game = state.game.clone();
    ws.on_upgrade(move |socket| {
        let conn_id = next_conn_id();
        let span = info_span!("conn", conn_id, role = tracing::field::Empty);
        handle_socket(socket, game, conn_id).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, game: MatchHandle, conn_id: u64) {
    let mut ctx = match bootstrap_connection(&mut socket, &game, conn_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    info!("client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    dropped_commands: u64,
    lag_recovery_count: u64,
}

impl ConnStats {
    fn record_out(&mut self, bytes: usize) {
        self.msgs_out += 1;
        self.bytes_out += bytes as u64;
    }
}

struct LogThrottle {
    events_full: Instant,
    invalid_input: Instant,
    snapshot_lag: Instant,
}

impl LogThrottle {
    fn new() -> Self {
        let past = Instant::now() - LOG_THROTTLE;
        Self {
            events_full: past,
            invalid_input: past,
            snapshot_lag: past,
        }
    }
}

struct ConnCtx {
    conn_id: u64,
    span: Span,
    event_tx: mpsc::Sender<GameEvent>,
    snapshot_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    latest_rx: watch::Receiver<MatchSnapshot>,
    stats: ConnStats,
    throttle: LogThrottle,
    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    game: &MatchHandle,
    conn_id: u64,
) -> Result<ConnCtx, NetError> {
    // Subscribe before the first await so no snapshot is missed.
    let snapshot_bytes_rx = game.snapshot_bytes_tx.subscribe();
    let latest_rx = game.latest_tx.subscribe();

    let mut stats = ConnStats::default();
    // Clone out of the watch so the borrow is not held across the send.
    let initial = latest_rx.borrow().clone();
    let bytes = send_message(socket, &ServerMessage::GameState(initial.into())).await?;
    stats.record_out(bytes);

    Ok(ConnCtx {
        conn_id,
        span: Span::current(),
        event_tx: game.event_tx.clone(),
        snapshot_bytes_rx,
        latest_rx,
        stats,
        throttle: LogThrottle::new(),
        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Fire-and-forget commands; a full queue drops the command like any other rejection.
fn try_relay(
    conn_id: u64,
    event_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    stats: &mut ConnStats,
    last_events_full: &mut Instant,
) -> Result<LoopControl, NetError> {
    match event_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            stats.dropped_commands += 1;
            if should_log(last_events_full) {
                warn!(conn_id, "event channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::EventsClosed),
    }
}

async fn register_role(
    socket: &mut WebSocket,
    conn_id: u64,
    span: &Span,
    event_tx: &mpsc::Sender<GameEvent>,
    requested: RoleDto,
    stats: &mut ConnStats,
) -> Result<LoopControl, NetError> {
    let (reply, reply_rx) = oneshot::channel();
    event_tx
        .send(GameEvent::RegisterRole {
            conn_id,
            role: Role::from(requested),
            reply,
        })
        .await
        .map_err(|_| NetError::EventsClosed)?;
    let result = reply_rx.await.map_err(|_| NetError::EventsClosed)?;

    let msg = match result {
        Ok(role) => {
            let role = RoleDto::from(role);
            span.record("role", tracing::field::debug(role));
            ServerMessage::RegistrationSuccess { role }
        }
        Err(err) => ServerMessage::RegistrationFailed {
            role: requested,
            reason: err.reason().to_string(),
        },
    };

    match send_message(socket, &msg).await {
        Ok(bytes) => {
            stats.record_out(bytes);
            Ok(LoopControl::Continue)
        }
        Err(err) => {
            warn!(error = ?err, "failed to send registration result");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let conn_id = ctx.conn_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        span,
        event_tx,
        snapshot_bytes_rx,
        latest_rx,
        stats,
        throttle,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    socket,
                    incoming,
                    conn_id,
                    span,
                    event_tx,
                    stats,
                    throttle,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            snapshot_msg = snapshot_bytes_rx.recv() => {
                match snapshot_msg {
                    Ok(bytes) => match forward_snapshot_bytes(bytes, socket, stats).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut throttle.snapshot_lag) {
                            warn!(missed = n, "snapshots lagged; sending latest");
                        }

                        // Every snapshot is complete, so the latest one resyncs the client.
                        stats.lag_recovery_count += 1;
                        let latest = latest_rx.borrow().clone();
                        match send_message(socket, &ServerMessage::GameState(latest.into())).await {
                            Ok(bytes) => {
                                stats.record_out(bytes);
                                false
                            }
                            Err(err) => {
                                warn!(error = ?err, "failed to send lag recovery snapshot");
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::SnapshotsClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(conn_id, event_tx, stats).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    conn_id: u64,
    span: &Span,
    event_tx: &mpsc::Sender<GameEvent>,
    stats: &mut ConnStats,
    throttle: &mut LogThrottle,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                stats.msgs_in += 1;
                stats.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::RegisterRole(payload)) => {
                        register_role(socket, conn_id, span, event_tx, payload.role, stats).await
                    }
                    Ok(ClientMessage::Shoot(payload)) => match ShotVector::try_from(payload) {
                        Ok(shot) => try_relay(
                            conn_id,
                            event_tx,
                            GameEvent::Shoot { conn_id, shot },
                            stats,
                            &mut throttle.events_full,
                        ),
                        Err(reason) => {
                            // Malformed shots are dropped without telling the client.
                            stats.dropped_commands += 1;
                            if should_log(&mut throttle.invalid_input) {
                                warn!(conn_id, ?reason, "invalid shot payload; dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Ok(ClientMessage::RequestRestart) => try_relay(
                        conn_id,
                        event_tx,
                        GameEvent::RequestRestart { conn_id },
                        stats,
                        &mut throttle.events_full,
                    ),
                    Err(parse_err) => {
                        stats.invalid_json += 1;
                        if should_log(&mut throttle.invalid_input) {
                            warn!(
                                conn_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if stats.invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(conn_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(conn_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_snapshot_bytes(
    snapshot: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = snapshot.len();
    match socket
        .send(Message::Text(snapshot))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            stats.record_out(bytes_len);
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send snapshot");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(
    conn_id: u64,
    event_tx: &mpsc::Sender<GameEvent>,
    stats: &ConnStats,
) -> Result<(), NetError> {
    // Always report; the match ignores connections that held no slot.
    event_tx
        .send(GameEvent::Disconnect { conn_id })
        .await
        .map_err(|_| NetError::EventsClosed)?;

    debug!(
        conn_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        dropped_commands = stats.dropped_commands,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(conn_id, "client disconnected");
    Ok(())
}
