use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tile_merge_server::constants::{DEFAULT_COLS, DEFAULT_ROWS, HIGH_SPAWN_PROBABILITY};
use tile_merge_server::engine::{GameEngine, GameEngineOptions, MoveOutcome};
use tile_merge_server::input::InputMapper;
use tile_merge_server::server_protocol::{parse_client_message, ParsedClientMessage};
use tile_merge_server::server_utils::normalize_dimension;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: usize,
    #[arg(long, default_value_t = DEFAULT_COLS)]
    cols: usize,
    #[arg(long, default_value_t = HIGH_SPAWN_PROBABILITY)]
    high_spawn_probability: f32,
    /// Directory holding the browser client (index.html).
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,
    /// Tracing filter, e.g. "info" or "tile_merge_server=debug".
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log: String,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

struct ServerState {
    defaults: GameEngineOptions,
    active_connections: usize,
    games_started: u64,
}

impl ServerState {
    fn new(defaults: GameEngineOptions) -> Self {
        Self {
            defaults,
            active_connections: 0,
            games_started: 0,
        }
    }
}

/// The game owned by one connection. Replaced wholesale on `new_game`.
struct GameSession {
    game_id: String,
    engine: GameEngine,
    mapper: InputMapper,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log);

    let defaults = GameEngineOptions {
        rows: args.rows,
        cols: args.cols,
        high_spawn_probability: args.high_spawn_probability,
        ..GameEngineOptions::default()
    };
    defaults
        .validate()
        .context("invalid default game configuration")?;

    let state = Arc::new(Mutex::new(ServerState::new(defaults)));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/config", get(config_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(args.static_dir) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static client");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static client root not found, only the websocket endpoint is served");
        app
    };

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!(port = args.port, "listening");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_static_dir(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "ok": true,
        "activeConnections": guard.active_connections,
        "gamesStarted": guard.games_started,
    }))
}

async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(json!({
        "rows": guard.defaults.rows,
        "cols": guard.defaults.cols,
        "baseSpawnValue": guard.defaults.base_spawn_value,
        "highSpawnValue": guard.defaults.high_spawn_value,
        "highSpawnProbability": guard.defaults.high_spawn_probability,
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(64);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    let defaults = {
        let mut guard = state.lock().await;
        guard.active_connections += 1;
        guard.defaults.clone()
    };
    info!(%client_id, "client connected");

    let mut session = match start_session(&state, &defaults, None, None).await {
        Ok(session) => session,
        Err(message) => {
            let _ = tx.try_send(OutboundMessage::Close {
                code: 1011,
                reason: message,
            });
            finish_connection(&state, &client_id).await;
            drop(tx);
            let _ = writer.await;
            return;
        }
    };
    let mut connected = send_all(&tx, session_opening_messages(&mut session));

    while connected {
        let Some(received) = ws_receiver.next().await else {
            break;
        };
        let Ok(message) = received else {
            break;
        };

        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    connected = send_all(&tx, vec![error_message("invalid utf8 message")]);
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let replies = match parse_client_message(&raw) {
            None => vec![error_message("invalid message")],
            Some(ParsedClientMessage::Key { code }) => handle_key(&mut session, &code),
            Some(ParsedClientMessage::Ping { t }) => vec![json!({ "type": "pong", "t": t })],
            Some(ParsedClientMessage::NewGame { rows, cols }) => {
                match start_session(&state, &defaults, rows, cols).await {
                    Ok(next) => {
                        session = next;
                        session_opening_messages(&mut session)
                    }
                    Err(message) => vec![error_message(&message)],
                }
            }
        };
        connected = send_all(&tx, replies);
    }

    finish_connection(&state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn start_session(
    state: &SharedState,
    defaults: &GameEngineOptions,
    rows: Option<i64>,
    cols: Option<i64>,
) -> Result<GameSession, String> {
    let options = build_engine_options(defaults, rows, cols);
    let engine = GameEngine::new(options).map_err(|err| err.to_string())?;
    let game_id = make_id("game");
    {
        let mut guard = state.lock().await;
        guard.games_started += 1;
    }
    info!(
        %game_id,
        rows = engine.config.rows,
        cols = engine.config.cols,
        "game started"
    );
    Ok(GameSession {
        game_id,
        engine,
        mapper: InputMapper,
    })
}

async fn finish_connection(state: &SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    guard.active_connections = guard.active_connections.saturating_sub(1);
    info!(%client_id, "client disconnected");
}

fn build_engine_options(
    defaults: &GameEngineOptions,
    rows: Option<i64>,
    cols: Option<i64>,
) -> GameEngineOptions {
    GameEngineOptions {
        rows: normalize_dimension(rows, defaults.rows),
        cols: normalize_dimension(cols, defaults.cols),
        seed: None,
        ..defaults.clone()
    }
}

fn session_opening_messages(session: &mut GameSession) -> Vec<Value> {
    let snapshot = session.engine.build_snapshot();
    let mut messages = vec![
        json!({
            "type": "welcome",
            "gameId": session.game_id,
            "config": session.engine.config,
        }),
        json!({
            "type": "state",
            "snapshot": snapshot,
        }),
    ];
    if session.engine.is_ended() {
        messages.push(json!({
            "type": "game_over",
            "summary": session.engine.build_summary(),
        }));
    }
    messages
}

/// Unrecognized codes and moves that change nothing produce no reply.
fn handle_key(session: &mut GameSession, code: &str) -> Vec<Value> {
    let Some(direction) = session.mapper.map_input(code) else {
        debug!(code, "ignored key");
        return Vec::new();
    };

    match session.engine.apply_move(direction) {
        MoveOutcome::Moved(snapshot) => vec![json!({
            "type": "state",
            "snapshot": snapshot,
        })],
        MoveOutcome::GameOver(snapshot) => {
            let summary = session.engine.build_summary();
            info!(
                game_id = %session.game_id,
                moves = summary.moves,
                highest_tile = summary.highest_tile,
                "game over"
            );
            vec![json!({
                "type": "game_over",
                "snapshot": snapshot,
                "summary": summary,
            })]
        }
        MoveOutcome::Unchanged | MoveOutcome::Rejected => Vec::new(),
    }
}

fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}

/// Returns false once the outbound queue is closed or full; the connection is dropped then.
fn send_all(tx: &mpsc::Sender<OutboundMessage>, messages: Vec<Value>) -> bool {
    for message in messages {
        if tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
        {
            warn!("outbound queue unavailable, closing connection");
            return false;
        }
    }
    true
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
