use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use seg_core::model::DocumentData;
use seg_core::EditorConfig;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod session;
mod store;

use session::Session;
use store::Store;

/// Roughly one display frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

// Application State
struct AppState {
    store: Arc<RwLock<Store>>,
    config: EditorConfig,
}

/// Editor configuration from the JSON file named by `SEGEDIT_CONFIG`, or
/// the defaults.
fn load_config() -> Result<EditorConfig, Box<dyn std::error::Error>> {
    match std::env::var("SEGEDIT_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)?;
            info!("loaded configuration from {}", path);
            Ok(EditorConfig::from_json(&text)?)
        }
        Err(_) => Ok(EditorConfig::default()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return;
        }
    };
    let addr: SocketAddr = match std::env::var("SEGEDIT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.into()).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid SEGEDIT_ADDR: {}", e);
            return;
        }
    };

    let shared_state = Arc::new(AppState { store: Arc::new(RwLock::new(Store::new())), config });

    let app = Router::new()
        .route("/", get(root))
        .route("/document", get(document))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    info!("listening on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("cannot bind {}: {}", addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
    }
}

async fn root() -> &'static str {
    "Segmentation editor backend"
}

async fn document(State(state): State<Arc<AppState>>) -> Json<DocumentData> {
    let doc = match state.store.read() {
        Ok(store) => store.document(),
        Err(poisoned) => poisoned.into_inner().document(),
    };
    Json(doc)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Client connected");
    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::open(state.config.clone(), &state.store);

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let frames = tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => session.handle(&text, &state.store),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("socket error: {}", e);
                    break;
                }
            },
            _ = ticker.tick() => session.tick(&state.store),
        };
        for frame in frames {
            if sender.send(Message::Text(frame)).await.is_err() {
                warn!("client went away mid-frame");
                session.tick(&state.store);
                return;
            }
        }
    }

    // Persist whatever the last frame did not
    session.tick(&state.store);
    let (lines, regions) = match state.store.read() {
        Ok(store) => (store.line_count(), store.region_count()),
        Err(poisoned) => {
            let store = poisoned.into_inner();
            (store.line_count(), store.region_count())
        }
    };
    info!(
        session_lines = session.editor().line_count(),
        stored_lines = lines,
        stored_regions = regions,
        "Client disconnected"
    );
}
