//! Development and preview server implementation.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::sync::RwLock;
use tower_http::services::{ServeDir, ServeFile};

use sprout_static::{BuildConfig, StaticBuilder};

use crate::watcher::FileWatcher;
use crate::websocket::{hmr_client_script, HmrHub, HmrMessage};

/// Path of the live reload WebSocket.
pub const HMR_SOCKET_PATH: &str = "/__hmr";

/// Path of the live reload client script.
pub const HMR_SCRIPT_PATH: &str = "/__hmr.js";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Build settings used for every rebuild
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig {
                minify: false,
                ..Default::default()
            },
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Shared server state.
struct ServerState {
    hmr: HmrHub,
    last_error: Option<String>,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build once, then serve the output and rebuild on every source change.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{}", e)))?;

        let mut build = self.config.build.clone();
        build.extra_scripts.push(HMR_SCRIPT_PATH.to_string());
        let output_dir = build.output_path();
        let watch_paths = vec![build.src_path(), build.template_path()];
        let builder = Arc::new(StaticBuilder::new(build));

        let state = Arc::new(RwLock::new(ServerState {
            hmr: HmrHub::new(),
            last_error: None,
        }));

        rebuild(&builder, &state).await;

        let (watcher, mut rx) =
            FileWatcher::new(&watch_paths).map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        let builder_clone = Arc::clone(&builder);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!("Changed: {}", event.path().display());
                rebuild(&builder_clone, &state_clone).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = Router::new()
            .route(HMR_SOCKET_PATH, get(ws_handler))
            .route(HMR_SCRIPT_PATH, get(hmr_script_handler))
            .with_state(state)
            .fallback_service(spa_service(&output_dir));

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Router serving `dir`, answering unknown paths with its `index.html`
/// so client-side routes survive a refresh.
pub fn spa_router(dir: &Path) -> Router {
    Router::new().fallback_service(spa_service(dir))
}

fn spa_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

/// Rebuild and tell connected browsers about the outcome.
async fn rebuild(builder: &StaticBuilder, state: &Arc<RwLock<ServerState>>) {
    let outcome = builder.build().await;
    let mut state = state.write().await;

    match outcome {
        Ok(result) => {
            tracing::info!(
                "Built {} pages and {} modules in {}ms",
                result.pages,
                result.modules,
                result.duration_ms
            );
            state.last_error = None;
            state.hmr.send(HmrMessage::Reload);
        }
        Err(e) => {
            tracing::error!("Build failed: {}", e);
            let message = e.to_string();
            state.last_error = Some(message.clone());
            state.hmr.send(HmrMessage::BuildFailed { message });
        }
    }
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RwLock<ServerState>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<RwLock<ServerState>>) {
    let (mut rx, last_error) = {
        let state = state.read().await;
        (state.hmr.subscribe(), state.last_error.clone())
    };

    let mut greeting = vec![HmrMessage::Connected];
    if let Some(message) = last_error {
        greeting.push(HmrMessage::BuildFailed { message });
    }

    for msg in greeting {
        if send_json(&mut socket, &msg).await.is_err() {
            return;
        }
    }

    while let Ok(msg) = rx.recv().await {
        if send_json(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_json(socket: &mut WebSocket, msg: &HmrMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Handler for the live reload client script.
async fn hmr_script_handler() -> impl IntoResponse {
    let script = hmr_client_script(HMR_SOCKET_PATH);
    ([("content-type", "application/javascript")], script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::tempdir;
    use tower::ServiceExt;

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 7777);
        assert!(!server.config.build.minify);
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[tokio::test]
    async fn spa_router_serves_files_and_falls_back_to_document() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "<div id=\"root\"></div>").unwrap();
        fs::write(temp.path().join("bundle.js"), "console.log(1);").unwrap();

        let (status, body) = get_body(spa_router(temp.path()), "/bundle.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1);");

        let (status, body) = get_body(spa_router(temp.path()), "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("id=\"root\""));
    }

    #[tokio::test]
    async fn rebuild_reports_failures_to_clients() {
        let temp = tempdir().unwrap();
        let builder = StaticBuilder::new(BuildConfig {
            root: temp.path().to_path_buf(),
            ..Default::default()
        });
        let state = Arc::new(RwLock::new(ServerState {
            hmr: HmrHub::new(),
            last_error: None,
        }));
        let mut rx = state.read().await.hmr.subscribe();

        rebuild(&builder, &state).await;

        assert!(matches!(rx.try_recv(), Ok(HmrMessage::BuildFailed { .. })));
        assert!(state.read().await.last_error.is_some());
    }

    #[tokio::test]
    async fn serves_client_script() {
        let state = Arc::new(RwLock::new(ServerState {
            hmr: HmrHub::new(),
            last_error: None,
        }));
        let app = Router::new()
            .route(HMR_SCRIPT_PATH, get(hmr_script_handler))
            .with_state(state);

        let (status, body) = get_body(app, HMR_SCRIPT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(HMR_SOCKET_PATH));
    }
}
