//! Shared server state and router assembly.

use crate::session::{new_session_table, SessionTable};
use cce_hooks::HooksDocument;
use cce_timing::TimingOracle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tunables consumed by the protocol layer. `cce-config` is responsible
/// for loading these and handing the result here; the protocol layer
/// itself recognizes no configuration file format of its own.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    pub allowed_executables: Vec<String>,
    pub max_sessions: usize,
    pub max_line_bytes: usize,
    pub recent_frame_bytes: usize,
    pub stream_chunk_bytes: usize,
    pub grace_seconds: f64,
    pub heartbeat_seconds: f64,
    pub load_threshold_pct: f32,
    pub load_multiplier: u8,
    pub global_hook_timeout: Duration,
    pub token_limit_marker: String,
    pub hooks_file: PathBuf,
    pub version: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            allowed_executables: Vec::new(),
            max_sessions: 256,
            max_line_bytes: 1024 * 1024,
            recent_frame_bytes: 10 * 1024 * 1024,
            stream_chunk_bytes: cce_process::DEFAULT_CHUNK_BYTES,
            grace_seconds: 10.0,
            heartbeat_seconds: 20.0,
            load_threshold_pct: 14.0,
            load_multiplier: cce_resource::MULTIPLIER_HIGH_LOAD,
            global_hook_timeout: Duration::from_secs(30),
            token_limit_marker: "token limit exceeded".to_string(),
            hooks_file: PathBuf::from("hooks.toml"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// State shared by every WebSocket session. The allow-list and hook
/// configuration are loaded once here and treated as immutable for the
/// life of the process.
pub struct AppState {
    pub config: ProtocolConfig,
    pub hooks: HooksDocument,
    pub timing: TimingOracle,
    pub sessions: SessionTable,
}

impl AppState {
    pub fn new(config: ProtocolConfig, timing: TimingOracle) -> Arc<Self> {
        let hooks = HooksDocument::load(&config.hooks_file);
        Arc::new(Self { config, hooks, timing, sessions: new_session_table() })
    }
}

/// Assemble the axum router: `/ws` for the JSON-RPC/WebSocket surface,
/// `/healthz` for a plain-HTTP liveness probe.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/ws", axum::routing::get(crate::ws::ws_handler))
        .route("/healthz", axum::routing::get(crate::healthz::healthz_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
