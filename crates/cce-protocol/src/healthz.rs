//! Plain-HTTP health probe.

use crate::app::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub version: String,
}

pub async fn healthz_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let active_sessions = state.sessions.read().await.len();
    Json(HealthResponse { status: "ok", active_sessions, version: state.config.version.clone() })
}
