//! Session table: one entry per live WebSocket connection, owning at
//! most one active child process.
//!
//! A session's active command is guarded by an async `Mutex` rather than
//! an OS-level file lock, since it's purely in-process state — there's
//! only ever one owner and no cross-process coordination to do.

use cce_core::SessionId;
use cce_process::{ControlCommand, StateHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// The running Child Process a session currently owns.
pub struct ActiveCommand {
    pub pid: u32,
    pub pgid: i32,
    pub control_tx: mpsc::Sender<ControlCommand>,
    pub state: StateHandle,
}

pub struct Session {
    pub id: SessionId,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub outgoing: mpsc::Sender<String>,
    pub active: Mutex<Option<ActiveCommand>>,
}

impl Session {
    pub fn new(id: SessionId, outgoing: mpsc::Sender<String>) -> Self {
        Self { id, created_at: chrono::Utc::now(), outgoing, active: Mutex::new(None) }
    }
}

pub type SessionTable = Arc<RwLock<HashMap<SessionId, Arc<Session>>>>;

pub fn new_session_table() -> SessionTable {
    Arc::new(RwLock::new(HashMap::new()))
}
