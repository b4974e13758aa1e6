//! Session/protocol layer: JSON-RPC-over-WebSocket transport tying
//! together the resource monitor, timing oracle, hook engine, and process
//! supervisor into one request/response/notification surface.

pub mod admission;
pub mod app;
pub mod command;
pub mod healthz;
pub mod notify;
pub mod rpc;
pub mod session;
pub mod ws;

pub use app::{AppState, ProtocolConfig};
pub use session::{Session, SessionTable};
