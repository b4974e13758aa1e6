//! Process supervisor: spawn, stream, control, time out, and reap a
//! Child Process.

pub mod control;
pub mod spawn;
pub mod stream;
pub mod supervisor;
pub mod token_limit;
pub mod tokenize;

pub use control::{cancel_and_reap, force_kill_group, pause_group, resume_group, terminate_group};
pub use spawn::CommandSpec;
pub use stream::{OutputFrame, DEFAULT_CHUNK_BYTES};
pub use supervisor::{new_state_handle, supervise, Completion, ControlCommand, StateHandle, SupervisorConfig};
pub use token_limit::RecentOutputWindow;
