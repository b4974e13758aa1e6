//! Hook engine: user-defined commands that run around subprocess
//! execution, in a fixed order, non-fatal by default.
//!
//! ## Hooks file
//!
//! A single TOML document (see [`config::HooksDocument`]) lists hooks per
//! kind. Kinds run in a fixed sequence; `pre_claude`/`post_claude` only
//! fire when the spawned command targets an LLM CLI.
//!
//! ## Contract
//!
//! Each hook is a shell command that receives context as environment
//! variables (`CCE_HOOK_KIND`, `CCE_SESSION_ID`, `CCE_COMMAND_ID`,
//! `CCE_COMMAND`, `CCE_HOOK_TMPDIR`) and communicates back via two
//! well-known files under `CCE_HOOK_TMPDIR`: `wrapped_command` to replace
//! the command about to run, and `block` to veto it outright.

pub mod config;
pub mod engine;
pub mod event;
pub mod runner;

pub use config::{Hook, HooksDocument};
pub use engine::{context, run_post_hooks, run_pre_hooks, scratch_dir, PreHookResult};
pub use event::{post_sequence, pre_sequence, HookKind};
pub use runner::{run_hook, HookContext, HookOutcome};
