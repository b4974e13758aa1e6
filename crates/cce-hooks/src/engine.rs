//! Orders hook kinds within the pre/post phases and folds their outcomes
//! into a single decision for the caller.

use crate::config::HooksDocument;
use crate::event::{post_sequence, pre_sequence};
use crate::runner::{self, HookContext, HookOutcome};
use std::path::Path;
use std::time::Duration;

/// Result of running the full pre-phase hook sequence.
pub enum PreHookResult {
    /// All hooks ran (or were absent); `command` is either the original
    /// command or a replacement written by a pre-execute hook, and
    /// `warnings` holds any non-fatal hook failures collected along the way.
    Proceed { command: String, warnings: Vec<String> },
    /// A hook wrote the blocking sentinel; the command must not be spawned.
    Blocked { reason: String, warnings: Vec<String> },
}

/// Run `pre_execute`, `pre_tool`, and (if `targets_llm_cli`) `pre_claude`
/// hooks in order, checking the blocking sentinel after each kind.
pub async fn run_pre_hooks(
    doc: &HooksDocument,
    context: &HookContext<'_>,
    global_timeout: Duration,
    targets_llm_cli: bool,
) -> PreHookResult {
    let mut warnings = Vec::new();

    for kind in pre_sequence(targets_llm_cli) {
        for hook in doc.hooks_for(kind) {
            match runner::run_hook(kind, hook, context, global_timeout).await {
                Ok(HookOutcome::Ok) => {}
                Ok(HookOutcome::Warning(msg)) => warnings.push(msg),
                Err(e) => warnings.push(format!("hook {} failed to start: {e}", kind.as_config_key())),
            }
        }
        if let Some(reason) = runner::read_block_reason(context.tmpdir) {
            return PreHookResult::Blocked { reason, warnings };
        }
    }

    let command = runner::read_wrapped_command(context.tmpdir)
        .unwrap_or_else(|| context.command.to_string());
    PreHookResult::Proceed { command, warnings }
}

/// Run `post_claude` (conditional), `post_tool`, and `post_output` hooks in
/// order. Post hooks are always non-fatal — the command has already
/// terminated by the time these run, so there is nothing left to block.
pub async fn run_post_hooks(
    doc: &HooksDocument,
    context: &HookContext<'_>,
    global_timeout: Duration,
    targets_llm_cli: bool,
) -> Vec<String> {
    let mut warnings = Vec::new();
    for kind in post_sequence(targets_llm_cli) {
        for hook in doc.hooks_for(kind) {
            match runner::run_hook(kind, hook, context, global_timeout).await {
                Ok(HookOutcome::Ok) => {}
                Ok(HookOutcome::Warning(msg)) => warnings.push(msg),
                Err(e) => warnings.push(format!("hook {} failed to start: {e}", kind.as_config_key())),
            }
        }
    }
    warnings
}

/// Create a fresh scratch directory for one command's hook run. The caller
/// owns the returned `TempDir` and should keep it alive for the command's
/// whole lifetime so `pre_claude`/`post_claude` hooks share the same
/// `wrapped_command`/`block` files as `pre_execute`/`pre_tool`.
pub fn scratch_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::tempdir()
}

pub fn context<'a>(
    session_id: &'a str,
    command_id: &'a str,
    command: &'a str,
    tmpdir: &'a Path,
) -> HookContext<'a> {
    HookContext { session_id, command_id, command, tmpdir }
}
