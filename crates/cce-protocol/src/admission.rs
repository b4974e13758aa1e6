//! Allow-list enforcement and non-blocking command validation warnings
//!.

use cce_hooks::{HookKind, HooksDocument};
use cce_process::CommandSpec;

/// Empty allow-list means "allow all".
pub fn is_allowed(spec: &CommandSpec, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a == spec.allow_list_key())
}

/// Operators that only mean something to a shell. CC Executor never
/// invokes one, so a raw command containing these is
/// passed through as literal argv text — surprising enough to warn about.
const SHELL_METACHARACTERS: &[&str] = &["&&", "||", ";", "|", ">", "<", "`", "$("];

pub fn validation_warning(display_command: &str) -> Option<String> {
    SHELL_METACHARACTERS.iter().find(|m| display_command.contains(**m)).map(|m| {
        format!(
            "command contains '{m}', which has no shell meaning here — no shell is invoked, \
             so it will be passed through as literal argument text"
        )
    })
}

const ALL_HOOK_KINDS: [HookKind; 6] = [
    HookKind::PreExecute,
    HookKind::PreTool,
    HookKind::PreClaude,
    HookKind::PostClaude,
    HookKind::PostTool,
    HookKind::PostOutput,
];

/// The config keys that have at least one hook configured, for the
/// `hook_status` response's `hooks_configured[]` field.
pub fn configured_hook_kinds(doc: &HooksDocument) -> Vec<&'static str> {
    ALL_HOOK_KINDS
        .iter()
        .filter(|kind| !doc.hooks_for(**kind).is_empty())
        .map(|kind| kind.as_config_key())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_allows_everything() {
        let spec = CommandSpec::structured("rm", vec![]);
        assert!(is_allowed(&spec, &[]));
    }

    #[test]
    fn nonempty_allow_list_rejects_unlisted_executable() {
        let spec = CommandSpec::structured("rm", vec![]);
        assert!(!is_allowed(&spec, &["echo".to_string(), "ls".to_string()]));
    }

    #[test]
    fn shell_metacharacter_triggers_warning() {
        assert!(validation_warning("echo hi && rm -rf /").is_some());
    }

    #[test]
    fn plain_command_has_no_warning() {
        assert!(validation_warning("echo hi there").is_none());
    }

    #[test]
    fn configured_hook_kinds_reports_only_nonempty_lists() {
        let mut doc = HooksDocument::default();
        doc.pre_execute.push(cce_hooks::Hook::Simple("echo hi".to_string()));
        let kinds = configured_hook_kinds(&doc);
        assert_eq!(kinds, vec!["pre_execute"]);
    }
}
