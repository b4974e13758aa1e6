//! Hooks document loading: a single TOML file naming hooks per kind.

use crate::event::HookKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn default_timeout() -> u64 {
    30
}

/// A single configured hook. The common case is just a shell command; the
/// detailed form lets a hook override the global timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hook {
    Simple(String),
    Detailed {
        command: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl Hook {
    pub fn command(&self) -> &str {
        match self {
            Hook::Simple(command) => command,
            Hook::Detailed { command, .. } => command,
        }
    }

    pub fn timeout(&self, global_default: Duration) -> Duration {
        match self {
            Hook::Simple(_) => global_default,
            Hook::Detailed { timeout_secs, .. } => Duration::from_secs(*timeout_secs),
        }
    }
}

/// The whole hooks file: one ordered list of hooks per kind. Hooks within a
/// list run in declaration order; kinds run in the fixed sequence
/// `event::pre_sequence` / `event::post_sequence`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooksDocument {
    #[serde(default)]
    pub pre_execute: Vec<Hook>,
    #[serde(default)]
    pub pre_tool: Vec<Hook>,
    #[serde(default)]
    pub pre_claude: Vec<Hook>,
    #[serde(default)]
    pub post_claude: Vec<Hook>,
    #[serde(default)]
    pub post_tool: Vec<Hook>,
    #[serde(default)]
    pub post_output: Vec<Hook>,
}

impl HooksDocument {
    pub fn hooks_for(&self, kind: HookKind) -> &[Hook] {
        match kind {
            HookKind::PreExecute => &self.pre_execute,
            HookKind::PreTool => &self.pre_tool,
            HookKind::PreClaude => &self.pre_claude,
            HookKind::PostClaude => &self.post_claude,
            HookKind::PostTool => &self.post_tool,
            HookKind::PostOutput => &self.post_output,
        }
    }

    /// Load from a single TOML file. A missing or unparsable file degrades
    /// to an empty document rather than failing startup.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "failed to parse hooks file; continuing with no hooks");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read hooks file; continuing with no hooks");
                Self::default()
            }
        }
    }
}
