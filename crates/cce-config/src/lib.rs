//! Service configuration: the closed option set for `cc-executor`,
//! loaded from a single TOML document with environment-variable
//! overrides. The file may be absent (defaults apply) or partial — each
//! field falls back independently rather than failing the whole load.

use cce_protocol::ProtocolConfig;
use cce_timing::{TimingConfig, TimingStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The service's full configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_address: String,
    pub allowed_executables: Vec<String>,
    pub max_sessions: usize,
    pub max_line_bytes: usize,
    pub recent_frame_bytes: usize,
    pub stream_chunk_bytes: usize,
    pub grace_seconds: f64,
    pub heartbeat_seconds: f64,
    pub load_threshold_pct: f32,
    pub load_multiplier: u8,
    pub baseline_multiplier: f64,
    pub unknown_floor_seconds: f64,
    pub timing_history_cap: usize,
    pub timing_ceiling_seconds: f64,
    pub compound_multipliers: bool,
    pub hooks_file: PathBuf,
    pub global_hook_timeout_secs: u64,
    pub token_limit_marker: String,
    /// `TIMING_STORE_URL` override target. The timing history store is a
    /// local append-only file tree (`cce_timing::TimingStore`), not a
    /// networked service, so this names a directory rather than a URL;
    /// `None` keeps `TimingStore::default_base_dir()`.
    pub timing_store_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let protocol = ProtocolConfig::default();
        let timing = TimingConfig::default();
        Self {
            listen_address: "127.0.0.1:8765".to_string(),
            allowed_executables: protocol.allowed_executables,
            max_sessions: protocol.max_sessions,
            max_line_bytes: protocol.max_line_bytes,
            recent_frame_bytes: protocol.recent_frame_bytes,
            stream_chunk_bytes: protocol.stream_chunk_bytes,
            grace_seconds: protocol.grace_seconds,
            heartbeat_seconds: protocol.heartbeat_seconds,
            load_threshold_pct: protocol.load_threshold_pct,
            load_multiplier: protocol.load_multiplier,
            baseline_multiplier: timing.baseline_multiplier,
            unknown_floor_seconds: timing.unknown_floor_seconds,
            timing_history_cap: timing.timing_history_cap,
            timing_ceiling_seconds: timing.max_ceiling_seconds,
            compound_multipliers: timing.compound_multipliers,
            hooks_file: protocol.hooks_file,
            global_hook_timeout_secs: protocol.global_hook_timeout.as_secs(),
            token_limit_marker: protocol.token_limit_marker,
            timing_store_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Load from `path`, falling back to defaults if the file is absent
    /// or malformed (logged, never fatal).
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "failed to parse service config; using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read service config; using defaults");
                Self::default()
            }
        }
    }

    /// Default config file location, mirroring `TimingStore::default_base_dir`'s
    /// `directories::ProjectDirs` pattern.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "cc-executor")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".cc-executor/config.toml"))
    }

    /// Apply the core environment-variable overrides. Per-request `env`
    /// overrides are layered separately, at request time, in the
    /// protocol layer — not here.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("LISTEN_ADDRESS") {
            self.listen_address = v;
        }
        if let Ok(v) = std::env::var("ALLOWED_EXECUTABLES") {
            self.allowed_executables = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("TIMING_STORE_URL") {
            self.timing_store_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("HOOKS_FILE") {
            self.hooks_file = PathBuf::from(v);
        }
        self
    }

    /// Load from the default path and apply environment overrides — the
    /// one entry point `cce-server`'s `main.rs` calls.
    pub fn load_default() -> Self {
        Self::load(&Self::default_path()).apply_env_overrides()
    }

    pub fn to_protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            allowed_executables: self.allowed_executables.clone(),
            max_sessions: self.max_sessions,
            max_line_bytes: self.max_line_bytes,
            recent_frame_bytes: self.recent_frame_bytes,
            stream_chunk_bytes: self.stream_chunk_bytes,
            grace_seconds: self.grace_seconds,
            heartbeat_seconds: self.heartbeat_seconds,
            load_threshold_pct: self.load_threshold_pct,
            load_multiplier: self.load_multiplier,
            global_hook_timeout: Duration::from_secs(self.global_hook_timeout_secs),
            token_limit_marker: self.token_limit_marker.clone(),
            hooks_file: self.hooks_file.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_timing_config(&self) -> TimingConfig {
        TimingConfig {
            baseline_multiplier: self.baseline_multiplier,
            unknown_floor_seconds: self.unknown_floor_seconds,
            max_ceiling_seconds: self.timing_ceiling_seconds,
            timing_history_cap: self.timing_history_cap,
            compound_multipliers: self.compound_multipliers,
        }
    }

    pub fn timing_store(&self) -> TimingStore {
        let base_dir = self
            .timing_store_dir
            .clone()
            .unwrap_or_else(TimingStore::default_base_dir);
        TimingStore::new(base_dir, self.timing_history_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load(&dir.path().join("nope.toml"));
        assert_eq!(config.listen_address, "127.0.0.1:8765");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        let config = ServiceConfig::load(&path);
        assert_eq!(config.max_sessions, ServiceConfig::default().max_sessions);
    }

    #[test]
    fn partial_document_fills_in_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"listen_address = "0.0.0.0:9000""#).unwrap();
        writeln!(file, "allowed_executables = [\"claude\", \"echo\"]").unwrap();
        drop(file);

        let config = ServiceConfig::load(&path);
        assert_eq!(config.listen_address, "0.0.0.0:9000");
        assert_eq!(config.allowed_executables, vec!["claude", "echo"]);
        assert_eq!(config.max_line_bytes, ServiceConfig::default().max_line_bytes);
    }

    #[test]
    fn env_overrides_apply_on_top_of_file_values() {
        let config = ServiceConfig::default();
        std::env::set_var("LISTEN_ADDRESS", "0.0.0.0:1234");
        std::env::set_var("ALLOWED_EXECUTABLES", "claude, echo ,  ls");
        std::env::set_var("HOOKS_FILE", "/tmp/custom-hooks.toml");
        let overridden = config.apply_env_overrides();
        assert_eq!(overridden.listen_address, "0.0.0.0:1234");
        assert_eq!(overridden.allowed_executables, vec!["claude", "echo", "ls"]);
        assert_eq!(overridden.hooks_file, PathBuf::from("/tmp/custom-hooks.toml"));
        std::env::remove_var("LISTEN_ADDRESS");
        std::env::remove_var("ALLOWED_EXECUTABLES");
        std::env::remove_var("HOOKS_FILE");
    }

    #[test]
    fn to_protocol_config_round_trips_core_fields() {
        let config = ServiceConfig::default();
        let protocol = config.to_protocol_config();
        assert_eq!(protocol.max_sessions, config.max_sessions);
        assert_eq!(protocol.hooks_file, config.hooks_file);
    }
}
