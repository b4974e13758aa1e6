//! Timing history store.
//!
//! One append-only JSON-lines file per `(class, complexity)` key:
//! `append()` for the common case, and an atomic rewrite (temp file +
//! rename) when the capped history needs trimming. Any I/O failure
//! degrades to "no history" rather than propagating — the oracle must
//! always return a value.

use crate::classify::{CommandClass, Complexity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    pub duration_seconds: f64,
    pub outcome: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TimingStore {
    base_dir: PathBuf,
    cap: usize,
}

impl TimingStore {
    pub fn new(base_dir: PathBuf, cap: usize) -> Self {
        Self { base_dir, cap }
    }

    /// Default location, using `directories::ProjectDirs` to locate the
    /// per-application state directory for this platform.
    pub fn default_base_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "cc-executor")
            .map(|dirs| dirs.data_dir().join("timing"))
            .unwrap_or_else(|| PathBuf::from(".cc-executor/timing"))
    }

    fn key_path(&self, class: CommandClass, complexity: Complexity) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.jsonl", class.as_str(), complexity.as_str()))
    }

    /// Append one observed duration. Best-effort: logs and swallows errors.
    pub fn record(
        &self,
        class: CommandClass,
        complexity: Complexity,
        duration_seconds: f64,
        outcome: &str,
    ) {
        if let Err(e) = self.try_record(class, complexity, duration_seconds, outcome) {
            tracing::warn!(error = %e, "timing store record failed; continuing without history");
        }
    }

    fn try_record(
        &self,
        class: CommandClass,
        complexity: Complexity,
        duration_seconds: f64,
        outcome: &str,
    ) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.key_path(class, complexity);

        let sample = TimingSample {
            duration_seconds,
            outcome: outcome.to_string(),
            recorded_at: Utc::now(),
        };
        let line = serde_json::to_string(&sample)?;

        let mut file = OpenOptions::new().append(true).create(true).open(&path)?;
        writeln!(file, "{line}")?;
        file.flush()?;

        self.enforce_cap(&path)
    }

    /// Trim the history file down to the last `cap` entries via an atomic
    /// rewrite, mirroring `MemoryStore::rewrite_all`'s temp-file + rename.
    fn enforce_cap(&self, path: &Path) -> std::io::Result<()> {
        let samples = read_samples(path)?;
        if samples.len() <= self.cap {
            return Ok(());
        }
        let trimmed = &samples[samples.len() - self.cap..];

        let tmp_path = path.with_extension("jsonl.tmp");
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            for sample in trimmed {
                writeln!(tmp, "{}", serde_json::to_string(sample)?)?;
            }
            tmp.flush()?;
        }
        fs::rename(&tmp_path, path)
    }

    /// Load the (capped) history for a `(class, complexity)` key. Returns
    /// an empty vec — never an error — when the store is unreadable.
    pub fn load(&self, class: CommandClass, complexity: Complexity) -> Vec<TimingSample> {
        let path = self.key_path(class, complexity);
        match read_samples(&path) {
            Ok(samples) => samples,
            Err(e) => {
                tracing::debug!(error = %e, "timing store load failed; using empty history");
                Vec::new()
            }
        }
    }
}

fn read_samples(path: &Path) -> std::io::Result<Vec<TimingSample>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = OpenOptions::new().read(true).open(path)?;
    let reader = BufReader::new(file);
    let mut samples = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(sample) = serde_json::from_str::<TimingSample>(&line) {
            samples.push(sample);
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().to_path_buf(), 50);

        store.record(CommandClass::General, Complexity::Medium, 12.5, "normal");
        store.record(CommandClass::General, Complexity::Medium, 20.0, "normal");

        let samples = store.load(CommandClass::General, Complexity::Medium);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].duration_seconds, 12.5);
    }

    #[test]
    fn missing_store_returns_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().join("does-not-exist-yet"), 50);
        let samples = store.load(CommandClass::Code, Complexity::High);
        assert!(samples.is_empty());
    }

    #[test]
    fn history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimingStore::new(dir.path().to_path_buf(), 3);

        for i in 0..10 {
            store.record(CommandClass::File, Complexity::Low, i as f64, "normal");
        }

        let samples = store.load(CommandClass::File, Complexity::Low);
        assert_eq!(samples.len(), 3);
        // The cap keeps the most recent entries.
        assert_eq!(samples.last().unwrap().duration_seconds, 9.0);
    }
}
