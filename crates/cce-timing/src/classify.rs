//! Pure command classification.
//!
//! Classification is a closed-set mapping from a command string to
//! `(class, complexity)`, driven by the executable name, keyword matches
//! against the full command, and simple length/connective heuristics.
//! The keyword tables below are static `match` arms over string slices
//! rather than a data-driven rule engine — the set of classes is closed
//! and small enough that a rule file would be pure indirection.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandClass {
    Calculation,
    Code,
    Data,
    File,
    General,
}

impl CommandClass {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandClass::Calculation => "calculation",
            CommandClass::Code => "code",
            CommandClass::Data => "data",
            CommandClass::File => "file",
            CommandClass::General => "general",
        }
    }
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Trivial,
    Low,
    Medium,
    High,
    Extreme,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Trivial => "trivial",
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::Extreme => "extreme",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CODE_EXECUTABLES: &[&str] = &["codex", "claude", "gemini", "aider", "cursor-agent"];
const FILE_EXECUTABLES: &[&str] = &["cp", "mv", "rsync", "tar", "zip", "unzip", "find"];
const DATA_EXECUTABLES: &[&str] = &["psql", "mysql", "sqlite3", "jq", "awk", "sed"];
const CALCULATION_KEYWORDS: &[&str] = &[
    "what is", "calculate", "compute", "sum of", "+", "-", "*", "/", "sqrt", "factorial",
];
const CODE_KEYWORDS: &[&str] = &[
    "refactor", "implement", "write a function", "fix the bug", "add a test", "review this code",
];
const DATA_KEYWORDS: &[&str] = &["select ", "query", "analyze the dataset", "csv", "dataframe"];
const FILE_KEYWORDS: &[&str] = &["copy", "move", "delete", "rename", "extract", "archive"];

/// Multi-step connectives that push a command toward higher complexity.
const MULTI_STEP_CONNECTIVES: &[&str] = &["then", "after that", "and then", "finally", ";"];

/// True when `executable` is one of the known conversational LLM CLIs.
/// Used by the Hook Engine to gate the `pre_claude`/`post_claude` kinds,
/// which only make sense around an actual LLM invocation.
pub fn is_llm_cli(executable: &str) -> bool {
    let lower = executable.to_lowercase();
    CODE_EXECUTABLES.iter().any(|e| lower.ends_with(e))
}

/// Classify a command line into `(class, complexity)`. Pure: the same
/// input always yields the same output, with no I/O and no clock reads.
pub fn classify(command: &str) -> (CommandClass, Complexity) {
    let lower = command.to_lowercase();
    let executable = lower.split_whitespace().next().unwrap_or("");

    let class = classify_class(&lower, executable);
    let complexity = classify_complexity(&lower);
    (class, complexity)
}

fn classify_class(lower: &str, executable: &str) -> CommandClass {
    if CODE_EXECUTABLES.iter().any(|e| executable.ends_with(e)) {
        return CommandClass::Code;
    }
    if FILE_EXECUTABLES.iter().any(|e| executable == *e) {
        return CommandClass::File;
    }
    if DATA_EXECUTABLES.iter().any(|e| executable == *e) {
        return CommandClass::Data;
    }

    if CALCULATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return CommandClass::Calculation;
    }
    if CODE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return CommandClass::Code;
    }
    if DATA_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return CommandClass::Data;
    }
    if FILE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return CommandClass::File;
    }

    CommandClass::General
}

fn classify_complexity(lower: &str) -> Complexity {
    let word_count = lower.split_whitespace().count();
    let multi_step_count = MULTI_STEP_CONNECTIVES
        .iter()
        .filter(|c| lower.contains(*c))
        .count();

    match (word_count, multi_step_count) {
        (_, c) if c >= 3 => Complexity::Extreme,
        (_, c) if c >= 2 => Complexity::High,
        (n, c) if c >= 1 || n > 60 => {
            if n > 120 {
                Complexity::Extreme
            } else {
                Complexity::Medium
            }
        }
        (n, _) if n > 30 => Complexity::Medium,
        (n, _) if n > 10 => Complexity::Low,
        _ => Complexity::Trivial,
    }
}
