//! File-backed usage counters.
//!
//! [`UsageCounter`] counts how often each session operation is called and
//! which operation preceded it, and rewrites a small JSON file on every
//! call:
//!
//! ```json
//! { "usage": { "explore": 3 }, "sequences": { "explore:load": 1, "explore:explore": 2 } }
//! ```
//!
//! The first recorded operation in a process follows the pseudo-operation
//! `"_init"`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::traits::TelemetrySink;

const INITIAL_OPERATION: &str = "_init";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counts {
    #[serde(default)]
    usage: BTreeMap<String, u64>,
    #[serde(default)]
    sequences: BTreeMap<String, u64>,
}

pub struct UsageCounter {
    path: PathBuf,
    previous: String,
    counts: Counts,
}

impl UsageCounter {
    /// Open the counter file at `path`, starting from zero if it is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let counts = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse usage counters: {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Counts::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read usage counters: {}", path.display()))
            }
        };
        Ok(Self {
            path,
            previous: INITIAL_OPERATION.to_string(),
            counts,
        })
    }

    pub fn usage(&self, operation: &str) -> u64 {
        self.counts.usage.get(operation).copied().unwrap_or(0)
    }

    /// How many times `operation` directly followed `previous`.
    pub fn sequence(&self, operation: &str, previous: &str) -> u64 {
        self.counts
            .sequences
            .get(&format!("{}:{}", operation, previous))
            .copied()
            .unwrap_or(0)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.counts)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write usage counters: {}", self.path.display()))
    }
}

impl TelemetrySink for UsageCounter {
    fn record(&mut self, operation: &str) -> Result<()> {
        *self.counts.usage.entry(operation.to_string()).or_insert(0) += 1;
        *self
            .counts
            .sequences
            .entry(format!("{}:{}", operation, self.previous))
            .or_insert(0) += 1;
        self.previous = operation.to_string();
        self.persist()
    }
}
