//! Aggregated benchmark report
//!
//! One report per client-role run: the fixed format version plus one
//! entry per scenario that produced parseable load-tool output. The
//! report is persisted exactly once, after all scheduled scenarios have
//! been attempted.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Report format version, bumped when the layout changes
pub const REPORT_VERSION: &str = "1.0";

/// Versioned mapping of scenario name to the load tool's result blob.
///
/// Serializes flat, as the consumers expect:
/// `{"version": "1.0", "loadavg40": {...}, ...}`. Scenario results are
/// passed through unmodified; the harness does not interpret them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub version: String,
    #[serde(flatten)]
    results: BTreeMap<String, serde_json::Value>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    pub fn new() -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            results: BTreeMap::new(),
        }
    }

    /// Record the result for one scenario.
    pub fn insert(&mut self, name: &str, result: serde_json::Value) {
        self.results.insert(name.to_string(), result);
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.results.get(name)
    }

    pub fn scenario_names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The per-run report filename, derived from this process's id so
    /// repeated runs on a shared machine do not clobber each other.
    pub fn filename() -> String {
        format!("statbench.results.{}.json", std::process::id())
    }

    /// Write the report under `dir` and return the full path.
    pub fn persist(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(Self::filename());
        let json = serde_json::to_string(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}
