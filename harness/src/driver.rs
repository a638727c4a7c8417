//! Client role: drive the external load-generation tool
//!
//! Each scheduled scenario becomes one invocation of the load tool
//! against the remote server. The tool writes its structured result to a
//! transient file named through an environment-variable contract; the
//! driver ingests that file, deletes it, and hands the parsed blob to
//! the report. Failures are isolated per scenario and never abort the
//! batch.

use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

use crate::catalog::{self, TestScenario};
use crate::config::HarnessConfig;
use crate::limits;
use crate::report::Report;

/// Scenario-parameterization script passed to the load tool with `-s`
pub const BENCH_SCRIPT: &str = "bench.lua";

/// JSON formatting helper the script needs at result-writing time
pub const JSON_HELPER: &str = "JSON.lua";

/// Environment variable telling the tool where to write its JSON result
pub const JSON_OUTPUT_ENV: &str = "JSON_OUTPUT_FILE";

/// Environment variable pointing the tool at the JSON helper
pub const JSON_HELPER_ENV: &str = "JSON_LUA";

/// Errors from one load-tool invocation
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to run load tool {exe:?}: {source}")]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("load tool produced no readable result file: {0}")]
    MissingResult(std::io::Error),

    #[error("load tool result is not valid JSON: {0}")]
    MalformedResult(#[from] serde_json::Error),

    #[error("JSON helper script not found: {0}")]
    MissingHelper(PathBuf),
}

/// The full, explicit contract for one load-tool subprocess.
///
/// The tool's own stdout/stderr pass straight through to the operator;
/// the structured result travels via `output_file`, communicated through
/// the two environment variables above.
#[derive(Debug, Clone)]
pub struct WrkInvocation {
    pub exe: PathBuf,
    pub target: String,
    pub connections: u32,
    pub threads: u32,
    pub duration: String,
    pub script: PathBuf,
    pub json_helper: PathBuf,
    pub output_file: PathBuf,
}

impl WrkInvocation {
    /// Build the invocation for one scenario against `base_url`.
    pub fn new(config: &HarnessConfig, base_url: &str, test: &TestScenario) -> Self {
        Self {
            exe: config.wrk_exe.clone(),
            target: format!("{base_url}{}", test.path),
            connections: test.connections,
            threads: test.threads,
            duration: test.duration.to_string(),
            script: config.assets_dir.join(BENCH_SCRIPT),
            json_helper: config.assets_dir.join(JSON_HELPER),
            // Unique per process and scenario so concurrent runs on a
            // shared machine cannot race on the same path.
            output_file: std::env::temp_dir().join(format!(
                "statbench-{}-{}.json",
                std::process::id(),
                test.name
            )),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.arg("-c")
            .arg(self.connections.to_string())
            .arg("-t")
            .arg(self.threads.to_string())
            .arg("-d")
            .arg(&self.duration)
            .arg("-s")
            .arg(&self.script)
            .arg(&self.target)
            .env(JSON_OUTPUT_ENV, &self.output_file)
            .env(JSON_HELPER_ENV, &self.json_helper)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    /// The command line as it would be typed, for verbose echo.
    pub fn render(&self) -> String {
        format!(
            "{} -c {} -t {} -d {} -s {} {}",
            self.exe.display(),
            self.connections,
            self.threads,
            self.duration,
            self.script.display(),
            self.target
        )
    }

    /// Run the tool to completion and ingest its JSON result.
    ///
    /// The transient result file is deleted whether or not it parsed;
    /// nothing of the invocation outlives this call but the returned
    /// value.
    pub async fn run(&self) -> Result<serde_json::Value, DriverError> {
        let mut child = self.command().spawn().map_err(|source| DriverError::Spawn {
            exe: self.exe.clone(),
            source,
        })?;

        // The tool's exit status is advisory; what decides success is
        // whether it left a parseable result behind.
        let _ = child.wait().await;

        let raw = std::fs::read(&self.output_file);
        let _ = std::fs::remove_file(&self.output_file);

        let raw = raw.map_err(DriverError::MissingResult)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Run every scheduled scenario against `base_url` and aggregate the
/// results. Unknown names and failed invocations are logged and skipped;
/// they never appear in the report.
pub async fn run_client(config: &HarnessConfig, base_url: &str) -> Result<Report, DriverError> {
    limits::raise_nofile_limit();

    let json_helper = config.assets_dir.join(JSON_HELPER);
    if !json_helper.is_file() {
        return Err(DriverError::MissingHelper(json_helper));
    }

    let mut report = Report::new();
    for name in &config.run_selection {
        let test = match catalog::lookup(name) {
            Ok(test) => test,
            Err(_) => {
                warn!("test {name} not found, skipping");
                continue;
            }
        };

        println!("Now running test: {name}");
        let invocation = WrkInvocation::new(config, base_url, test);
        if config.verbose {
            println!("I will now run: {}", invocation.render());
        }

        match invocation.run().await {
            Ok(result) => report.insert(name, result),
            Err(e) => warn!("an exception occurred ({e}), skipping this test"),
        }
    }

    Ok(report)
}
