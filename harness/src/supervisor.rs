//! Server role: launch and supervise the server-under-test
//!
//! The supervisor owns the child process for its whole lifetime. The
//! child is spawned with kill-on-drop so no exit path of the harness,
//! including panics, leaves an orphaned server behind; interrupt signals
//! additionally trigger an explicit kill before the harness returns.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::signal;
use tracing::{debug, info, warn};

use crate::config::{HarnessConfig, local_hostname};
use crate::fixtures;
use crate::health;
use crate::limits;

/// Default number of full health-check passes before giving up
pub const HEALTH_CHECK_ATTEMPTS: u32 = 10;

/// Default pause before each health-check pass, giving the server time
/// to bind
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Errors that prevent the server role from starting
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("did not find server executable: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("server executable is not executable: {0}")]
    NotExecutable(PathBuf),

    #[error("failed to prepare fixture files: {0}")]
    Fixtures(#[source] std::io::Error),

    #[error("failed to launch server {exe:?}: {source}")]
    Spawn {
        exe: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the server role ended.
#[derive(Debug)]
pub enum ServerOutcome {
    /// The server never passed a health check within the retry budget.
    /// A reportable condition for the server's authors, not a harness
    /// failure: the harness exits 0.
    NeverHealthy,
    /// The server exited on its own after serving the benchmark
    Exited(Option<i32>),
    /// The harness was interrupted; the server has been killed
    Interrupted,
}

/// Pseudo-random but deterministic port in the 20000..30000 range,
/// derived from the pid to reduce collision risk across concurrent
/// benchmark runs on shared machines.
pub fn derive_port() -> u16 {
    (std::process::id() % 10000 + 20000) as u16
}

/// Check that the server binary exists and carries an execute bit.
pub fn verify_executable(path: &Path) -> Result<(), SupervisorError> {
    let metadata =
        std::fs::metadata(path).map_err(|_| SupervisorError::ExecutableNotFound(path.into()))?;
    if !metadata.is_file() {
        return Err(SupervisorError::ExecutableNotFound(path.into()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(SupervisorError::NotExecutable(path.into()));
        }
    }

    Ok(())
}

/// Run the server role to completion.
///
/// Prepares fixtures, launches the server-under-test, verifies it with
/// the bounded-retry health check, prints the URL for the client-role
/// invocation, then blocks until the server exits or the harness is
/// interrupted.
pub async fn run_server(config: &HarnessConfig) -> Result<ServerOutcome, SupervisorError> {
    limits::raise_nofile_limit();
    verify_executable(&config.server_exe)?;

    println!("I will now prepare your server for benchmarking.");
    let fixtures = fixtures::prepare(&config.server_root, &config.assets_dir)
        .map_err(SupervisorError::Fixtures)?;

    let port = derive_port();
    let hostname = local_hostname();

    // Server stdout is noise at benchmark volume; stderr stays visible
    // so startup failures reach the operator.
    let mut cmd = Command::new(&config.server_exe);
    cmd.arg("-p")
        .arg(port.to_string())
        .arg("-R")
        .arg(&config.server_root)
        .arg("-s")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    if config.verbose {
        println!(
            "I will now run: {} -p {port} -R {} -s",
            config.server_exe.display(),
            config.server_root.display()
        );
    }

    let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
        exe: config.server_exe.clone(),
        source,
    })?;

    // The signal listener stays armed from the moment the child exists,
    // covering the health-check window as well as the serving phase: an
    // interrupt during either kills the child before the harness exits.
    let base_url = format!("http://{hostname}:{port}");
    tokio::select! {
        outcome = verify_and_wait(config, &mut child, &base_url, &fixtures) => outcome,
        _ = shutdown_signal() => {
            let _ = child.kill().await;
            info!("interrupted, server process killed");
            Ok(ServerOutcome::Interrupted)
        }
    }
}

/// Health-check the freshly spawned server, then block on it.
async fn verify_and_wait(
    config: &HarnessConfig,
    child: &mut tokio::process::Child,
    base_url: &str,
    fixtures: &fixtures::Fixtures,
) -> Result<ServerOutcome, SupervisorError> {
    println!("I will now test that your server works.");
    let probes = health::probe_set(fixtures);
    let client = reqwest::Client::new();
    let attempts = config.health_attempts;

    let mut healthy = false;
    for attempt in 1..=attempts {
        tokio::time::sleep(config.health_interval).await;
        match health::run_pass(&client, base_url, &probes).await {
            Ok(()) => {
                healthy = true;
                break;
            }
            // Connection-level errors usually mean the server is still
            // starting; anything else suggests it is serving wrong
            // content, which is worth surfacing even while we retry.
            Err(e) if e.is_not_ready() => {
                debug!("health check attempt {attempt}/{attempts}: {e}");
            }
            Err(e) => {
                warn!("health check attempt {attempt}/{attempts}: {e}");
            }
        }
    }

    if !healthy {
        let _ = child.kill().await;
        println!("Your server did not start, giving up after {attempts} tries");
        return Ok(ServerOutcome::NeverHealthy);
    }

    println!(
        "\nCongratulations, you are now ready to run the benchmark!\n\
         Now, find another unloaded machine and run:\n\n\
         statbench {base_url}/\n\n\
         When you are done, don't forget to hit ^C here.\n\n\
         Your server's stdout is going to /dev/null.\n\
         Your server's stderr is going to the harness's stderr.\n"
    );

    let status = child.wait().await?;
    info!("server exited with {status}");
    Ok(ServerOutcome::Exited(status.code()))
}

/// Resolves when the harness receives Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
