//! Harness configuration and role dispatch
//!
//! All knobs are resolved once at startup into a `HarnessConfig` that is
//! handed to whichever role runs. The role itself is decided purely by
//! the presence of a target URL on the command line.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::catalog;
use crate::supervisor::{HEALTH_CHECK_ATTEMPTS, HEALTH_CHECK_INTERVAL};

/// Default path to the server-under-test executable
pub const DEFAULT_SERVER_EXE: &str = "./sysstatd";

/// Default directory for generated fixture files
pub const DEFAULT_SERVER_ROOT: &str = "_serverroot_";

/// Default load-generation tool, resolved via PATH
pub const DEFAULT_WRK_EXE: &str = "wrk";

/// Environment variable overriding the load tool executable
pub const WRK_EXE_ENV: &str = "STATBENCH_WRK";

/// Errors that make a run impossible before it starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target URL {0:?} has no host component")]
    MissingHost(String),

    #[error(
        "please do not start the client on the same machine as the server ({0} is this host)"
    )]
    SameHost(String),
}

/// Which half of the benchmark this invocation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Prepare fixtures, launch and verify the server-under-test, then idle
    Server,
    /// Drive the load tool against an already-running server
    Client {
        /// Normalized base URL (no trailing slash)
        url: String,
    },
}

/// Everything a run needs, built once from the CLI.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Path to the server-under-test executable (server role)
    pub server_exe: PathBuf,
    /// Directory where fixture files are materialized (server role)
    pub server_root: PathBuf,
    /// Ordered list of scenario names to execute (client role)
    pub run_selection: Vec<String>,
    /// Echo subprocess command lines before running them
    pub verbose: bool,
    /// Directory holding the reference document and load-tool scripts,
    /// laid out next to the harness executable by default
    pub assets_dir: PathBuf,
    /// Load-generation tool executable (client role)
    pub wrk_exe: PathBuf,
    /// Full health-check passes before giving up on the server
    pub health_attempts: u32,
    /// Pause before each health-check pass
    pub health_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_exe: PathBuf::from(DEFAULT_SERVER_EXE),
            server_root: PathBuf::from(DEFAULT_SERVER_ROOT),
            run_selection: catalog::all().iter().map(|t| t.name.to_string()).collect(),
            verbose: false,
            assets_dir: default_assets_dir(),
            wrk_exe: env::var_os(WRK_EXE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WRK_EXE)),
            health_attempts: HEALTH_CHECK_ATTEMPTS,
            health_interval: HEALTH_CHECK_INTERVAL,
        }
    }
}

/// The directory containing the running executable, falling back to the
/// current directory when it cannot be determined.
fn default_assets_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Strip trailing path separators so catalog paths (which start with `/`)
/// can be appended directly.
pub fn normalize_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Decide the role for this invocation.
///
/// A client pointed at the local host would share CPU, memory and network
/// with the server and invalidate the benchmark, so that is rejected
/// outright. The comparison uses the parsed host component of the URL,
/// not a substring match.
pub fn dispatch(target_url: Option<&str>, local_hostname: &str) -> Result<Role, ConfigError> {
    let Some(raw) = target_url else {
        return Ok(Role::Server);
    };

    let normalized = normalize_url(raw);
    let parsed = Url::parse(normalized).map_err(|source| ConfigError::InvalidUrl {
        url: normalized.to_string(),
        source,
    })?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ConfigError::MissingHost(normalized.to_string()))?;

    if host == local_hostname {
        return Err(ConfigError::SameHost(host.to_string()));
    }

    Ok(Role::Client {
        url: normalized.to_string(),
    })
}

/// The local hostname, used both for the same-host guard and for the
/// URL the server role prints.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.server_exe, PathBuf::from("./sysstatd"));
        assert_eq!(config.server_root, PathBuf::from("_serverroot_"));
        assert_eq!(config.run_selection.len(), catalog::all().len());
        assert!(!config.verbose);
        assert_eq!(config.health_attempts, 10);
        assert_eq!(config.health_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_normalize_url_strips_trailing_slashes() {
        assert_eq!(normalize_url("http://node1:20123/"), "http://node1:20123");
        assert_eq!(normalize_url("http://node1:20123///"), "http://node1:20123");
        assert_eq!(normalize_url("http://node1:20123"), "http://node1:20123");
    }

    #[test]
    fn test_dispatch_without_url_is_server_role() {
        assert_eq!(dispatch(None, "node1").unwrap(), Role::Server);
    }

    #[test]
    fn test_dispatch_with_url_is_client_role() {
        let role = dispatch(Some("http://node2:20123/"), "node1").unwrap();
        assert_eq!(
            role,
            Role::Client {
                url: "http://node2:20123".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_rejects_same_host() {
        let err = dispatch(Some("http://node1:20123/"), "node1").unwrap_err();
        assert!(matches!(err, ConfigError::SameHost(h) if h == "node1"));
    }

    #[test]
    fn test_dispatch_same_host_is_not_a_substring_match() {
        // "node1" appears in the URL but the host is "node10"
        let role = dispatch(Some("http://node10:20123/"), "node1").unwrap();
        assert!(matches!(role, Role::Client { .. }));
    }

    #[test]
    fn test_dispatch_rejects_unparseable_url() {
        assert!(matches!(
            dispatch(Some("not a url"), "node1").unwrap_err(),
            ConfigError::InvalidUrl { .. }
        ));
    }
}
