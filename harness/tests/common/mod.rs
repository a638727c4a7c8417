//! Shared helpers for harness integration tests
//!
//! Provides a mock server-under-test (axum, ephemeral port) and a fake
//! load tool (shell script honoring the JSON output contract) so the
//! orchestration paths can be exercised without sysstatd or wrk.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use statbench::fixtures::{Fixtures, REFERENCE_DOC, synthetic_content};

/// Content the mock server-under-test serves
#[derive(Clone)]
pub struct MockContent {
    pub fixtures: Fixtures,
    pub loadavg: String,
    pub meminfo: String,
    /// When false, /meminfo answers 404 to simulate a broken server
    pub serve_meminfo: bool,
}

impl MockContent {
    pub fn healthy(fixtures: Fixtures) -> Self {
        Self {
            fixtures,
            loadavg: "0.08 0.11 0.09 3/371 14223".to_string(),
            meminfo: "MemTotal: 16309772 kB\nMemFree: 8917848 kB\nBuffers: 214788 kB\n\
                      Cached: 3615884 kB\nSwapCached: 0 kB\nActive: 5384788 kB\n"
                .to_string(),
            serve_meminfo: true,
        }
    }
}

/// Small fixture set so tests stay fast; the health check only cares
/// about byte equality, not about the production sizes.
pub fn small_fixtures() -> Fixtures {
    Fixtures {
        small: synthetic_content(64),
        large: synthetic_content(4096),
        reference: b"<html><body>reference snapshot</body></html>".to_vec(),
    }
}

/// A running mock server-under-test.
pub struct MockServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the mock server on an ephemeral local port.
pub async fn spawn_mock_server(content: MockContent) -> MockServer {
    let content = Arc::new(content);

    async fn small(State(c): State<Arc<MockContent>>) -> Vec<u8> {
        c.fixtures.small.clone()
    }
    async fn large(State(c): State<Arc<MockContent>>) -> Vec<u8> {
        c.fixtures.large.clone()
    }
    async fn reference(State(c): State<Arc<MockContent>>) -> Vec<u8> {
        c.fixtures.reference.clone()
    }
    async fn loadavg(State(c): State<Arc<MockContent>>) -> String {
        c.loadavg.clone()
    }
    async fn meminfo(
        State(c): State<Arc<MockContent>>,
    ) -> Result<String, axum::http::StatusCode> {
        if c.serve_meminfo {
            Ok(c.meminfo.clone())
        } else {
            Err(axum::http::StatusCode::NOT_FOUND)
        }
    }

    let app = Router::new()
        .route("/files/small", get(small))
        .route("/files/large", get(large))
        .route(&format!("/files/{REFERENCE_DOC}"), get(reference))
        .route("/loadavg", get(loadavg))
        .route("/meminfo", get(meminfo))
        .with_state(content);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer {
        base_url: format!("http://{addr}"),
        handle,
    }
}

/// Lay out an assets directory the way a deployment would: the JSON
/// helper, the bench script, and the reference document under res/.
pub fn write_assets(dir: &Path, reference: &[u8]) {
    std::fs::create_dir_all(dir.join("res")).unwrap();
    std::fs::write(dir.join("res").join(REFERENCE_DOC), reference).unwrap();
    std::fs::write(dir.join("JSON.lua"), "-- json helper stub\n").unwrap();
    std::fs::write(dir.join("bench.lua"), "-- bench script stub\n").unwrap();
}

/// Write an executable stand-in for wrk that emits `json_body` to the
/// path named by JSON_OUTPUT_FILE and exits 0.
#[cfg(unix)]
pub fn write_fake_wrk(dir: &Path, json_body: &str) -> PathBuf {
    write_script(
        dir,
        "fake-wrk",
        &format!("#!/bin/sh\nprintf '%s' '{json_body}' > \"$JSON_OUTPUT_FILE\"\n"),
    )
}

/// Write a stand-in for wrk that fails without producing a result file.
#[cfg(unix)]
pub fn write_broken_wrk(dir: &Path) -> PathBuf {
    write_script(dir, "broken-wrk", "#!/bin/sh\nexit 1\n")
}

/// Write an executable stand-in for the server-under-test that accepts
/// the launch arguments but never listens on its port.
#[cfg(unix)]
pub fn write_deaf_server(dir: &Path) -> PathBuf {
    write_script(dir, "deaf-server", "#!/bin/sh\nsleep 30\n")
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
