//! Startup verification of the server-under-test
//!
//! Before any load is generated, the harness issues one pass of GET
//! requests against five fixed paths and checks each response against an
//! expectation. The server is healthy only if all five probes succeed in
//! a single pass. The protocol is read-only and safe to repeat.

use thiserror::Error;

use crate::fixtures::{Fixtures, REFERENCE_DOC};

/// Errors produced by a single health-check pass
#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {path}, expected success")]
    BadStatus {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("did not find expected content at {path}")]
    ContentMismatch { path: String },

    #[error("response for {path} is {actual} bytes, expected at least {expected}")]
    TooShort {
        path: String,
        expected: usize,
        actual: usize,
    },
}

impl HealthCheckError {
    /// Whether this error looks like the server simply is not up yet,
    /// as opposed to serving wrong content.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, HealthCheckError::Request { .. })
    }
}

/// What a probe expects of the response body.
#[derive(Debug, Clone)]
pub enum Expectation {
    /// Body must match these bytes exactly
    ExactContent(Vec<u8>),
    /// Body must be at least this long; a proxy for "looks like real data"
    /// on endpoints whose content varies run to run
    MinimumLength(usize),
}

impl Expectation {
    /// Check a response body against this expectation.
    pub fn verify(&self, path: &str, body: &[u8]) -> Result<(), HealthCheckError> {
        match self {
            Expectation::ExactContent(expected) => {
                if body == expected.as_slice() {
                    Ok(())
                } else {
                    Err(HealthCheckError::ContentMismatch {
                        path: path.to_string(),
                    })
                }
            }
            Expectation::MinimumLength(min) => {
                if body.len() >= *min {
                    Ok(())
                } else {
                    Err(HealthCheckError::TooShort {
                        path: path.to_string(),
                        expected: *min,
                        actual: body.len(),
                    })
                }
            }
        }
    }
}

/// One health-check probe: a path and the expectation for its body.
#[derive(Debug, Clone)]
pub struct Probe {
    pub path: String,
    pub expectation: Expectation,
}

/// The fixed probe set for one verification pass.
///
/// The two synthetic payloads and the reference document are checked for
/// exact byte equality against the fixture content written at startup;
/// the two stat endpoints only for a minimum plausible length.
pub fn probe_set(fixtures: &Fixtures) -> Vec<Probe> {
    vec![
        Probe {
            path: "/files/small".to_string(),
            expectation: Expectation::ExactContent(fixtures.small.clone()),
        },
        Probe {
            path: "/files/large".to_string(),
            expectation: Expectation::ExactContent(fixtures.large.clone()),
        },
        Probe {
            path: format!("/files/{REFERENCE_DOC}"),
            expectation: Expectation::ExactContent(fixtures.reference.clone()),
        },
        Probe {
            path: "/loadavg".to_string(),
            expectation: Expectation::MinimumLength(10),
        },
        Probe {
            path: "/meminfo".to_string(),
            expectation: Expectation::MinimumLength(100),
        },
    ]
}

/// Run one full health-check pass against `base_url`.
///
/// Fails on the first probe whose request errors, returns a non-success
/// status, or misses its expectation.
pub async fn run_pass(
    client: &reqwest::Client,
    base_url: &str,
    probes: &[Probe],
) -> Result<(), HealthCheckError> {
    for probe in probes {
        let url = format!("{base_url}{}", probe.path);
        let response =
            client
                .get(&url)
                .send()
                .await
                .map_err(|source| HealthCheckError::Request {
                    path: probe.path.clone(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthCheckError::BadStatus {
                path: probe.path.clone(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| HealthCheckError::Request {
                path: probe.path.clone(),
                source,
            })?;

        probe.expectation.verify(&probe.path, &body)?;
        tracing::debug!("retrieved {} ok", probe.path);
    }

    Ok(())
}
