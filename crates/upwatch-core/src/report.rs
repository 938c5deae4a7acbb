//! Probe reports — the transfer form of one probe's raw outcome.
//!
//! A report is produced by the prober and submitted to the control plane
//! (`POST /v1/results`). It carries either an HTTP response or a transport
//! error; a report with neither is possible on the wire and is classified
//! by the evaluator as "no response received".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::check::CheckId;

/// Outcome of one probe against one check, as submitted over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeReport {
    pub health_check_id: CheckId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpOutcome>,
}

/// The HTTP leg of a probe: a transport error or a received response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpOutcome {
    /// Transport-level failure (DNS, connect, TLS, timeout), verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponseData>,
}

/// A received HTTP response. Any status code counts as a response here;
/// acceptance is decided later by the evaluator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpResponseData {
    /// Status text (e.g. "OK", "Not Found").
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub response_headers: Option<HashMap<String, String>>,
}

impl ProbeReport {
    /// Build a transport-failure report (no response obtained).
    pub fn transport_failure(check_id: impl Into<CheckId>, error: impl Into<String>) -> Self {
        Self {
            health_check_id: check_id.into(),
            http: Some(HttpOutcome {
                error: Some(error.into()),
                response: None,
            }),
        }
    }

    /// Build a report from a received HTTP response.
    pub fn response(check_id: impl Into<CheckId>, response: HttpResponseData) -> Self {
        Self {
            health_check_id: check_id.into(),
            http: Some(HttpOutcome {
                error: None,
                response: Some(response),
            }),
        }
    }
}
