//! Persisted result records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::check::CheckId;
use crate::report::ProbeReport;

/// Immutable record of one probe. Created once, never mutated.
///
/// `error` is non-null iff the evaluator classified the probe as a failure,
/// whether that was a transport failure or an unaccepted status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckResult {
    pub id: String,
    pub health_check_id: CheckId,
    pub status: Option<String>,
    /// Null iff the probe failed at the transport level.
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub response_body: Option<String>,
    pub response_headers: Option<HashMap<String, String>>,
    pub error: Option<String>,
    /// Unix timestamp (seconds) when this record was created.
    pub created_at: u64,
}

/// Input for persisting a result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
    pub health_check_id: CheckId,
    pub status: Option<String>,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub response_body: Option<String>,
    pub response_headers: Option<HashMap<String, String>>,
    pub error: Option<String>,
}

impl NewResult {
    /// Map a probe report plus its evaluation verdict into the persisted
    /// result shape. Response fields stay null for transport failures.
    pub fn from_report(report: &ProbeReport, error: Option<String>) -> Self {
        let response = report.http.as_ref().and_then(|h| h.response.as_ref());
        Self {
            health_check_id: report.health_check_id.clone(),
            status: response.and_then(|r| r.status.clone()),
            status_code: response.and_then(|r| r.status_code),
            response_time_ms: response.and_then(|r| r.response_time_ms),
            response_body: response.and_then(|r| r.response_body.clone()),
            response_headers: response.and_then(|r| r.response_headers.clone()),
            error,
        }
    }
}

/// One local-calendar day of the daily error aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyErrorDay {
    /// Local date, `YYYY-MM-DD`.
    pub day: String,
    /// Whether any result that day carried a non-null error.
    pub has_error: bool,
}
