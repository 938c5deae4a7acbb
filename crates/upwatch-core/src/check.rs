//! Registered health checks and their owners.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a health check.
pub type CheckId = String;

/// Unique identifier for a check owner.
pub type OwnerId = String;

// ── Alarm state ────────────────────────────────────────────────────

/// Persisted alarm state of a check.
///
/// Changed only by the alarm state machine, never by a user edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    #[default]
    Ok,
    Alarm,
}

// ── Health check ───────────────────────────────────────────────────

/// A monitored HTTP endpoint with its probing rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheck {
    pub id: CheckId,
    pub user_id: OwnerId,
    pub name: Option<String>,
    /// Target URL to probe.
    pub url: String,
    /// HTTP method for the probe request (e.g. "GET", "POST").
    pub http_method: String,
    pub request_body: Option<String>,
    pub request_headers: Option<HashMap<String, String>>,
    pub content_type: Option<String>,
    /// Whether the prober follows redirects (bounded) or treats the first
    /// redirect response as the outcome.
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Status codes (string-encoded) considered a passing probe. Never empty.
    pub accepted_status_codes: Vec<String>,
    pub auth_type: Option<String>,
    pub auth: Option<serde_json::Value>,
    #[serde(default)]
    pub alarm_state: AlarmState,
    /// Unix timestamp (seconds) when this check was created.
    pub created_at: u64,
    pub created_by: String,
    /// Unix timestamp (seconds) of the last update.
    pub updated_at: u64,
    pub updated_by: String,
}

/// Input for creating a health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHealthCheck {
    pub user_id: OwnerId,
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
    pub http_method: String,
    #[serde(default)]
    pub request_body: Option<String>,
    #[serde(default)]
    pub request_headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    pub accepted_status_codes: Vec<String>,
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub auth: Option<serde_json::Value>,
    pub created_by: String,
}

/// Wire envelope for the check listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckList {
    pub results: Vec<HealthCheck>,
}

// ── Owner ──────────────────────────────────────────────────────────

/// The notification target for a check. Authentication and account
/// management live outside the core; this is only what the notifier needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOwner {
    pub id: OwnerId,
    pub email: Option<String>,
    pub name: Option<String>,
}

pub(crate) fn default_true() -> bool {
    true
}
