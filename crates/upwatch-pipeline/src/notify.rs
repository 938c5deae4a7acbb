//! Notification seam.
//!
//! The pipeline talks to an abstract [`Notifier`]; the actual transport
//! (SMTP, provider API) lives outside the core. Delivery is best-effort:
//! the pipeline logs failures and never retries within a cycle.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// A notification about one alarm transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmNotice {
    pub recipient_email: String,
    pub check_url: String,
    pub check_name: Option<String>,
    /// Unix timestamp (seconds) of the transition.
    pub timestamp: u64,
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Sends alarm-raised / alarm-resolved messages to a check's owner.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn alarm_raised(&self, notice: &AlarmNotice) -> Result<(), NotifyError>;
    async fn alarm_resolved(&self, notice: &AlarmNotice) -> Result<(), NotifyError>;
}

/// Notifier that writes structured log events instead of sending mail.
/// Used in deployments without an outbound mail transport and in tests.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn alarm_raised(&self, notice: &AlarmNotice) -> Result<(), NotifyError> {
        info!(
            recipient = %notice.recipient_email,
            url = %notice.check_url,
            timestamp = notice.timestamp,
            "alarm raised"
        );
        Ok(())
    }

    async fn alarm_resolved(&self, notice: &AlarmNotice) -> Result<(), NotifyError> {
        info!(
            recipient = %notice.recipient_email,
            url = %notice.check_url,
            timestamp = notice.timestamp,
            "alarm resolved"
        );
        Ok(())
    }
}
