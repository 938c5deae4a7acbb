//! The result-ingestion pipeline: evaluate → record → transition → notify.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

use upwatch_core::{HealthCheck, HealthCheckResult, NewResult, ProbeReport, evaluate};
use upwatch_state::StateStore;

use crate::alarm::{AlarmEvent, transition};
use crate::error::{PipelineError, PipelineResult};
use crate::notify::{AlarmNotice, Notifier};

/// Actor recorded on alarm-state mutations made by the pipeline.
const SYSTEM_ACTOR: &str = "system";

/// What one ingested report produced.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The persisted result record.
    pub result: HealthCheckResult,
    /// The alarm transition this probe caused, if any.
    pub transition: Option<AlarmEvent>,
}

/// The single pipeline every probe report flows through.
///
/// Cloneable and safe for concurrent use; each ingest call is independent.
#[derive(Clone)]
pub struct ResultPipeline {
    store: StateStore,
    notifier: Arc<dyn Notifier>,
}

impl ResultPipeline {
    pub fn new(store: StateStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Ingest one probe report for its check.
    ///
    /// Steps are strictly sequential: evaluate the report, persist the
    /// result record, move the alarm state on an edge, then notify. The
    /// state update is persisted before notification; if it fails, the
    /// transition is not assumed to have happened and nothing is sent.
    pub async fn ingest(&self, report: &ProbeReport) -> PipelineResult<IngestOutcome> {
        let check = self
            .store
            .fetch_check(&report.health_check_id)?
            .ok_or_else(|| PipelineError::UnknownCheck(report.health_check_id.clone()))?;

        let failure = evaluate(&check, report);
        if let Some(reason) = &failure {
            debug!(check_id = %check.id, %reason, "probe evaluated as failure");
        }

        let result = self
            .store
            .create_result(NewResult::from_report(report, failure.clone()))?;

        let event = transition(check.alarm_state, failure.is_some());
        if let Some(event) = event {
            self.store
                .update_alarm_state(&check.id, event.target_state(), SYSTEM_ACTOR)?;
            info!(check_id = %check.id, url = %check.url, ?event, "alarm state transitioned");
            self.notify(&check, event).await;
        }

        Ok(IngestOutcome {
            result,
            transition: event,
        })
    }

    /// Best-effort owner notification. Failures are logged, never escalated.
    async fn notify(&self, check: &HealthCheck, event: AlarmEvent) {
        let owner = match self.store.fetch_owner(&check.user_id) {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                error!(check_id = %check.id, owner_id = %check.user_id, "cannot notify: owner not found");
                return;
            }
            Err(e) => {
                error!(check_id = %check.id, error = %e, "cannot notify: owner lookup failed");
                return;
            }
        };
        let Some(email) = owner.email else {
            error!(check_id = %check.id, owner_id = %owner.id, "cannot notify: owner has no email");
            return;
        };

        let notice = AlarmNotice {
            recipient_email: email,
            check_url: check.url.clone(),
            check_name: check.name.clone(),
            timestamp: epoch_secs(),
        };
        let sent = match event {
            AlarmEvent::Raised => self.notifier.alarm_raised(&notice).await,
            AlarmEvent::Resolved => self.notifier.alarm_resolved(&notice).await,
        };
        if let Err(e) = sent {
            warn!(check_id = %check.id, ?event, error = %e, "notification delivery failed");
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use upwatch_core::{AlarmState, CheckOwner, HttpResponseData, NewHealthCheck};

    use crate::notify::NotifyError;

    /// Records every delivered notice; optionally fails every delivery.
    #[derive(Default)]
    struct RecordingNotifier {
        raised: Mutex<Vec<AlarmNotice>>,
        resolved: Mutex<Vec<AlarmNotice>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn alarm_raised(&self, notice: &AlarmNotice) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError("smtp down".to_string()));
            }
            self.raised.lock().unwrap().push(notice.clone());
            Ok(())
        }

        async fn alarm_resolved(&self, notice: &AlarmNotice) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError("smtp down".to_string()));
            }
            self.resolved.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    fn test_setup() -> (StateStore, Arc<RecordingNotifier>, ResultPipeline) {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = ResultPipeline::new(store.clone(), notifier.clone());
        (store, notifier, pipeline)
    }

    fn seed_check(store: &StateStore, accepted: &[&str]) -> upwatch_core::HealthCheck {
        store
            .put_owner(&CheckOwner {
                id: "user-1".to_string(),
                email: Some("ops@example.com".to_string()),
                name: None,
            })
            .unwrap();
        store
            .create_check(NewHealthCheck {
                user_id: "user-1".to_string(),
                name: None,
                url: "https://example.com/health".to_string(),
                http_method: "GET".to_string(),
                request_body: None,
                request_headers: None,
                content_type: None,
                follow_redirects: true,
                accepted_status_codes: accepted.iter().map(|s| s.to_string()).collect(),
                auth_type: None,
                auth: None,
                created_by: "user-1".to_string(),
            })
            .unwrap()
    }

    fn status_report(check_id: &str, status_code: u16) -> ProbeReport {
        ProbeReport::response(
            check_id,
            HttpResponseData {
                status_code: Some(status_code),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn unknown_check_is_rejected() {
        let (_store, _notifier, pipeline) = test_setup();
        let err = pipeline.ingest(&status_report("nope", 200)).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCheck(_)));
    }

    #[tokio::test]
    async fn passing_probe_records_without_transition() {
        let (store, notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200"]);

        let outcome = pipeline.ingest(&status_report(&check.id, 200)).await.unwrap();
        assert!(outcome.transition.is_none());
        assert!(outcome.result.error.is_none());

        assert_eq!(store.list_results(&check.id, None).unwrap().len(), 1);
        assert!(notifier.raised.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_probe_raises_and_notifies_once() {
        let (store, notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200", "201"]);

        let outcome = pipeline.ingest(&status_report(&check.id, 404)).await.unwrap();
        assert_eq!(outcome.transition, Some(AlarmEvent::Raised));
        assert_eq!(
            outcome.result.error.as_deref(),
            Some("Status code '404' was not in the accepted list: 200, 201")
        );

        let stored = store.fetch_check(&check.id).unwrap().unwrap();
        assert_eq!(stored.alarm_state, AlarmState::Alarm);
        assert_eq!(stored.updated_by, "system");

        let raised = notifier.raised.lock().unwrap();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].recipient_email, "ops@example.com");
        assert_eq!(raised[0].check_url, check.url);
    }

    #[tokio::test]
    async fn repeated_failures_notify_only_on_the_edge() {
        let (store, notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200"]);

        // success, success, failure, failure, success
        for status in [200u16, 200, 500, 500, 200] {
            pipeline.ingest(&status_report(&check.id, status)).await.unwrap();
        }

        assert_eq!(notifier.raised.lock().unwrap().len(), 1);
        assert_eq!(notifier.resolved.lock().unwrap().len(), 1);
        assert_eq!(
            store.fetch_check(&check.id).unwrap().unwrap().alarm_state,
            AlarmState::Ok
        );
        assert_eq!(store.list_results(&check.id, None).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn recovery_resolves_and_notifies() {
        let (store, notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200", "201"]);

        pipeline.ingest(&status_report(&check.id, 404)).await.unwrap();
        let outcome = pipeline.ingest(&status_report(&check.id, 200)).await.unwrap();

        assert_eq!(outcome.transition, Some(AlarmEvent::Resolved));
        assert_eq!(
            store.fetch_check(&check.id).unwrap().unwrap().alarm_state,
            AlarmState::Ok
        );
        assert_eq!(notifier.resolved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_records_null_status_code() {
        let (store, _notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200"]);

        let report = ProbeReport::transport_failure(&check.id, "connect timeout");
        let outcome = pipeline.ingest(&report).await.unwrap();

        assert_eq!(outcome.result.status_code, None);
        assert_eq!(outcome.result.error.as_deref(), Some("connect timeout"));
        assert_eq!(outcome.transition, Some(AlarmEvent::Raised));
    }

    #[tokio::test]
    async fn owner_without_email_still_transitions() {
        let (store, notifier, pipeline) = test_setup();
        let check = seed_check(&store, &["200"]);
        store
            .put_owner(&CheckOwner {
                id: "user-1".to_string(),
                email: None,
                name: None,
            })
            .unwrap();

        let outcome = pipeline.ingest(&status_report(&check.id, 500)).await.unwrap();
        assert_eq!(outcome.transition, Some(AlarmEvent::Raised));
        assert_eq!(
            store.fetch_check(&check.id).unwrap().unwrap().alarm_state,
            AlarmState::Alarm
        );
        // No notification was delivered.
        assert!(notifier.raised.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_is_swallowed() {
        let store = StateStore::open_in_memory().unwrap();
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let pipeline = ResultPipeline::new(store.clone(), notifier);
        let check = seed_check(&store, &["200"]);

        // Ingest succeeds and the transition persists despite delivery failure.
        let outcome = pipeline.ingest(&status_report(&check.id, 500)).await.unwrap();
        assert_eq!(outcome.transition, Some(AlarmEvent::Raised));
        assert_eq!(
            store.fetch_check(&check.id).unwrap().unwrap().alarm_state,
            AlarmState::Alarm
        );
    }
}
