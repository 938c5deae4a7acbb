//! The probe cycle loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use upwatch_probe::ProbeClient;

use crate::control_plane::ControlPlane;

/// Default wall-clock delay between cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Drives probe cycles: fetch the check set, probe every check
/// concurrently, submit each report independently.
pub struct Runner {
    plane: Arc<dyn ControlPlane>,
    prober: ProbeClient,
    interval: Duration,
}

impl Runner {
    pub fn new(plane: Arc<dyn ControlPlane>, prober: ProbeClient, interval: Duration) -> Self {
        Self {
            plane,
            prober,
            interval,
        }
    }

    /// Run cycles until the shutdown signal flips.
    ///
    /// The first cycle starts immediately; after that, each cycle begins a
    /// fixed interval after the previous one completed. Cycles never
    /// overlap — a slow cycle delays the next one rather than stacking.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "worker started");

        self.cycle().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.cycle().await;
                }
                _ = shutdown.changed() => {
                    info!("worker shutting down");
                    break;
                }
            }
        }
    }

    /// One probe cycle over the full active check set.
    ///
    /// Failures are contained per check: a fetch failure turns the whole
    /// cycle into a no-op, a single check's probe or submission failure is
    /// logged without touching the other checks.
    pub async fn cycle(&self) {
        let checks = match self.plane.fetch_checks().await {
            Ok(checks) => checks,
            Err(e) => {
                warn!(error = %e, "failed to fetch check set, skipping cycle");
                return;
            }
        };

        if checks.is_empty() {
            debug!("no checks registered, skipping cycle");
            return;
        }

        info!(checks = checks.len(), "probe cycle starting");

        let mut tasks = JoinSet::new();
        for check in checks {
            let plane = self.plane.clone();
            let prober = self.prober.clone();
            tasks.spawn(async move {
                let report = prober.probe(&check).await;
                if let Err(e) = plane.submit_report(&report).await {
                    warn!(check_id = %check.id, url = %check.url, error = %e, "result submission failed");
                }
            });
        }

        while tasks.join_next().await.is_some() {}
        debug!("probe cycle completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use upwatch_core::{AlarmState, HealthCheck, ProbeReport};

    use crate::error::{WorkerError, WorkerResult};

    /// Control plane double: serves a canned check set, records every
    /// submission, and can fail submissions for chosen check ids.
    #[derive(Default)]
    struct MockPlane {
        checks: Vec<HealthCheck>,
        fetch_calls: Mutex<u32>,
        submitted: Mutex<Vec<ProbeReport>>,
        fail_submit_for: Vec<String>,
    }

    #[async_trait]
    impl ControlPlane for MockPlane {
        async fn fetch_checks(&self) -> WorkerResult<Vec<HealthCheck>> {
            *self.fetch_calls.lock().unwrap() += 1;
            Ok(self.checks.clone())
        }

        async fn submit_report(&self, report: &ProbeReport) -> WorkerResult<()> {
            self.submitted.lock().unwrap().push(report.clone());
            if self.fail_submit_for.contains(&report.health_check_id) {
                return Err(WorkerError::Api(500));
            }
            Ok(())
        }
    }

    /// Checks pointed at a port that is never listening: probes complete
    /// fast with a transport-failure report.
    fn test_check(id: &str) -> HealthCheck {
        HealthCheck {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: None,
            url: "http://127.0.0.1:1/".to_string(),
            http_method: "GET".to_string(),
            request_body: None,
            request_headers: None,
            content_type: None,
            follow_redirects: true,
            accepted_status_codes: vec!["200".to_string()],
            auth_type: None,
            auth: None,
            alarm_state: AlarmState::Ok,
            created_at: 1000,
            created_by: "user-1".to_string(),
            updated_at: 1000,
            updated_by: "user-1".to_string(),
        }
    }

    fn test_runner(plane: Arc<MockPlane>) -> Runner {
        Runner::new(plane, ProbeClient::new().unwrap(), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn empty_check_set_is_a_noop_cycle() {
        let plane = Arc::new(MockPlane::default());
        let runner = test_runner(plane.clone());

        runner.cycle().await;

        assert_eq!(*plane.fetch_calls.lock().unwrap(), 1);
        assert!(plane.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycle_submits_one_report_per_check() {
        let plane = Arc::new(MockPlane {
            checks: vec![test_check("hc-1"), test_check("hc-2"), test_check("hc-3")],
            ..Default::default()
        });
        let runner = test_runner(plane.clone());

        runner.cycle().await;

        let submitted = plane.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 3);
        let mut ids: Vec<_> = submitted.iter().map(|r| r.health_check_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["hc-1", "hc-2", "hc-3"]);
        // Unreachable targets yield transport-failure reports.
        for report in submitted.iter() {
            assert!(report.http.as_ref().unwrap().error.is_some());
        }
    }

    #[tokio::test]
    async fn one_failing_submission_does_not_block_the_rest() {
        let plane = Arc::new(MockPlane {
            checks: vec![test_check("hc-1"), test_check("hc-2")],
            fail_submit_for: vec!["hc-1".to_string()],
            ..Default::default()
        });
        let runner = test_runner(plane.clone());

        runner.cycle().await;

        // Both submissions were attempted despite hc-1's failure.
        assert_eq!(plane.submitted.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn run_executes_an_immediate_first_cycle() {
        let plane = Arc::new(MockPlane {
            checks: vec![test_check("hc-1")],
            ..Default::default()
        });
        let runner = test_runner(plane.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

        // Interval is an hour; any submission must come from the startup cycle.
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if !plane.submitted.lock().unwrap().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("startup cycle never submitted");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(*plane.fetch_calls.lock().unwrap(), 1);
    }
}
