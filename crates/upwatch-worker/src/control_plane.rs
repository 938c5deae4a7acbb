//! The control-plane seam the runner drives.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use upwatch_core::{AUTH_TOKEN_HEADER, CheckList, HealthCheck, ProbeReport};
use upwatch_pipeline::{PipelineError, ResultPipeline};
use upwatch_state::StateStore;

use crate::error::{WorkerError, WorkerResult};

/// Where the runner fetches checks from and submits reports to.
///
/// Implementations must be safe for concurrent use; each submit call is
/// independent and carries its own data.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Fetch the full active check set.
    async fn fetch_checks(&self) -> WorkerResult<Vec<HealthCheck>>;

    /// Submit one probe report for recording and alarm evaluation.
    async fn submit_report(&self, report: &ProbeReport) -> WorkerResult<()>;
}

// ── HTTP control plane ─────────────────────────────────────────────

/// Control plane reached over the internal API, authenticated with the
/// pre-shared token header. Used when the worker runs apart from storage.
pub struct HttpControlPlane {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn fetch_checks(&self) -> WorkerResult<Vec<HealthCheck>> {
        let response = self
            .client
            .get(format!("{}/v1/checks", self.base_url))
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| WorkerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkerError::Api(response.status().as_u16()));
        }

        let list: CheckList = response
            .json()
            .await
            .map_err(|e| WorkerError::Transport(e.to_string()))?;
        debug!(checks = list.results.len(), "fetched active check set");
        Ok(list.results)
    }

    async fn submit_report(&self, report: &ProbeReport) -> WorkerResult<()> {
        let response = self
            .client
            .post(format!("{}/v1/results", self.base_url))
            .header(AUTH_TOKEN_HEADER, &self.token)
            .json(report)
            .send()
            .await
            .map_err(|e| WorkerError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(WorkerError::UnknownCheck),
            status => Err(WorkerError::Api(status.as_u16())),
        }
    }
}

// ── Local control plane ────────────────────────────────────────────

/// In-process control plane for standalone deployments: reads the store
/// directly and funnels reports straight through the shared pipeline.
pub struct LocalControlPlane {
    store: StateStore,
    pipeline: ResultPipeline,
}

impl LocalControlPlane {
    pub fn new(store: StateStore, pipeline: ResultPipeline) -> Self {
        Self { store, pipeline }
    }
}

#[async_trait]
impl ControlPlane for LocalControlPlane {
    async fn fetch_checks(&self) -> WorkerResult<Vec<HealthCheck>> {
        Ok(self.store.list_checks(None)?)
    }

    async fn submit_report(&self, report: &ProbeReport) -> WorkerResult<()> {
        match self.pipeline.ingest(report).await {
            Ok(_) => Ok(()),
            Err(PipelineError::UnknownCheck(_)) => Err(WorkerError::UnknownCheck),
            Err(PipelineError::Storage(e)) => Err(WorkerError::Storage(e)),
        }
    }
}
