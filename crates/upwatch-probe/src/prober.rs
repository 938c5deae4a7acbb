//! Probe execution.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use tracing::debug;

use upwatch_core::{HealthCheck, HttpResponseData, ProbeReport};

/// Hard ceiling on one probe request, connect through body.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Redirect hop limit when a check follows redirects.
const MAX_REDIRECTS: usize = 5;

/// Issues probe requests. Holds one client per redirect policy; clients are
/// cheap to clone and safe to share across concurrent probes.
#[derive(Clone)]
pub struct ProbeClient {
    follow: Client,
    no_follow: Client,
}

impl ProbeClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            follow: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .redirect(Policy::limited(MAX_REDIRECTS))
                .build()?,
            no_follow: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .redirect(Policy::none())
                .build()?,
        })
    }

    /// Execute one probe and translate the raw outcome into a report.
    ///
    /// Never returns an error: anything that prevents a response — an
    /// unusable method, DNS failure, timeout, TLS error — becomes a
    /// transport-failure report for the evaluator to classify.
    pub async fn probe(&self, check: &HealthCheck) -> ProbeReport {
        let client = if check.follow_redirects {
            &self.follow
        } else {
            &self.no_follow
        };

        let method = match Method::from_bytes(check.http_method.as_bytes()) {
            Ok(method) => method,
            Err(e) => {
                return ProbeReport::transport_failure(
                    &check.id,
                    format!("invalid HTTP method '{}': {e}", check.http_method),
                );
            }
        };

        let mut request = client.request(method, &check.url);
        if let Some(headers) = &check.request_headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        if let Some(content_type) = &check.content_type {
            let already_set = check
                .request_headers
                .as_ref()
                .is_some_and(|h| h.keys().any(|k| k.eq_ignore_ascii_case("content-type")));
            if !already_set {
                request = request.header("content-type", content_type.as_str());
            }
        }
        if let Some(body) = &check.request_body {
            request = request.body(body.clone());
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(check_id = %check.id, url = %check.url, error = %e, "probe transport failure");
                return ProbeReport::transport_failure(&check.id, e.to_string());
            }
        };

        let status = response.status();
        let response_headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        // The body is part of the probe; a read failure mid-body means the
        // probe did not complete.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(check_id = %check.id, url = %check.url, error = %e, "probe body read failed");
                return ProbeReport::transport_failure(&check.id, e.to_string());
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            check_id = %check.id,
            status = status.as_u16(),
            elapsed_ms,
            "probe completed"
        );

        ProbeReport::response(
            &check.id,
            HttpResponseData {
                status: Some(
                    status
                        .canonical_reason()
                        .unwrap_or_default()
                        .to_string(),
                ),
                status_code: Some(status.as_u16()),
                response_time_ms: Some(elapsed_ms),
                response_body: Some(body),
                response_headers: Some(response_headers),
            },
        )
    }
}
