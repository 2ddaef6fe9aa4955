//! Executes a single `HttpRequest` against the server.
//!
//! # Design
//! One call is one exchange: no retries, no caching. The deadline wraps the
//! whole exchange (send and body read) in `tokio::time::timeout`. When it
//! fires, the exchange future is dropped, which aborts the in-flight request
//! and closes its connection; the timer itself is dropped on every return
//! path because it lives inside the `timeout` future.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpRequest, HttpResponse};

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone)]
pub(crate) struct Executor {
    http: reqwest::Client,
    token: String,
    timeout: Duration,
}

impl Executor {
    pub(crate) fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.validate_tls())
            .build()?;
        Ok(Self {
            http,
            token: config.token().to_string(),
            timeout: config.timeout(),
        })
    }

    /// Perform the exchange. Non-2xx statuses come back as `Err`.
    pub(crate) async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let started = Instant::now();
        let url = request.url();

        match tokio::time::timeout(self.timeout, self.exchange(request, &url)).await {
            Ok(Ok(response)) => {
                debug!(
                    method = request.method.as_str(),
                    url = %url,
                    status = response.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                Ok(response)
            }
            Ok(Err(err)) => {
                debug!(
                    method = request.method.as_str(),
                    url = %url,
                    status = err.status(),
                    error = %err,
                    "request failed"
                );
                Err(err)
            }
            Err(_) => {
                warn!(
                    method = request.method.as_str(),
                    url = %url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "request deadline elapsed, aborting"
                );
                Err(ApiError::timeout(self.timeout))
            }
        }
    }

    async fn exchange(&self, request: &HttpRequest, url: &str) -> Result<HttpResponse, ApiError> {
        let mut builder = self
            .http
            .request(request.method.into(), url)
            .bearer_auth(&self.token);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNKNOWN_ERROR.to_string());
            return Err(ApiError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                body,
            ));
        }

        let body = response.text().await?;
        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
