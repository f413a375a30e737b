//! Concurrency-bounded HTTP client with retry and backoff.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::config::{ApiConfig, RetryConfig};

/// Client for the works API.
///
/// One instance owns the connection pool and the semaphore bounding in-flight
/// requests; clones share both, so every logical operation issued through the
/// same client competes for the same concurrency ceiling. Retry handling
/// lives entirely here: callers see either a parsed body or
/// [`ApiError::RetriesExhausted`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    mailto: Option<String>,
    limiter: Arc<Semaphore>,
    retry: RetryConfig,
}

/// Outcome of one request attempt.
enum Attempt {
    Body(Value),
    /// HTTP 429 with the delay the server asked for.
    RateLimited(Duration),
    /// HTTP 403, treated as a transient block.
    Blocked,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(api: &ApiConfig, retry: RetryConfig) -> Self {
        let user_agent = match &api.mailto {
            Some(mailto) => format!(
                "{}/{} (mailto:{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                mailto
            ),
            None => format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        };
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            mailto: api.mailto.clone(),
            limiter: Arc::new(Semaphore::new(api.concurrency)),
            retry,
        }
    }

    /// Fetch one resource as JSON.
    ///
    /// A concurrency slot is held for the whole call, including retries and
    /// the short randomized pause after a successful response; the pause
    /// keeps freed slots from bursting against the service all at once.
    ///
    /// Rate limiting (429) sleeps for the server's `Retry-After` hint and
    /// retries without consuming the attempt budget. A 403 block and any
    /// other failure each consume one attempt until the budget runs out;
    /// blocks wait the fixed blocked delay, everything else backs off
    /// exponentially.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .expect("client semaphore never closed");

        let url = format!("{}{}", self.base_url, path);
        let mut query: Vec<(&str, String)> = params.to_vec();
        if let Some(mailto) = &self.mailto {
            query.push(("mailto", mailto.clone()));
        }

        let mut failures = 0u32;
        loop {
            match self.attempt(&url, &query).await {
                Ok(Attempt::Body(body)) => {
                    let jitter = rand::thread_rng().gen_range(50..150);
                    sleep(Duration::from_millis(jitter)).await;
                    return Ok(body);
                }
                Ok(Attempt::RateLimited(delay)) => {
                    debug!("rate limited on {url}, retrying in {delay:?}");
                    sleep(delay).await;
                }
                Ok(Attempt::Blocked) => {
                    failures += 1;
                    if failures >= self.retry.max_attempts {
                        let last = String::from("blocked (HTTP 403)");
                        warn!("giving up on {url} after {failures} attempts: {last}");
                        return Err(ApiError::RetriesExhausted {
                            attempts: failures,
                            last,
                        });
                    }
                    let delay = self.retry.blocked_delay();
                    debug!("blocked on {url} (attempt {failures}), retrying in {delay:?}");
                    sleep(delay).await;
                }
                Err(last) => {
                    failures += 1;
                    if failures >= self.retry.max_attempts {
                        warn!("giving up on {url} after {failures} attempts: {last}");
                        return Err(ApiError::RetriesExhausted {
                            attempts: failures,
                            last,
                        });
                    }
                    let delay = self.retry.backoff_delay(failures);
                    debug!("attempt {failures} on {url} failed ({last}), retrying in {delay:?}");
                    sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, url: &str, query: &[(&str, String)]) -> Result<Attempt, String> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| format!("request error: {e}"))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Ok(Attempt::RateLimited(retry_after(
                &response,
                self.retry.rate_limit_delay(),
            ))),
            StatusCode::FORBIDDEN => Ok(Attempt::Blocked),
            status if status.is_success() => response
                .json::<Value>()
                .await
                .map(Attempt::Body)
                .map_err(|e| format!("body error: {e}")),
            status => Err(format!("unexpected status {status}")),
        }
    }
}

/// Parse the server's `Retry-After` hint, falling back to the configured
/// default when absent or unparseable.
fn retry_after(response: &Response, fallback: Duration) -> Duration {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}
