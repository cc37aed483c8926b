use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::domain::errors::{RequestError, RequestErrorKind};
use crate::domain::ports::{HttpTransport, TransportFailure};
use crate::domain::value_objects::{ApiResponse, RetryPolicy};

/// One failed attempt within a single `request` call
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    pub attempt: u32,
    /// Sleep that preceded this attempt (zero for the first)
    pub delay_before: Duration,
    pub error: RequestError,
}

/// Successful value plus the failed attempts that preceded it
#[derive(Debug, Clone)]
pub struct RequestOutcome<T> {
    pub value: T,
    pub attempts_made: u32,
    pub failures: Vec<RetryAttempt>,
}

/// GET client that retries retryable failures with exponential backoff
pub struct RetryingRequestClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    policy: RetryPolicy,
    transport: Arc<dyn HttpTransport>,
}

impl RetryingRequestClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            policy,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `endpoint` with the client's default policy and unwrap the envelope
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.request_with(endpoint, &self.policy)
            .await
            .map(|outcome| outcome.value)
    }

    pub async fn request_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        policy: &RetryPolicy,
    ) -> Result<RequestOutcome<T>, RequestError> {
        let total = policy.attempts();
        let mut failures: Vec<RetryAttempt> = Vec::new();
        let mut delay_before = Duration::ZERO;
        let mut attempt = 1;

        loop {
            tracing::debug!(endpoint = %endpoint, "Request [{}/{}]", attempt, total);

            let error = match self.attempt::<T>(endpoint).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            endpoint = %endpoint,
                            "Request succeeded after {} attempts",
                            attempt
                        );
                    }
                    return Ok(RequestOutcome {
                        value,
                        attempts_made: attempt,
                        failures,
                    });
                }
                Err(e) => e.with_attempts(attempt),
            };

            tracing::warn!(
                endpoint = %endpoint,
                "Request failed [{}/{}]: {}",
                attempt,
                total,
                error.message
            );

            // Authentication/authorization errors are surfaced without retrying
            if error.is_terminal() || policy.is_last(attempt) {
                return Err(error);
            }

            failures.push(RetryAttempt {
                attempt,
                delay_before,
                error,
            });

            delay_before = policy.delay_after(attempt);
            tokio::time::sleep(delay_before).await;
            attempt += 1;
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let request = self.transport.get(&url, &self.api_key);
        let reply = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(TransportFailure::Network(reason))) => {
                return Err(RequestError::new(RequestErrorKind::Network, endpoint, reason));
            }
            Ok(Err(TransportFailure::Timeout(after))) => return Err(timed_out(endpoint, after)),
            Err(_) => return Err(timed_out(endpoint, self.timeout)),
        };

        if !reply.is_success() {
            return Err(RequestError::new(
                RequestErrorKind::from_status(reply.status),
                endpoint,
                format!("HTTP {}: {}", reply.status, reply.body),
            )
            .with_status(reply.status));
        }

        let response: ApiResponse<T> = serde_json::from_str(&reply.body).map_err(|e| {
            RequestError::new(RequestErrorKind::MalformedPayload, endpoint, e.to_string())
        })?;

        response.into_result().map_err(|reason| {
            RequestError::new(
                RequestErrorKind::Unsuccessful,
                endpoint,
                format!("API Error: {}", reason),
            )
        })
    }
}

fn timed_out(endpoint: &str, after: Duration) -> RequestError {
    RequestError::new(
        RequestErrorKind::Timeout,
        endpoint,
        format!("Request timed out after {:?}", after),
    )
}
