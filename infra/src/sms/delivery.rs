//! Retry and deadline policy shared by the real providers

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use vk_core::errors::DispatchError;
use vk_shared::phone::mask_phone_number;

/// Read a per-provider override, falling back to the shared setting
pub(crate) fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// How a single provider call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptError {
    /// The provider refused the request itself; retrying cannot help
    Rejected(String),
    /// Throttling, network trouble, 5xx
    Transient(String),
}

/// Bounded retry with doubling delay, all attempts under one deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay_ms: u64, request_timeout_secs: u64) -> Self {
        Self {
            max_attempts: max_retries.max(1),
            initial_delay: Duration::from_millis(retry_delay_ms),
            deadline: Duration::from_secs(request_timeout_secs),
        }
    }

    /// Deliver to one destination, returning the provider's message id
    pub async fn run<F, Fut>(
        &self,
        provider: &str,
        destination: &str,
        mut attempt: F,
    ) -> Result<String, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, AttemptError>>,
    {
        let retries = async {
            let mut delay = self.initial_delay;
            let mut tries = 0;
            loop {
                tries += 1;
                match attempt().await {
                    Ok(message_id) => return Ok(message_id),
                    Err(AttemptError::Rejected(reason)) => {
                        return Err(DispatchError::InvalidRequest(reason))
                    }
                    Err(AttemptError::Transient(reason)) if tries >= self.max_attempts => {
                        return Err(DispatchError::provider(
                            provider,
                            format!("failed after {} attempts: {}", tries, reason),
                        ))
                    }
                    Err(AttemptError::Transient(reason)) => {
                        warn!(
                            provider = provider,
                            attempt = tries,
                            max_attempts = self.max_attempts,
                            retry_in_ms = delay.as_millis() as u64,
                            error = %reason,
                            "Transient SMS provider error"
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        };

        tokio::time::timeout(self.deadline, retries)
            .await
            .map_err(|_| {
                warn!(
                    provider = provider,
                    destination = %mask_phone_number(destination),
                    deadline_ms = self.deadline.as_millis() as u64,
                    "SMS provider deadline exceeded"
                );
                DispatchError::Timeout {
                    provider: provider.to_string(),
                }
            })?
    }
}
