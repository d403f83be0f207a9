//! Timeout and retry wrapper around a backend
//!
//! Policy: up to `max_attempts` calls. Client errors (HTTP 4xx other than 429)
//! fail immediately; every other failure is retried after an exponential
//! backoff starting at `initial_backoff` and capped at `max_backoff`.
//! The per-call timeout is enforced by the backend's HTTP agent.

use eyre::Result;
use std::time::Duration;

use super::Generator;
use crate::config::GeneratorConfig;

/// Retry/backoff policy for generation calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based count of failures so far)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Generator decorator applying a [`RetryPolicy`]
pub struct ReliableGenerator {
    inner: Box<dyn Generator>,
    policy: RetryPolicy,
}

impl ReliableGenerator {
    pub fn new(inner: Box<dyn Generator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl Generator for ReliableGenerator {
    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.inner.generate(prompt, system_prompt) {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.policy.max_attempts && is_retryable(&e) => {
                    let delay = self.policy.backoff(attempt);
                    log::warn!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        self.inner.name(),
                        attempt,
                        self.policy.max_attempts,
                        e,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("{} failed after {} attempt(s): {:#}", self.inner.name(), attempt, e);
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> String {
        self.inner.name()
    }
}

fn is_retryable(err: &eyre::Report) -> bool {
    match err.downcast_ref::<ureq::Error>() {
        Some(ureq::Error::StatusCode(code)) => *code == 429 || *code >= 500,
        _ => true,
    }
}
