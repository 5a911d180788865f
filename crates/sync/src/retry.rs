//! Bounded retry for callers that need a result.

use std::time::Duration;

use podium_core::{AppConfig, Error};

use crate::reconciler::{Featured, Reconciler};

/// How often and how far apart [`Reconciler::load_featured`] retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default: 3)
    pub attempts: u32,
    /// Pause between attempts (default: 750ms)
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, delay: Duration::from_millis(750) }
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self { attempts: config.load_attempts, delay: config.retry_delay() }
    }
}

impl Reconciler {
    /// Refresh with retries.
    ///
    /// Transient failures are retried up to the configured number of
    /// attempts; anything else is returned immediately. After the last
    /// attempt the result is [`Error::RetriesExhausted`] carrying the final
    /// failure, and [`expected_slots`](Self::expected_slots) tells the caller
    /// which slots to offer a manual retry for.
    pub async fn load_featured(&self, user_id: &str) -> Result<Featured, Error> {
        let policy = self.options().retry;
        let attempts = policy.attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            match self.refresh_if_changed(user_id).await {
                Ok(featured) => return Ok(featured),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    tracing::warn!(user_id, attempt, attempts, error = %e, "featured load failed");
                    last = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(policy.delay).await;
            }
        }

        Err(Error::RetriesExhausted { attempts, last })
    }
}
