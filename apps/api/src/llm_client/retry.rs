//! Resilient completion fetching: bounded exponential backoff on overload.
//!
//! Only overload errors (see `LlmError::is_overload`) are retried. Anything else
//! propagates on the first failure. The loop is strictly sequential and has no
//! cancellation of its own; wrap it in `tokio::time::timeout` for a deadline.

use std::time::Duration;

use tracing::{info, warn};

use crate::llm_client::{CompletionModel, LlmError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff after the failed attempt `attempt` (0-based): `base * 2^attempt`, no jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Asks `model` for a completion, backing off and retrying while it reports overload.
///
/// Every overloaded attempt is followed by its backoff delay, the last one
/// included, so the default policy waits 1s, 2s, 4s, 8s, 16s before giving up
/// with `LlmError::OverloadExhausted`.
pub async fn fetch_completion(
    model: &dyn CompletionModel,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<String, LlmError> {
    for attempt in 0..policy.max_attempts {
        match model.generate(prompt).await {
            Ok(text) => {
                if attempt > 0 {
                    info!("Model call succeeded on attempt {}", attempt + 1);
                }
                return Ok(text);
            }
            Err(e) if e.is_overload() => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Model service overloaded (attempt {}/{}), backing off {}ms: {e}",
                    attempt + 1,
                    policy.max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::OverloadExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{Reply, ScriptedModel};

    #[test]
    fn test_default_delay_sequence() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (0..5).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, DEFAULT_BASE_DELAY).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_overloads_with_backoff() {
        let model = ScriptedModel::new(vec![
            Reply::Overloaded,
            Reply::Overloaded,
            Reply::text("done"),
        ]);

        let text = fetch_completion(&model, "prompt", RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(text, "done");
        let times = model.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(1000));
        assert_eq!(times[2] - times[1], Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_overloaded_exhausts_after_max_attempts() {
        let model = ScriptedModel::always(Reply::Overloaded);
        let start = tokio::time::Instant::now();

        let err = fetch_completion(&model, "prompt", RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::OverloadExhausted { attempts: 5 }));
        assert_eq!(model.call_count(), 5);
        assert_eq!(start.elapsed(), Duration::from_millis(31_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_overload_error_is_not_retried() {
        let model = ScriptedModel::always(Reply::Fail {
            status: 401,
            message: "API key not valid".to_string(),
        });
        let start = tokio::time::Instant::now();

        let err = fetch_completion(&model, "prompt", RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 401, .. }));
        assert_eq!(model.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_policy_limits_attempts() {
        let model = ScriptedModel::always(Reply::Overloaded);
        let policy = RetryPolicy::new(2, Duration::from_millis(10));

        let err = fetch_completion(&model, "prompt", policy).await.unwrap_err();

        assert!(matches!(err, LlmError::OverloadExhausted { attempts: 2 }));
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_is_forwarded_unchanged() {
        let model = ScriptedModel::always(Reply::text("{}"));
        fetch_completion(&model, "exact prompt", RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(model.last_prompt().as_deref(), Some("exact prompt"));
    }
}
