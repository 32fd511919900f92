//! Reconnect spacing: exponential backoff with cap and jitter.
//!
//! The connection supervisor retries forever on non-terminal disconnects —
//! the network is assumed to eventually recover — but each attempt is spaced
//! out so a dead link never turns into a hot loop. This module holds the
//! sync-only math; the cancellable sleep lives in `waygate-runtime`.

use serde::{Deserialize, Serialize};

/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;
/// Default jitter factor (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Backoff parameters for reconnect attempts.
///
/// There is intentionally no attempt limit: reconnecting is unbounded by
/// design, only the spacing between attempts is governed here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in ms (default: 60000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (default: 0.2).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}
fn default_jitter_factor() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

/// Backoff delay for the given attempt, with fresh randomness for jitter.
///
/// `attempt` is zero-based: attempt 0 waits roughly `base_delay_ms`.
#[must_use]
pub fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> u64 {
    backoff_delay_with_random(attempt, policy, rand::random::<f64>())
}

/// Backoff delay with explicit randomness (for deterministic tests).
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (random*2-1) * jitter)`
/// where `random` is in `[0.0, 1.0)` — jitter is applied symmetrically.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn backoff_delay_with_random(attempt: u32, policy: &RetryPolicy, random: f64) -> u64 {
    let exponential = policy.base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(policy.max_delay_ms);

    // Maps random [0,1) to [-jitter, +jitter]
    let jitter = 1.0 + (random * 2.0 - 1.0) * policy.jitter_factor;
    let with_jitter = (capped as f64) * jitter;

    with_jitter.round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            jitter_factor: 0.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.max_delay_ms, 60_000);
        assert!((policy.jitter_factor - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn policy_serde_defaults() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.max_delay_ms, 60_000);
    }

    #[test]
    fn exponential_growth() {
        let policy = no_jitter();
        assert_eq!(backoff_delay_with_random(0, &policy, 0.5), 1000);
        assert_eq!(backoff_delay_with_random(1, &policy, 0.5), 2000);
        assert_eq!(backoff_delay_with_random(2, &policy, 0.5), 4000);
        assert_eq!(backoff_delay_with_random(3, &policy, 0.5), 8000);
    }

    #[test]
    fn caps_at_max_delay() {
        let policy = no_jitter();
        assert_eq!(backoff_delay_with_random(10, &policy, 0.5), 60_000);
    }

    #[test]
    fn jitter_is_symmetric() {
        let policy = RetryPolicy::default();
        // random = 0.0 → -20%, random = 0.5 → exact, random = 1.0 → +20%
        assert_eq!(backoff_delay_with_random(0, &policy, 0.0), 800);
        assert_eq!(backoff_delay_with_random(0, &policy, 0.5), 1000);
        assert_eq!(backoff_delay_with_random(0, &policy, 1.0), 1200);
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        let delay = backoff_delay_with_random(1000, &policy, 0.5);
        assert_eq!(delay, 60_000);
    }

    #[test]
    fn live_delay_within_jitter_band() {
        let policy = RetryPolicy::default();
        let delay = backoff_delay(0, &policy);
        assert!((800..=1200).contains(&delay));
    }
}
