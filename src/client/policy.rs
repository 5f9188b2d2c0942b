use crate::config::ClientConfig;
use crate::Error;
use std::time::Duration;

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Internal policy engine for retry behavior.
///
/// Important constraints:
/// - Owns no network code; the caller runs one attempt per iteration.
/// - Prefer deterministic, explainable behavior over clever heuristics (no jitter).
#[derive(Debug, Clone)]
pub(crate) struct PolicyEngine {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl PolicyEngine {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }

    /// Delay before retry `retry` (1-based): `base_delay * 2^(retry-1)`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide what to do next after an attempt failed.
    ///
    /// `failures` counts failed attempts so far, including this one (first failure => 1).
    pub fn decide(&self, err: &Error, failures: u32) -> Decision {
        if err.is_retryable() && failures <= self.max_retries {
            return Decision::Retry {
                delay: self.backoff_delay(failures),
            };
        }
        Decision::Fail
    }

    /// Final shape of an error that is about to leave the retry loop.
    ///
    /// Exhausted network failures get a connectivity-oriented message; the
    /// transport cause stays attached as the error source.
    pub fn finalize(&self, err: Error, base_url: &str, attempts: u32) -> Error {
        match err {
            Error::Network { message, source } if attempts > 1 => Error::Network {
                message: format!(
                    "Unable to reach the chat service at {} after {} attempts. \
                     Check your connection and try again. ({})",
                    base_url, attempts, message
                ),
                source,
            },
            other => other,
        }
    }
}
