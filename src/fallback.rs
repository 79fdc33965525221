//! Ordered fallback-candidate execution
//!
//! A generic "try each candidate in order, stop on first success"
//! combinator, decoupled from the transport the operation runs over. On any
//! failure the attempt is logged and the next candidate tried; exhaustion is
//! an ordinary outcome for the caller to map into a failure state, not an
//! error to propagate.

use crate::error::AppError;
use crate::logging::Logger;
use std::future::Future;

/// One failed attempt against a candidate
#[derive(Debug)]
pub struct FailedAttempt {
    /// Display label of the candidate (typically its URL)
    pub candidate: String,
    /// Why the attempt failed
    pub error: AppError,
}

/// Outcome of running an operation over an ordered candidate list
#[derive(Debug)]
pub enum FallbackOutcome<T> {
    /// A candidate succeeded; no later candidate was attempted
    Success {
        /// Index of the successful candidate in the input list
        index: usize,
        /// Display label of the successful candidate
        candidate: String,
        /// The operation's result
        value: T,
        /// Failures that preceded the success, in attempt order
        failures: Vec<FailedAttempt>,
    },
    /// Every candidate failed
    Exhausted {
        /// All failures, in attempt order
        failures: Vec<FailedAttempt>,
    },
}

impl<T> FallbackOutcome<T> {
    /// Total number of attempts made, including the successful one
    pub fn attempt_count(&self) -> u32 {
        match self {
            Self::Success { failures, .. } => failures.len() as u32 + 1,
            Self::Exhausted { failures } => failures.len() as u32,
        }
    }

    /// Whether any candidate succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Run `op` against each candidate in order, stopping at the first success.
///
/// `label` renders a candidate for logging and reporting. Failures are
/// logged through `logger` before advancing.
pub async fn try_each<C, T, L, F, Fut>(
    candidates: &[C],
    label: L,
    mut op: F,
    logger: &Logger,
) -> FallbackOutcome<T>
where
    L: Fn(&C) -> String,
    F: FnMut(&C) -> Fut,
    Fut: Future<Output = crate::error::Result<T>>,
{
    let mut failures = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let name = label(candidate);
        match op(candidate).await {
            Ok(value) => {
                return FallbackOutcome::Success {
                    index,
                    candidate: name,
                    value,
                    failures,
                };
            }
            Err(error) => {
                logger.warn(&format!(
                    "candidate {} failed, advancing to next: {}",
                    name, error
                ));
                failures.push(FailedAttempt {
                    candidate: name,
                    error,
                });
            }
        }
    }

    FallbackOutcome::Exhausted { failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet_logger() -> Logger {
        Logger::new("test", LogLevel::Error, false)
    }

    #[tokio::test]
    async fn test_first_success_stops_iteration() {
        let candidates = vec!["a", "b", "c"];
        let calls = AtomicUsize::new(0);

        let outcome = try_each(
            &candidates,
            |c| c.to_string(),
            |c| {
                calls.fetch_add(1, Ordering::SeqCst);
                let c = *c;
                async move {
                    if c == "b" {
                        Ok(42u32)
                    } else {
                        Err(AppError::transport("refused"))
                    }
                }
            },
            &quiet_logger(),
        )
        .await;

        // a fails, b succeeds, c is never attempted
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.attempt_count(), 2);
        match outcome {
            FallbackOutcome::Success {
                index,
                candidate,
                value,
                failures,
            } => {
                assert_eq!(index, 1);
                assert_eq!(candidate, "b");
                assert_eq!(value, 42);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].candidate, "a");
            }
            FallbackOutcome::Exhausted { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_attempts_all_in_order() {
        let candidates = vec!["a", "b", "c"];

        let outcome: FallbackOutcome<u32> = try_each(
            &candidates,
            |c| c.to_string(),
            |_| async { Err(AppError::http_request("503")) },
            &quiet_logger(),
        )
        .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempt_count(), 3);
        match outcome {
            FallbackOutcome::Exhausted { failures } => {
                let order: Vec<&str> =
                    failures.iter().map(|f| f.candidate.as_str()).collect();
                assert_eq!(order, vec!["a", "b", "c"]);
            }
            FallbackOutcome::Success { .. } => panic!("expected exhaustion"),
        }
    }

    #[tokio::test]
    async fn test_empty_candidate_list_exhausts_immediately() {
        let candidates: Vec<&str> = Vec::new();
        let outcome: FallbackOutcome<u32> = try_each(
            &candidates,
            |c| c.to_string(),
            |_| async { Ok(1) },
            &quiet_logger(),
        )
        .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempt_count(), 0);
    }
}
