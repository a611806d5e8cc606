//! Cancellable poll loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Why [`wait_until_ready`] stopped without a value.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum WaitError<E> {
    /// The timeout elapsed.
    TimedOut,
    /// The token was cancelled.
    Cancelled,
    /// The check itself failed.
    Check(E),
}

/// Runs `check` until it yields a value, fails, or `timeout` elapses.
///
/// Checks are spaced `delay` apart. Cancellation is observed both while a
/// check is in flight and while sleeping, so the loop returns promptly.
pub(crate) async fn wait_until_ready<T, E, F, Fut>(
    timeout: Duration,
    delay: Duration,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            outcome = check() => outcome,
        };
        if let Some(ready) = outcome.map_err(WaitError::Check)? {
            return Ok(ready);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(WaitError::TimedOut);
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            () = sleep(delay.min(remaining)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn returns_first_ready_value() {
        let attempts = AtomicUsize::new(0);
        let result: Result<usize, WaitError<()>> = wait_until_ready(
            Duration::from_secs(1),
            Duration::from_millis(1),
            &CancellationToken::new(),
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                async move { Ok((attempt == 2).then_some(attempt)) }
            },
        )
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn check_errors_stop_the_loop() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), WaitError<&str>> = wait_until_ready(
            Duration::from_secs(1),
            Duration::from_millis(1),
            &CancellationToken::new(),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("boom") }
            },
        )
        .await;

        assert_eq!(result, Err(WaitError::Check("boom")));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn times_out_when_never_ready() {
        let result: Result<(), WaitError<()>> = wait_until_ready(
            Duration::from_millis(20),
            Duration::from_millis(1),
            &CancellationToken::new(),
            || async { Ok(None) },
        )
        .await;

        assert_eq!(result, Err(WaitError::TimedOut));
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_sleep() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result: Result<(), WaitError<()>> = wait_until_ready(
            Duration::from_secs(60),
            Duration::from_secs(30),
            &cancel,
            || async { Ok(None) },
        )
        .await;

        assert_eq!(result, Err(WaitError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_a_ready_check() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<u8, WaitError<()>> = wait_until_ready(
            Duration::from_secs(1),
            Duration::from_millis(1),
            &cancel,
            || async { Ok(Some(1)) },
        )
        .await;

        assert_eq!(result, Err(WaitError::Cancelled));
    }
}
