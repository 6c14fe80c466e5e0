//! Retry coordinator.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ErrorKind, ErrorRecord};
use crate::clock::now_millis;
use crate::error::Error;
use crate::lock;
use crate::port::ErrorSink;
use crate::session::SessionInvalidator;

/// What the coordinator did with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The retry action will run after `delay`.
    Scheduled {
        /// Zero-based attempt number.
        attempt: u32,
        /// Backoff before the retry runs.
        delay: Duration,
    },
    /// The context already used all its retries; its count was reset.
    Exhausted,
    /// The failure kind is never retried.
    NotRetryable,
}

/// Terminal sink for failures.
///
/// Logs each failure through the [`ErrorSink`], keeps a retry count per
/// context label and schedules retries with exponential backoff. It never
/// returns an error to its caller.
///
/// Scheduled retries belong to the current cancellation generation.
/// [`cancel_pending`](Self::cancel_pending) and dropping the coordinator
/// cancel that generation, so no retry outlives its owner.
pub struct RetryCoordinator<S> {
    sink: Arc<S>,
    counts: Mutex<HashMap<String, u32>>,
    cancel: Mutex<CancellationToken>,
    invalidator: Option<SessionInvalidator>,
}

impl<S: ErrorSink> RetryCoordinator<S> {
    /// Create a coordinator that logs to `sink`.
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            sink,
            counts: Mutex::new(HashMap::new()),
            cancel: Mutex::new(CancellationToken::new()),
            invalidator: None,
        }
    }

    /// Invalidate the session whenever an auth failure is handled.
    #[must_use]
    pub fn with_session_invalidator(mut self, invalidator: SessionInvalidator) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    /// Handle a failure of the operation labelled `context`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn handle<F, Fut>(&self, context: &str, error: &Error, retry: F) -> RetryDecision
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let message = error.to_string();
        let kind = ErrorKind::classify(&message);
        self.log(
            ErrorRecord::new(now_millis(), context, message)
                .with_stack(error.stack().map(str::to_owned)),
        );

        if kind == ErrorKind::Auth
            && let Some(invalidator) = &self.invalidator
        {
            invalidator.invalidate();
        }

        let policy = kind.policy();
        let decision = {
            let mut counts = lock(&self.counts);
            let attempt = counts.get(context).copied().unwrap_or(0);
            if !policy.should_retry {
                counts.remove(context);
                RetryDecision::NotRetryable
            } else if attempt >= policy.max_retries {
                counts.remove(context);
                RetryDecision::Exhausted
            } else {
                counts.insert(context.to_owned(), attempt + 1);
                RetryDecision::Scheduled {
                    attempt,
                    delay: policy.delay_for(attempt),
                }
            }
        };

        match decision {
            RetryDecision::Scheduled { attempt, delay } => {
                info!(
                    context,
                    %kind,
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    "retrying in {}ms",
                    delay.as_millis()
                );
                self.schedule(delay, retry);
            }
            RetryDecision::Exhausted => {
                warn!(context, %kind, "giving up after {} retries", policy.max_retries);
            }
            RetryDecision::NotRetryable => {
                debug!(context, %kind, "failure is not retryable");
            }
        }

        decision
    }

    /// Current retry count for `context` (0 when absent).
    #[must_use]
    pub fn retry_count(&self, context: &str) -> u32 {
        lock(&self.counts).get(context).copied().unwrap_or(0)
    }

    /// Forget the retry count for `context`, e.g. after a success.
    pub fn reset_retry_count(&self, context: &str) {
        lock(&self.counts).remove(context);
    }

    /// Cancel every retry scheduled so far. Later failures schedule into a
    /// fresh generation.
    pub fn cancel_pending(&self) {
        let mut token = lock(&self.cancel);
        token.cancel();
        *token = CancellationToken::new();
        debug!("cancelled pending retries");
    }

    fn schedule<F, Fut>(&self, delay: Duration, retry: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = lock(&self.cancel).clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => debug!("retry dropped: owner cancelled"),
                () = tokio::time::sleep(delay) => retry().await,
            }
        });
    }

    fn log(&self, record: ErrorRecord) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.log_error(&record).await {
                warn!(context = %record.context, "failed to write error log: {e}");
            }
        });
    }
}

impl<S> Drop for RetryCoordinator<S> {
    fn drop(&mut self) {
        lock(&self.cancel).cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RemoteError;
    use crate::session::{Credentials, SessionManager};
    use crate::testing::MockPort;

    const CONTEXT: &str = "fetchEmails";

    fn bump(fired: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let fired = Arc::clone(fired);
        move || {
            fired.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    fn failure(message: &str) -> Error {
        RemoteError::new(message).into()
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_back_off_then_give_up() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(Arc::clone(&port));
        let fired = Arc::new(AtomicUsize::new(0));
        let err = failure("connection refused");

        for attempt in 0..3 {
            let decision = retry.handle(CONTEXT, &err, bump(&fired));
            assert_eq!(
                decision,
                RetryDecision::Scheduled {
                    attempt,
                    delay: Duration::from_millis(1000 << attempt),
                }
            );
            assert_eq!(retry.retry_count(CONTEXT), attempt + 1);
        }

        assert_eq!(
            retry.handle(CONTEXT, &err, bump(&fired)),
            RetryDecision::Exhausted
        );
        assert_eq!(retry.retry_count(CONTEXT), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(port.logged().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_backoff() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(port);
        let fired = Arc::new(AtomicUsize::new(0));

        retry.handle(CONTEXT, &failure("503 unavailable"), bump(&fired));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_kinds_clear_the_count() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(port);
        let fired = Arc::new(AtomicUsize::new(0));

        retry.handle(CONTEXT, &failure("timeout"), bump(&fired));
        assert_eq!(retry.retry_count(CONTEXT), 1);

        let decision = retry.handle(CONTEXT, &failure("malformed response"), bump(&fired));
        assert_eq!(decision, RetryDecision::NotRetryable);
        assert_eq!(retry.retry_count(CONTEXT), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn contexts_are_counted_separately() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(port);
        let fired = Arc::new(AtomicUsize::new(0));

        retry.handle("fetchEmails", &failure("dns failure"), bump(&fired));
        retry.handle("saveSubEmails", &failure("disk full"), bump(&fired));
        retry.handle("saveSubEmails", &failure("disk full"), bump(&fired));

        assert_eq!(retry.retry_count("fetchEmails"), 1);
        assert_eq!(retry.retry_count("saveSubEmails"), 2);

        retry.reset_retry_count("saveSubEmails");
        assert_eq!(retry.retry_count("saveSubEmails"), 0);
        assert_eq!(retry.retry_count("fetchEmails"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_retries_never_fire() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(port);
        let fired = Arc::new(AtomicUsize::new(0));

        retry.handle(CONTEXT, &failure("network down"), bump(&fired));
        retry.cancel_pending();
        retry.handle("other", &failure("network down"), bump(&fired));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_coordinator_cancels_retries() {
        let port = Arc::new(MockPort::new());
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let retry = RetryCoordinator::new(port);
            retry.handle(CONTEXT, &failure("fetch failed"), bump(&fired));
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failures_invalidate_the_session() {
        let port = Arc::new(MockPort::new());
        let session = SessionManager::new(Arc::clone(&port));
        session
            .login(&Credentials::new("user@2925.com", "secret123"), false)
            .await
            .unwrap();
        assert!(session.is_authenticated());

        let retry = RetryCoordinator::new(Arc::clone(&port))
            .with_session_invalidator(session.invalidator());
        let fired = Arc::new(AtomicUsize::new(0));

        let decision = retry.handle(CONTEXT, &failure("401 Unauthorized"), bump(&fired));
        assert_eq!(decision, RetryDecision::NotRetryable);
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn log_failures_are_swallowed() {
        let port = Arc::new(MockPort::new());
        port.fail("log_error");
        let retry = RetryCoordinator::new(Arc::clone(&port));
        let fired = Arc::new(AtomicUsize::new(0));

        let decision = retry.handle(CONTEXT, &failure("timeout"), bump(&fired));
        assert!(matches!(decision, RetryDecision::Scheduled { .. }));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(port.logged().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn records_carry_context_kind_and_stack() {
        let port = Arc::new(MockPort::new());
        let retry = RetryCoordinator::new(Arc::clone(&port));
        let err: Error = RemoteError::new("Storage quota exceeded")
            .with_stack("save_sub_emails")
            .into();

        retry.handle("saveSubEmails", &err, || async {});
        tokio::time::sleep(Duration::from_millis(1)).await;

        let logged = port.logged();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].context, "saveSubEmails");
        assert_eq!(logged[0].kind, ErrorKind::Storage);
        assert_eq!(logged[0].stack.as_deref(), Some("save_sub_emails"));
    }
}
