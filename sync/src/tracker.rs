//! Per-hook request state machine.
//!
//! ```text
//! Idle --run--> Loading --settle--> Success | Error --run--> Loading ...
//! ```
//!
//! Overlapping invocations on one tracker are not serialized. Each invocation
//! takes the next generation number and only the most recently issued one may
//! write state; a response belonging to a superseded generation is returned to
//! its caller but otherwise dropped. `loading` therefore clears exactly when the
//! newest invocation settles, regardless of the order responses arrive in.
//!
//! [`RequestTracker::dispose`] is the unmount signal: in-flight requests are
//! aborted and the state leaves `Loading`. Nothing is written afterwards and
//! new invocations fail with [`ApiError::Disposed`] without touching the
//! network.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{AbortHandle, Abortable};

use tether_api::ApiError;
use tether_types::{RequestFlags, RequestState};

#[derive(Debug)]
struct TrackerInner<T> {
    state: RequestState<T>,
    /// Last successfully applied payload. Survives later failures.
    value: Option<T>,
    latest: u64,
    in_flight: HashMap<u64, AbortHandle>,
    disposed: bool,
}

impl<T> Default for TrackerInner<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            value: None,
            latest: 0,
            in_flight: HashMap::new(),
            disposed: false,
        }
    }
}

#[derive(Debug)]
pub struct RequestTracker<T> {
    inner: Arc<Mutex<TrackerInner<T>>>,
}

impl<T> Clone for RequestTracker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestTracker<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner::default())),
        }
    }
}

/// Cleans up an invocation whose future was dropped before it settled.
struct InFlight<'a, T> {
    tracker: &'a RequestTracker<T>,
    generation: u64,
    settled: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.tracker.lock();
        inner.in_flight.remove(&self.generation);
        if !inner.disposed && inner.latest == self.generation && inner.state.is_loading() {
            inner.state = RequestState::Idle;
        }
    }
}

impl<T> RequestTracker<T> {
    fn lock(&self) -> MutexGuard<'_, TrackerInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> RequestTracker<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> RequestState<T> {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn flags(&self) -> RequestFlags {
        self.lock().state.flags()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().state.is_loading()
    }

    /// Most recent successful payload, kept across later failures.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Forget the cached payload, e.g. when the hook's key changes.
    pub fn clear_value(&self) {
        self.lock().value = None;
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Abort every in-flight invocation. The tracker stays usable.
    pub fn cancel(&self) {
        let handles: Vec<AbortHandle> = self.lock().in_flight.values().cloned().collect();
        for handle in handles {
            handle.abort();
        }
    }

    /// Abort every in-flight invocation and stop accepting new ones.
    ///
    /// A pending `Loading` drops back to `Idle`; the last good value stays.
    pub fn dispose(&self) {
        let handles: Vec<AbortHandle> = {
            let mut inner = self.lock();
            inner.disposed = true;
            if inner.state.is_loading() {
                inner.state = RequestState::Idle;
            }
            inner.in_flight.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            handle.abort();
        }
    }

    /// Drive one request through the state machine.
    ///
    /// The request's own result is always returned to the caller; whether it
    /// also lands in the tracker depends on the generation check above.
    pub async fn run<F>(&self, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let (generation, registration) = {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(ApiError::Disposed);
            }
            inner.latest += 1;
            let generation = inner.latest;
            let (handle, registration) = AbortHandle::new_pair();
            inner.in_flight.insert(generation, handle);
            inner.state = RequestState::Loading;
            (generation, registration)
        };

        let mut guard = InFlight {
            tracker: self,
            generation,
            settled: false,
        };

        let result = match Abortable::new(request, registration).await {
            Ok(result) => result,
            Err(_aborted) => Err(ApiError::Cancelled),
        };

        guard.settled = true;
        let mut inner = self.lock();
        inner.in_flight.remove(&generation);

        if inner.disposed {
            return result;
        }
        if generation != inner.latest {
            tracing::debug!(
                generation,
                latest = inner.latest,
                "Discarding superseded response"
            );
            return result;
        }

        match &result {
            Ok(value) => {
                inner.value = Some(value.clone());
                inner.state = RequestState::Success(Some(value.clone()));
            }
            Err(ApiError::Cancelled) => {
                inner.state = RequestState::Idle;
            }
            Err(err) => {
                tracing::debug!(error = %err, "Request settled with error");
                inner.state = RequestState::Error(err.to_string());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::future::{Future, pending};
    use std::pin::pin;
    use std::task::{Context, Poll};

    use futures_util::FutureExt;
    use futures_util::future::join;
    use futures_util::task::noop_waker_ref;
    use tokio::sync::oneshot;

    use super::RequestTracker;
    use tether_api::ApiError;
    use tether_types::RequestState;

    fn server_error(message: &str) -> ApiError {
        ApiError::Server {
            status: 500,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn success_stores_value() {
        let tracker = RequestTracker::new();
        let result = tracker.run(async { Ok(5u64) }).await;
        assert_eq!(result.unwrap(), 5);
        assert_eq!(tracker.state(), RequestState::Success(Some(5)));
        assert_eq!(tracker.value(), Some(5));
        assert!(!tracker.is_loading());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_previous_value() {
        let tracker = RequestTracker::new();
        tracker.run(async { Ok(3u64) }).await.unwrap();
        let err = tracker
            .run(async { Err(server_error("boom")) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(tracker.state(), RequestState::Error("boom".to_string()));
        assert_eq!(tracker.value(), Some(3));
    }

    #[tokio::test]
    async fn new_invocation_clears_previous_error() {
        let tracker: RequestTracker<u64> = RequestTracker::new();
        let _ = tracker.run(async { Err(server_error("first")) }).await;

        let (tx, rx) = oneshot::channel::<()>();
        let run = tracker.run(async move {
            let _ = rx.await;
            Ok(1)
        });
        let mut run = pin!(run);
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(run.as_mut().poll(&mut cx).is_pending());

        let flags = tracker.flags();
        assert!(flags.loading);
        assert!(flags.error.is_none());
        assert!(!flags.success);

        tx.send(()).unwrap();
        assert_eq!(run.await.unwrap(), 1);
        assert!(tracker.flags().success);
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let tracker = RequestTracker::new();
        let (first_tx, first_rx) = oneshot::channel::<u64>();
        let (second_tx, second_rx) = oneshot::channel::<u64>();

        let first = tracker.run(async move { Ok(first_rx.await.unwrap_or(0)) });
        let second = tracker.run(async move { Ok(second_rx.await.unwrap_or(0)) });

        // The newer request settles first, the older one last.
        let release = async move {
            second_tx.send(2).unwrap();
            tokio::task::yield_now().await;
            first_tx.send(1).unwrap();
        };

        let ((first, second), ()) = join(join(first, second), release).await;
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
        assert_eq!(tracker.state(), RequestState::Success(Some(2)));
        assert!(!tracker.is_loading());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn loading_persists_until_latest_settles() {
        let tracker = RequestTracker::new();
        let (first_tx, first_rx) = oneshot::channel::<u64>();
        let (second_tx, second_rx) = oneshot::channel::<u64>();

        let mut first = pin!(tracker.run(async move { Ok(first_rx.await.unwrap_or(0)) }));
        let mut second = pin!(tracker.run(async move { Ok(second_rx.await.unwrap_or(0)) }));
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(second.as_mut().poll(&mut cx).is_pending());

        first_tx.send(1).unwrap();
        assert_eq!(first.await.unwrap(), 1);
        assert!(tracker.is_loading());
        assert_eq!(tracker.value(), None);

        second_tx.send(2).unwrap();
        assert_eq!(second.await.unwrap(), 2);
        assert!(!tracker.is_loading());
        assert_eq!(tracker.value(), Some(2));
    }

    #[tokio::test]
    async fn dispose_aborts_and_blocks_writes() {
        let tracker: RequestTracker<u64> = RequestTracker::new();
        let mut run = pin!(tracker.run(pending()));
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(run.as_mut().poll(&mut cx).is_pending());
        assert_eq!(tracker.in_flight(), 1);

        tracker.dispose();
        assert!(!tracker.is_loading());
        let err = run.await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(tracker.state(), RequestState::Idle);

        let err = tracker.run(async { Ok(1) }).await.unwrap_err();
        assert!(matches!(err, ApiError::Disposed));
    }

    #[tokio::test]
    async fn dispose_keeps_last_good_value() {
        let tracker: RequestTracker<u64> = RequestTracker::new();
        tracker.run(async { Ok(7) }).await.unwrap();

        let mut run = pin!(tracker.run(pending()));
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(run.as_mut().poll(&mut cx).is_pending());
        assert!(tracker.flags().loading);

        tracker.dispose();
        assert!(matches!(run.await, Err(ApiError::Cancelled)));
        let flags = tracker.flags();
        assert!(!flags.loading);
        assert!(flags.error.is_none());
        assert_eq!(tracker.value(), Some(7));
    }

    #[tokio::test]
    async fn cancel_returns_latest_to_idle() {
        let tracker: RequestTracker<u64> = RequestTracker::new();
        let mut run = pin!(tracker.run(pending()));
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(run.as_mut().poll(&mut cx).is_pending());

        tracker.cancel();
        assert!(matches!(run.await, Err(ApiError::Cancelled)));
        assert!(tracker.state().is_idle());
        assert!(!tracker.is_disposed());
        assert_eq!(tracker.run(async { Ok(4) }).await.unwrap(), 4);
    }

    #[test]
    fn dropped_invocation_resets_loading() {
        let tracker: RequestTracker<u64> = RequestTracker::new();
        {
            let mut run = Box::pin(tracker.run(pending()));
            let mut cx = Context::from_waker(noop_waker_ref());
            assert!(matches!(run.poll_unpin(&mut cx), Poll::Pending));
            assert!(tracker.is_loading());
        }
        assert!(tracker.state().is_idle());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[tokio::test]
    async fn clear_value_forgets_payload() {
        let tracker = RequestTracker::new();
        tracker.run(async { Ok(true) }).await.unwrap();
        tracker.clear_value();
        assert_eq!(tracker.value(), None);
        assert!(tracker.state().is_success());
    }
}
