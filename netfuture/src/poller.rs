// Copyright 2023 The NetFuture Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::base::response_future::pause;
use crate::base::response_future::ResponseFuture;
use crate::gateway::PendingRequest;
use crate::remoting::ResponseCallback;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollerState {
    /// Completion has not been observed yet.
    Waiting,
    /// Completion observed, result being validated and dispatched.
    Completed,
    /// The poller has terminated; no further checks occur.
    Done,
}

/// How a poller that terminated without a fatal error finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollOutcome {
    /// The result was handed to the callback.
    Delivered,
    /// The future completed and there was no callback to invoke.
    Completed,
    /// The poller was told to stop; the callback was dropped without being invoked.
    Cancelled,
}

/// Per-request cooperative task that re-checks a future at a fixed interval and dispatches the
/// callback exactly once.
///
/// The poller only reads the future. A caller holding a clone may observe completion before the
/// callback runs; the two orderings are both valid since the cell never changes once set.
pub struct CompletionPoller<T> {
    future: ResponseFuture<T>,
    callback: Option<ResponseCallback<T>>,
    interval: Duration,
    max_wait: Option<Duration>,
    state: Arc<Mutex<PollerState>>,
    cancel: CancellationToken,
}

impl<T> CompletionPoller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(request: PendingRequest<T>, interval: Duration) -> Self {
        let (future, callback) = request.into_parts();
        Self {
            future,
            callback,
            interval,
            max_wait: None,
            state: Arc::new(Mutex::new(PollerState::Waiting)),
            cancel: CancellationToken::new(),
        }
    }

    /// Bounds the wait; `None` waits indefinitely.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> PollerState {
        *self.state.lock()
    }

    #[inline]
    pub fn future(&self) -> &ResponseFuture<T> {
        &self.future
    }

    fn set_state(&self, state: PollerState) {
        *self.state.lock() = state;
    }

    /// Drives the state machine `Waiting -> Completed -> Done`.
    ///
    /// A completed future without a result terminates the poller with `InvalidOperation` and the
    /// callback is never invoked.
    pub async fn run(mut self) -> NetFutureResult<PollOutcome> {
        let opaque = self.future.opaque();
        let cancel = self.cancel.clone();
        let started = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                return Ok(self.stop_cancelled());
            }
            if self.future.is_completed() {
                break;
            }
            if let Some(max_wait) = self.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    self.set_state(PollerState::Done);
                    self.callback = None;
                    warn!("request {} not completed after {:?}, poller gives up", opaque, waited);
                    return Err(NetFutureError::poll_timeout(saturating_millis(waited)));
                }
            }
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = pause(self.interval) => false,
            };
            if cancelled {
                return Ok(self.stop_cancelled());
            }
        }

        self.set_state(PollerState::Completed);
        let result = match self.future.result() {
            Some(result) => result.clone(),
            None => {
                self.set_state(PollerState::Done);
                self.callback = None;
                error!("request {} completed without a result", opaque);
                return Err(NetFutureError::invalid_operation(
                    "poll",
                    format!("request {} completed without a result", opaque),
                ));
            }
        };

        // A panicking callback unwinds through here; the guard still moves the state to `Done`.
        let _done = MarkDone(self.state.clone());
        let outcome = match self.callback.take() {
            Some(callback) => {
                callback(result);
                PollOutcome::Delivered
            }
            None => PollOutcome::Completed,
        };
        debug!("request {} poller done: {:?}", opaque, outcome);
        Ok(outcome)
    }

    fn stop_cancelled(&mut self) -> PollOutcome {
        self.callback = None;
        self.set_state(PollerState::Done);
        warn!("request {} poller cancelled", self.future.opaque());
        PollOutcome::Cancelled
    }

    /// Spawns the poller on `handle`, returning a handle to observe or cancel it.
    pub fn spawn(self, handle: &tokio::runtime::Handle) -> PollerHandle {
        let opaque = self.future.opaque();
        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let join = handle.spawn(self.run());
        PollerHandle {
            opaque,
            join,
            cancel,
            state,
        }
    }
}

struct MarkDone(Arc<Mutex<PollerState>>);

impl Drop for MarkDone {
    fn drop(&mut self) {
        *self.0.lock() = PollerState::Done;
    }
}

fn saturating_millis(waited: Duration) -> u64 {
    u64::try_from(waited.as_millis()).unwrap_or(u64::MAX)
}

/// Owner-side view of a spawned [`CompletionPoller`].
pub struct PollerHandle {
    opaque: i32,
    join: JoinHandle<NetFutureResult<PollOutcome>>,
    cancel: CancellationToken,
    state: Arc<Mutex<PollerState>>,
}

impl PollerHandle {
    #[inline]
    pub fn opaque(&self) -> i32 {
        self.opaque
    }

    /// Stops the poller at its next suspension point without invoking the callback.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> PollerState {
        *self.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the poller task. A panicking callback or an aborted task is reported as
    /// `PollerAborted`.
    pub async fn join(self) -> NetFutureResult<PollOutcome> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(NetFutureError::poller_aborted(format!(
                "poller for request {} failed: {}",
                self.opaque, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::base::request_envelope::RequestEnvelope;
    use crate::gateway::RequestGateway;
    use crate::test_service::HoldingService;

    fn submit(
        service: &Arc<HoldingService>,
        callback: Option<ResponseCallback<u32>>,
    ) -> PendingRequest<u32> {
        RequestGateway::new(service.clone())
            .submit(RequestEnvelope::new(1, "poll"), callback)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn poller_invokes_callback_once_after_completion() {
        let service = Arc::new(HoldingService::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));
        let (calls_clone, seen_clone) = (calls.clone(), seen.clone());
        let pending = submit(
            &service,
            Some(Box::new(move |value| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                *seen_clone.lock() = Some(value);
            })),
        );
        let poller = CompletionPoller::new(pending, Duration::from_millis(100));
        assert_eq!(poller.state(), PollerState::Waiting);
        let handle = poller.spawn(&tokio::runtime::Handle::current());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(handle.state(), PollerState::Waiting);
        service.complete_next(Some(serde_json::json!(42)));

        assert_eq!(handle.join().await.unwrap(), PollOutcome::Delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), Some(42));
    }

    #[tokio::test]
    async fn poller_without_callback_reports_completed() {
        let service = Arc::new(HoldingService::default());
        let pending = submit(&service, None);
        let future = pending.future().clone();
        service.complete_next(Some(serde_json::json!(5)));

        let poller = CompletionPoller::new(pending, Duration::ZERO);
        assert_eq!(poller.run().await.unwrap(), PollOutcome::Completed);
        assert_eq!(future.result(), Some(&5));
    }

    #[tokio::test]
    async fn absent_result_fails_without_callback() {
        let service = Arc::new(HoldingService::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let pending = submit(
            &service,
            Some(Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );
        service.complete_next(None);

        let poller = CompletionPoller::new(pending, Duration::from_millis(1));
        let state = poller.state.clone();
        let err = poller.run().await.unwrap_err();
        assert!(matches!(err, NetFutureError::InvalidOperation { .. }));
        assert_eq!(*state.lock(), PollerState::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poller_drops_callback() {
        let service = Arc::new(HoldingService::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let pending = submit(
            &service,
            Some(Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let future = pending.future().clone();
        let handle = CompletionPoller::new(pending, Duration::from_millis(50)).spawn(&tokio::runtime::Handle::current());

        tokio::time::sleep(Duration::from_millis(70)).await;
        handle.cancel();
        assert_eq!(handle.join().await.unwrap(), PollOutcome::Cancelled);

        service.complete_next(Some(serde_json::json!(1)));
        assert!(future.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_times_out() {
        let service = Arc::new(HoldingService::default());
        let pending = submit(&service, Some(Box::new(|_| panic!("callback must not run"))));
        let poller =
            CompletionPoller::new(pending, Duration::from_millis(100)).with_max_wait(Some(Duration::from_millis(250)));
        let err = poller.run().await.unwrap_err();
        assert!(matches!(err, NetFutureError::PollTimeout { waited_ms } if waited_ms >= 250));
    }

    #[tokio::test]
    async fn panicking_callback_is_reported_as_aborted() {
        let service = Arc::new(HoldingService::default());
        let pending = submit(&service, Some(Box::new(|_| panic!("boom"))));
        service.complete_next(Some(serde_json::json!(3)));
        let handle = CompletionPoller::new(pending, Duration::ZERO).spawn(&tokio::runtime::Handle::current());
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.state(), PollerState::Done);
        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, NetFutureError::PollerAborted { .. }));
    }

    #[test]
    fn waited_millis_saturate() {
        assert_eq!(saturating_millis(Duration::from_millis(250)), 250);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }
}
