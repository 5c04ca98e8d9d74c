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

use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use tracing::error;
use tracing::warn;

/// Single-write, multi-read completion cell.
///
/// `None` inside the lock means the producer completed without a value; that state is kept
/// rather than hidden so readers can report the broken contract.
struct Slot<T> {
    opaque: i32,
    value: OnceLock<Option<T>>,
}

/// Read half of a deferred response.
///
/// Clones share the same cell. Once [`ResponseFuture::is_completed`] returns `true` it never
/// returns `false` again and the stored result never changes.
pub struct ResponseFuture<T> {
    slot: Arc<Slot<T>>,
}

/// A future whose result is a sequence of responses.
pub type ResponseFutures<T> = ResponseFuture<Vec<T>>;

impl<T> Clone for ResponseFuture<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for ResponseFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("opaque", &self.slot.opaque)
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<T> ResponseFuture<T> {
    /// Creates an uncompleted cell and the only handle allowed to complete it.
    pub fn pending(opaque: i32) -> (ResponseFuture<T>, Completer<T>) {
        let slot = Arc::new(Slot {
            opaque,
            value: OnceLock::new(),
        });
        (
            ResponseFuture { slot: slot.clone() },
            Completer { slot },
        )
    }

    #[inline]
    pub fn opaque(&self) -> i32 {
        self.slot.opaque
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.slot.value.get().is_some()
    }

    /// The stored result, or `None` while the future is still pending.
    ///
    /// Gate on [`ResponseFuture::is_completed`] first: a completed future that still yields `None`
    /// was completed by a broken producer, see [`ResponseFuture::try_result`].
    #[inline]
    pub fn result(&self) -> Option<&T> {
        self.slot.value.get().and_then(Option::as_ref)
    }

    /// Validated read. `Ok(None)` while pending, `Ok(Some(_))` once completed, and
    /// `InvalidOperation` if the cell completed without a result.
    pub fn try_result(&self) -> NetFutureResult<Option<&T>> {
        match self.slot.value.get() {
            None => Ok(None),
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => Err(NetFutureError::invalid_operation(
                "result",
                format!("request {} reports completion without a result", self.slot.opaque),
            )),
        }
    }

    /// Waits for completion by re-checking the cell every `interval`.
    pub async fn wait(&self, interval: Duration) -> NetFutureResult<&T> {
        loop {
            if let Some(value) = self.try_result()? {
                return Ok(value);
            }
            pause(interval).await;
        }
    }

    pub(crate) fn ptr_eq(&self, other: &ResponseFuture<T>) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Write half of a [`ResponseFuture`], owned by the inner network service.
///
/// `Completer` is not `Clone` and completing consumes it, so a cell is written at most once.
pub struct Completer<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Completer<T> {
    /// A read handle on the cell this completer writes.
    pub fn future(&self) -> ResponseFuture<T> {
        ResponseFuture {
            slot: self.slot.clone(),
        }
    }

    #[inline]
    pub fn opaque(&self) -> i32 {
        self.slot.opaque
    }

    /// Completes the future with `value`.
    pub fn complete(self, value: T) -> NetFutureResult<()> {
        self.try_complete(Some(value))
    }

    /// Completes the future. Completing with `None` still marks the cell completed so readers
    /// observe the violation, and reports `NullCompletion` to the producer.
    pub fn try_complete(self, value: Option<T>) -> NetFutureResult<()> {
        let slot = self.slot.clone();
        let absent = value.is_none();
        if slot.value.set(value).is_err() {
            error!("request {} was completed more than once", slot.opaque);
            return Err(NetFutureError::null_completion(format!(
                "request {} was completed more than once",
                slot.opaque
            )));
        }
        if absent {
            error!("request {} completed without a result", slot.opaque);
            return Err(NetFutureError::null_completion(format!(
                "request {} completed without a result",
                slot.opaque
            )));
        }
        Ok(())
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if self.slot.value.get().is_none() {
            warn!(
                "completer for request {} dropped without completing, the future stays pending",
                self.slot.opaque
            );
        }
    }
}

/// Suspends the current task for one polling interval. A zero interval still yields so
/// other pollers on the same thread make progress.
pub(crate) async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
