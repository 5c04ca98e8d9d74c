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

use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use tracing::debug;

use crate::base::request_envelope::RequestEnvelope;
use crate::base::response_future::ResponseFuture;
use crate::remoting::InnerNetworkService;
use crate::remoting::ResponseCallback;
use crate::remoting::ResponseMessage;

/// A submitted request: the future the inner service will complete, plus the caller's
/// optional callback waiting to be dispatched by a poller.
pub struct PendingRequest<T> {
    future: ResponseFuture<T>,
    callback: Option<ResponseCallback<T>>,
}

impl<T> PendingRequest<T> {
    #[inline]
    pub fn future(&self) -> &ResponseFuture<T> {
        &self.future
    }

    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    #[inline]
    pub fn into_parts(self) -> (ResponseFuture<T>, Option<ResponseCallback<T>>) {
        (self.future, self.callback)
    }
}

/// Validates envelopes and hands them to the inner service together with a fresh future.
pub struct RequestGateway<S> {
    service: Arc<S>,
}

impl<S> Clone for RequestGateway<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: InnerNetworkService> RequestGateway<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    #[inline]
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Submits a single-response request. Never blocks; the returned future is completed later
    /// by the inner service.
    pub fn submit<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        callback: Option<ResponseCallback<T>>,
    ) -> NetFutureResult<PendingRequest<T>> {
        let envelope = require_envelope(envelope.into())?;
        let opaque = envelope.opaque();
        let (future, completer) = ResponseFuture::pending(opaque);
        let returned = self.service.send_request_as_future(envelope, completer)?;
        if !returned.ptr_eq(&future) {
            debug!("inner service substituted the future for request {}", opaque);
        }
        debug!("request {} submitted, callback: {}", opaque, callback.is_some());
        Ok(PendingRequest {
            future: returned,
            callback,
        })
    }

    /// Submits a request expecting a sequence of responses.
    ///
    /// Fails with `NotImplemented` before creating any future when the inner service has no
    /// sequence-response path.
    pub fn submit_many<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        callback: Option<ResponseCallback<Vec<T>>>,
    ) -> NetFutureResult<PendingRequest<Vec<T>>> {
        let envelope = require_envelope(envelope.into())?;
        if !self.service.supports_futures() {
            return Err(NetFutureError::not_implemented("send_request_as_futures"));
        }
        let opaque = envelope.opaque();
        let (future, completer) = ResponseFuture::pending(opaque);
        let returned = self.service.send_request_as_futures(envelope, completer)?;
        debug!("multi-response request {} submitted, callback: {}", opaque, callback.is_some());
        Ok(PendingRequest {
            future: returned,
            callback,
        })
    }
}

fn require_envelope(envelope: Option<RequestEnvelope>) -> NetFutureResult<RequestEnvelope> {
    envelope.ok_or_else(|| NetFutureError::invalid_argument("envelope", "request envelope must be present"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::base::response_future::Completer;
    use crate::poller::CompletionPoller;
    use crate::poller::PollOutcome;
    use crate::test_service::HoldingService;

    /// Answers every request from its own cache, ignoring the future it was handed.
    struct CachingService {
        cached: serde_json::Value,
    }

    impl InnerNetworkService for CachingService {
        fn send_request_as_future<T: ResponseMessage>(
            &self,
            envelope: RequestEnvelope,
            completer: Completer<T>,
        ) -> NetFutureResult<ResponseFuture<T>> {
            drop(completer);
            let (future, own) = ResponseFuture::pending(envelope.opaque());
            own.complete(serde_json::from_value(self.cached.clone()).unwrap())?;
            Ok(future)
        }
    }

    #[test]
    fn submit_returns_pending_future_immediately() {
        let gateway = RequestGateway::new(Arc::new(HoldingService::default()));
        let pending = gateway
            .submit::<String>(RequestEnvelope::new(1, "ping"), None)
            .unwrap();
        assert!(!pending.future().is_completed());
        assert!(!pending.has_callback());
        assert_eq!(gateway.service().submitted(), 1);
    }

    #[test]
    fn missing_envelope_is_rejected_before_submission() {
        let gateway = RequestGateway::new(Arc::new(HoldingService::default()));
        let err = gateway.submit::<String>(None, None).err().unwrap();
        assert!(matches!(err, NetFutureError::InvalidArgument { argument: "envelope", .. }));
        assert_eq!(gateway.service().submitted(), 0);
    }

    #[test]
    fn service_completes_the_future_it_was_handed() {
        let gateway = RequestGateway::new(Arc::new(HoldingService::default()));
        let pending = gateway
            .submit::<String>(RequestEnvelope::new(1, "ping"), Some(Box::new(|_| {})))
            .unwrap();
        assert!(pending.has_callback());
        gateway.service().complete_next(Some(json!("pong")));
        let (future, callback) = pending.into_parts();
        assert_eq!(future.result().map(String::as_str), Some("pong"));
        assert!(callback.is_some());
    }

    #[test]
    fn submit_many_without_support_is_not_implemented() {
        let gateway = RequestGateway::new(Arc::new(HoldingService::single_only()));
        let err = gateway
            .submit_many::<u32>(RequestEnvelope::new(2, "batch"), None)
            .err()
            .unwrap();
        assert!(matches!(err, NetFutureError::NotImplemented { .. }));
        assert_eq!(gateway.service().submitted(), 0);
    }

    #[test]
    fn submit_many_completes_with_sequence() {
        let gateway = RequestGateway::new(Arc::new(HoldingService::default()));
        let pending = gateway
            .submit_many::<u32>(RequestEnvelope::new(2, "batch"), None)
            .unwrap();
        gateway.service().complete_next(Some(json!([1, 2, 3])));
        assert_eq!(pending.future().result(), Some(&vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn substituted_future_is_the_one_polled() {
        let gateway = RequestGateway::new(Arc::new(CachingService {
            cached: json!("cached"),
        }));
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let pending = gateway
            .submit::<String>(
                RequestEnvelope::new(3, "lookup"),
                Some(Box::new(move |value| *seen_clone.lock() = Some(value))),
            )
            .unwrap();
        assert_eq!(pending.future().result().map(String::as_str), Some("cached"));

        let outcome = CompletionPoller::new(pending, Duration::ZERO).run().await.unwrap();
        assert_eq!(outcome, PollOutcome::Delivered);
        assert_eq!(seen.lock().as_deref(), Some("cached"));
    }
}
