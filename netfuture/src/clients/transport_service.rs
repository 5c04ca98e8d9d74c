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

use bytes::Bytes;
use futures::future::BoxFuture;
use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use tokio::runtime::Handle;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::base::request_envelope::RequestEnvelope;
use crate::base::response_future::Completer;
use crate::base::response_future::ResponseFuture;
use crate::remoting::InnerNetworkService;
use crate::remoting::ResponseMessage;

/// Moves an envelope over the wire and yields the raw response body.
pub trait Transport: Send + Sync + 'static {
    fn call(&self, envelope: RequestEnvelope) -> BoxFuture<'static, NetFutureResult<Bytes>>;
}

impl<F> Transport for F
where
    F: Fn(RequestEnvelope) -> BoxFuture<'static, NetFutureResult<Bytes>> + Send + Sync + 'static,
{
    fn call(&self, envelope: RequestEnvelope) -> BoxFuture<'static, NetFutureResult<Bytes>> {
        (self)(envelope)
    }
}

/// An [`InnerNetworkService`] that runs each request on its own task and completes the future
/// with the JSON-decoded response body.
///
/// A failed transport call or an undecodable body is logged and the completer is dropped, so the
/// future never completes. No retries happen here.
pub struct TransportService<Tr> {
    transport: Arc<Tr>,
    handle: Handle,
}

impl<Tr: Transport> TransportService<Tr> {
    /// Uses the ambient tokio runtime for request tasks.
    pub fn new(transport: Tr) -> NetFutureResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| NetFutureError::invalid_configuration("runtime", e.to_string()))?;
        Ok(Self::with_handle(handle, transport))
    }

    pub fn with_handle(handle: Handle, transport: Tr) -> Self {
        Self {
            transport: Arc::new(transport),
            handle,
        }
    }

    fn dispatch<T: ResponseMessage>(&self, envelope: RequestEnvelope, completer: Completer<T>) -> ResponseFuture<T> {
        let future = completer.future();
        let transport = self.transport.clone();
        self.handle.spawn(async move {
            let opaque = envelope.opaque();
            let body = match transport.call(envelope).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("request {} transport failed: {}", opaque, e);
                    return;
                }
            };
            match serde_json::from_slice::<T>(&body) {
                Ok(response) => match completer.complete(response) {
                    Ok(()) => debug!("request {} completed, {} bytes", opaque, body.len()),
                    Err(e) => error!("request {} completion rejected: {}", opaque, e),
                },
                Err(e) => warn!("request {} response could not be decoded: {}", opaque, e),
            }
        });
        future
    }
}

impl<Tr: Transport> InnerNetworkService for TransportService<Tr> {
    fn send_request_as_future<T: ResponseMessage>(
        &self,
        envelope: RequestEnvelope,
        completer: Completer<T>,
    ) -> NetFutureResult<ResponseFuture<T>> {
        Ok(self.dispatch(envelope, completer))
    }

    fn supports_futures(&self) -> bool {
        true
    }

    fn send_request_as_futures<T: ResponseMessage>(
        &self,
        envelope: RequestEnvelope,
        completer: Completer<Vec<T>>,
    ) -> NetFutureResult<ResponseFuture<Vec<T>>> {
        Ok(self.dispatch(envelope, completer))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::FutureExt;
    use serde::Deserialize;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Deserialize)]
    struct Echo {
        code: i32,
        text: String,
    }

    fn echo_transport(envelope: RequestEnvelope) -> BoxFuture<'static, NetFutureResult<Bytes>> {
        async move {
            let text = String::from_utf8_lossy(envelope.body()).into_owned();
            let body = serde_json::json!({ "code": envelope.code(), "text": text });
            Ok(Bytes::from(body.to_string()))
        }
        .boxed()
    }

    #[tokio::test]
    async fn transport_service_decodes_response() {
        let service = TransportService::new(echo_transport).unwrap();
        let (future, completer) = ResponseFuture::<Echo>::pending(1);
        service
            .send_request_as_future(RequestEnvelope::new(9, "hi"), completer)
            .unwrap();
        let echo = future.wait(Duration::from_millis(1)).await.unwrap();
        assert_eq!(
            echo,
            &Echo {
                code: 9,
                text: "hi".to_string()
            }
        );
    }

    #[tokio::test]
    async fn transport_service_decodes_sequence() {
        let service = TransportService::new(|_envelope: RequestEnvelope| {
            async { Ok::<_, NetFutureError>(Bytes::from_static(b"[1,2,3]")) }.boxed()
        })
        .unwrap();
        assert!(service.supports_futures());
        let (future, completer) = ResponseFuture::<Vec<u8>>::pending(2);
        service
            .send_request_as_futures(RequestEnvelope::new(1, "batch"), completer)
            .unwrap();
        let values = future.wait(Duration::from_millis(1)).await.unwrap();
        assert_eq!(values, &vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_transport_leaves_future_pending() {
        let service = TransportService::new(|_envelope: RequestEnvelope| {
            async { Err::<Bytes, _>(NetFutureError::invalid_argument("body", "refused")) }.boxed()
        })
        .unwrap();
        let (future, completer) = ResponseFuture::<u32>::pending(3);
        service
            .send_request_as_future(RequestEnvelope::new(1, "x"), completer)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!future.is_completed());
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_body_leaves_future_pending() {
        let service = TransportService::new(|_envelope: RequestEnvelope| {
            async { Ok::<_, NetFutureError>(Bytes::from_static(b"not json")) }.boxed()
        })
        .unwrap();
        let (future, completer) = ResponseFuture::<u32>::pending(4);
        service
            .send_request_as_future(RequestEnvelope::new(1, "x"), completer)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!future.is_completed());
    }
}
