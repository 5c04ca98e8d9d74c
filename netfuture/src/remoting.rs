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

use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use serde::de::DeserializeOwned;

use crate::base::request_envelope::RequestEnvelope;
use crate::base::response_future::Completer;
use crate::base::response_future::ResponseFuture;

/// Callback invoked at most once with the completed response.
pub type ResponseCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Callback invoked at most once with a completed sequence of responses.
pub type ResponsesCallback<T> = ResponseCallback<Vec<T>>;

/// Any value a caller designates as the expected response shape.
///
/// Responses are decoded by the inner service, handed to callbacks by value and read through
/// shared futures, so they must be decodable, cloneable and shareable across tasks.
pub trait ResponseMessage: DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> ResponseMessage for T where T: DeserializeOwned + Clone + Send + Sync + 'static {}

/// `InnerNetworkService` is the asynchronous network layer that actually performs requests.
///
/// Implementors receive the write half of a fresh future and must complete it exactly once, from
/// their own execution context, at some later time. Both submission methods must return without
/// blocking. Retry and backoff policy belongs to the implementor.
///
/// # Requirements
/// Implementors must be `Send + Sync` because pollers and submitters share the service across tasks.
pub trait InnerNetworkService: Send + Sync + 'static {
    /// Starts `envelope` and returns the future the service will complete, normally
    /// `completer.future()`.
    fn send_request_as_future<T: ResponseMessage>(
        &self,
        envelope: RequestEnvelope,
        completer: Completer<T>,
    ) -> NetFutureResult<ResponseFuture<T>>;

    /// Whether [`InnerNetworkService::send_request_as_futures`] is implemented.
    ///
    /// Checked before any future is created so an unsupported submission leaves nothing behind.
    fn supports_futures(&self) -> bool {
        false
    }

    /// Sequence-response variant of [`InnerNetworkService::send_request_as_future`].
    fn send_request_as_futures<T: ResponseMessage>(
        &self,
        envelope: RequestEnvelope,
        completer: Completer<Vec<T>>,
    ) -> NetFutureResult<ResponseFuture<Vec<T>>> {
        let _ = (envelope, completer);
        Err(NetFutureError::not_implemented("send_request_as_futures"))
    }
}
