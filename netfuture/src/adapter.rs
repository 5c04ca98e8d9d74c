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
use tokio::runtime::Handle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::base::request_envelope::RequestEnvelope;
use crate::base::response_future::ResponseFuture;
use crate::base::response_future::ResponseFutures;
use crate::config::PollingConfig;
use crate::gateway::PendingRequest;
use crate::gateway::RequestGateway;
use crate::poller::CompletionPoller;
use crate::poller::PollerHandle;
use crate::remoting::InnerNetworkService;
use crate::remoting::ResponseCallback;
use crate::remoting::ResponseMessage;
use crate::remoting::ResponsesCallback;

/// Lets a host issue network requests without blocking its loop.
///
/// Every request gets its own future and its own poller task; nothing is shared between
/// outstanding requests. The caller may ignore the returned future and rely on the callback, read
/// the future directly, or both.
pub struct AsyncNetworkAdapter<S> {
    gateway: RequestGateway<S>,
    config: PollingConfig,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    handle: Handle,
}

impl<S: InnerNetworkService> AsyncNetworkAdapter<S> {
    /// Validates `config` and binds pollers to the ambient tokio runtime.
    pub fn initialize(config: PollingConfig, service: S) -> NetFutureResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| NetFutureError::invalid_configuration("runtime", e.to_string()))?;
        Self::initialize_on(handle, config, Arc::new(service))
    }

    /// Validates `config` and binds pollers to `handle`. Nothing can be submitted through an
    /// adapter whose configuration failed validation, since no adapter is returned.
    pub fn initialize_on(handle: Handle, config: PollingConfig, service: Arc<S>) -> NetFutureResult<Self> {
        config.validate()?;
        let poll_interval = config.poll_interval()?;
        let max_wait = config.max_wait()?;
        info!(
            "async network adapter initialized, poll interval: {:?}, max wait: {:?}",
            poll_interval, max_wait
        );
        Ok(Self {
            gateway: RequestGateway::new(service),
            config,
            poll_interval,
            max_wait,
            handle,
        })
    }

    #[inline]
    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    #[inline]
    pub fn service(&self) -> &Arc<S> {
        self.gateway.service()
    }

    /// Submits `envelope` and returns its future immediately.
    ///
    /// The poller is detached. A completion contract violation found by it is logged and then
    /// escalated as a panic of the poller task; use [`AsyncNetworkAdapter::send_request_tracked`]
    /// to receive it as an error instead.
    pub fn send_request<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        on_response: Option<ResponseCallback<T>>,
    ) -> NetFutureResult<ResponseFuture<T>> {
        let pending = self.gateway.submit(envelope, on_response)?;
        let future = pending.future().clone();
        self.spawn_detached(pending);
        Ok(future)
    }

    /// Like [`AsyncNetworkAdapter::send_request`], also returning a handle to join or cancel the
    /// poller.
    pub fn send_request_tracked<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        on_response: Option<ResponseCallback<T>>,
    ) -> NetFutureResult<(ResponseFuture<T>, PollerHandle)> {
        let pending = self.gateway.submit(envelope, on_response)?;
        let future = pending.future().clone();
        Ok((future, self.poller(pending).spawn(&self.handle)))
    }

    /// Sequence-response variant of [`AsyncNetworkAdapter::send_request`]. Fails with
    /// `NotImplemented` when the inner service has no sequence-response path.
    pub fn send_request_many<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        on_responses: Option<ResponsesCallback<T>>,
    ) -> NetFutureResult<ResponseFutures<T>> {
        let pending = self.gateway.submit_many(envelope, on_responses)?;
        let future = pending.future().clone();
        self.spawn_detached(pending);
        Ok(future)
    }

    pub fn send_request_many_tracked<T: ResponseMessage>(
        &self,
        envelope: impl Into<Option<RequestEnvelope>>,
        on_responses: Option<ResponsesCallback<T>>,
    ) -> NetFutureResult<(ResponseFutures<T>, PollerHandle)> {
        let pending = self.gateway.submit_many(envelope, on_responses)?;
        let future = pending.future().clone();
        Ok((future, self.poller(pending).spawn(&self.handle)))
    }

    fn poller<U>(&self, pending: PendingRequest<U>) -> CompletionPoller<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        CompletionPoller::new(pending, self.poll_interval).with_max_wait(self.max_wait)
    }

    fn spawn_detached<U>(&self, pending: PendingRequest<U>)
    where
        U: Clone + Send + Sync + 'static,
    {
        let opaque = pending.future().opaque();
        let poller = self.poller(pending);
        self.handle.spawn(async move {
            match poller.run().await {
                Ok(outcome) => debug!("request {} finished: {:?}", opaque, outcome),
                Err(e) if e.is_fatal() => {
                    error!("request {} poller hit a broken completion contract: {}", opaque, e);
                    panic!("request {} poller hit a broken completion contract: {}", opaque, e);
                }
                Err(e) => warn!("request {} poller stopped: {}", opaque, e),
            }
        });
    }
}
