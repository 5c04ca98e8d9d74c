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

//! Non-blocking request submission on top of an asynchronous network service.
//!
//! A caller hands an envelope to [`AsyncNetworkAdapter::send_request`] and gets a
//! [`ResponseFuture`] back immediately. The inner service completes that future from its own
//! context; a per-request [`CompletionPoller`] re-checks it at the configured interval and invokes
//! the optional callback exactly once.

pub mod adapter;
pub mod base;
pub mod clients;
pub mod config;
pub mod gateway;
pub mod log;
pub mod poller;
pub mod prelude;
pub mod remoting;

#[cfg(test)]
mod test_service;

pub use netfuture_error::NetFutureError;
pub use netfuture_error::NetFutureResult;
pub use netfuture_runtime::NetFutureRuntime;

pub use crate::adapter::AsyncNetworkAdapter;
pub use crate::base::request_envelope::RequestEnvelope;
pub use crate::base::response_future::Completer;
pub use crate::base::response_future::ResponseFuture;
pub use crate::base::response_future::ResponseFutures;
pub use crate::clients::Transport;
pub use crate::clients::TransportService;
pub use crate::config::PollingConfig;
pub use crate::gateway::PendingRequest;
pub use crate::gateway::RequestGateway;
pub use crate::poller::CompletionPoller;
pub use crate::poller::PollOutcome;
pub use crate::poller::PollerHandle;
pub use crate::poller::PollerState;
pub use crate::remoting::InnerNetworkService;
pub use crate::remoting::ResponseCallback;
pub use crate::remoting::ResponseMessage;
pub use crate::remoting::ResponsesCallback;
