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

//! Prelude module for convenient imports
//!
//! # Example
//!
//! ```rust
//! use netfuture::prelude::*;
//!
//! let config = PollingConfig::new(0.05);
//! assert!(config.validate().is_ok());
//! let envelope = RequestEnvelope::new(1, "ping");
//! assert_eq!(envelope.code(), 1);
//! ```

pub use crate::adapter::AsyncNetworkAdapter;
pub use crate::base::request_envelope::RequestEnvelope;
pub use crate::base::response_future::Completer;
pub use crate::base::response_future::ResponseFuture;
pub use crate::base::response_future::ResponseFutures;
pub use crate::clients::Transport;
pub use crate::clients::TransportService;
pub use crate::config::PollingConfig;
pub use crate::poller::PollOutcome;
pub use crate::poller::PollerHandle;
pub use crate::remoting::InnerNetworkService;
pub use crate::remoting::ResponseCallback;
pub use crate::remoting::ResponseMessage;
pub use crate::remoting::ResponsesCallback;
pub use netfuture_error::NetFutureError;
pub use netfuture_error::NetFutureResult;
