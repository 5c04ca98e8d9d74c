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

//! In-crate inner services used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use netfuture_error::NetFutureResult;
use parking_lot::Mutex;
use serde_json::Value;

use crate::base::request_envelope::RequestEnvelope;
use crate::base::response_future::Completer;
use crate::base::response_future::ResponseFuture;
use crate::remoting::InnerNetworkService;
use crate::remoting::ResponseMessage;

type Completion = Box<dyn FnOnce(Option<Value>) + Send>;

/// Holds every completer until the test completes it explicitly with a JSON value.
pub(crate) struct HoldingService {
    multi: bool,
    submitted: AtomicUsize,
    pending: Mutex<VecDeque<Completion>>,
}

impl Default for HoldingService {
    fn default() -> Self {
        Self {
            multi: true,
            submitted: AtomicUsize::new(0),
            pending: Mutex::new(VecDeque::new()),
        }
    }
}

impl HoldingService {
    pub(crate) fn single_only() -> Self {
        Self {
            multi: false,
            ..Self::default()
        }
    }

    pub(crate) fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Completes the oldest outstanding request; `None` simulates a producer that completes
    /// without a result.
    pub(crate) fn complete_next(&self, value: Option<Value>) {
        let completion = self.pending.lock().pop_front();
        if let Some(completion) = completion {
            completion(value);
        }
    }

    fn hold<T: ResponseMessage>(&self, completer: Completer<T>) -> ResponseFuture<T> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        let future = completer.future();
        self.pending.lock().push_back(Box::new(move |value: Option<Value>| {
            let decoded = value.map(|value| serde_json::from_value::<T>(value).unwrap());
            let _ = completer.try_complete(decoded);
        }));
        future
    }
}

impl InnerNetworkService for HoldingService {
    fn send_request_as_future<T: ResponseMessage>(
        &self,
        _envelope: RequestEnvelope,
        completer: Completer<T>,
    ) -> NetFutureResult<ResponseFuture<T>> {
        Ok(self.hold(completer))
    }

    fn supports_futures(&self) -> bool {
        self.multi
    }

    fn send_request_as_futures<T: ResponseMessage>(
        &self,
        _envelope: RequestEnvelope,
        completer: Completer<Vec<T>>,
    ) -> NetFutureResult<ResponseFuture<Vec<T>>> {
        Ok(self.hold(completer))
    }
}
