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

use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use serde::Serialize;

static REQUEST_ID: AtomicI32 = AtomicI32::new(0);

/// Outbound request payload. The body is opaque to this crate; only the inner service interprets it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestEnvelope {
    code: i32,
    opaque: i32,
    body: Bytes,
}

impl RequestEnvelope {
    /// Builds an envelope with a fresh process-wide request id.
    pub fn new(code: i32, body: impl Into<Bytes>) -> Self {
        Self {
            code,
            opaque: Self::create_new_request_id(),
            body: body.into(),
        }
    }

    /// Builds an envelope whose body is the JSON encoding of `body`.
    pub fn from_json<B: Serialize>(code: i32, body: &B) -> NetFutureResult<Self> {
        let encoded = serde_json::to_vec(body).map_err(|e| NetFutureError::invalid_argument("body", e.to_string()))?;
        Ok(Self::new(code, encoded))
    }

    #[inline]
    pub fn with_opaque(mut self, opaque: i32) -> Self {
        self.opaque = opaque;
        self
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    #[inline]
    pub fn opaque(&self) -> i32 {
        self.opaque
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn create_new_request_id() -> i32 {
        REQUEST_ID.fetch_add(1, Ordering::AcqRel)
    }
}
