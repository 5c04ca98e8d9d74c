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

//! Fire-and-forget requests against an in-process echo transport.
//!
//! Run with `RUST_LOG=DEBUG` to see submission and completion events.

use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use netfuture::log::init_logger;
use netfuture::prelude::*;
use netfuture::NetFutureRuntime;
use serde::Deserialize;
use tracing::info;

#[derive(Clone, Debug, Deserialize)]
struct Echo {
    opaque: i32,
    body: String,
}

fn main() -> NetFutureResult<()> {
    init_logger();
    let runtime = NetFutureRuntime::new_multi(2, "netfuture-demo")?;

    let service = TransportService::with_handle(runtime.get_handle().clone(), |envelope: RequestEnvelope| {
        async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let echo = serde_json::json!({
                "opaque": envelope.opaque(),
                "body": String::from_utf8_lossy(envelope.body()),
            });
            Ok::<_, NetFutureError>(Bytes::from(echo.to_string()))
        }
        .boxed()
    });
    let adapter = AsyncNetworkAdapter::initialize_on(
        runtime.get_handle().clone(),
        PollingConfig::new(0.01),
        std::sync::Arc::new(service),
    )?;

    adapter.send_request::<Echo>(
        RequestEnvelope::new(1, "fire and forget"),
        Some(Box::new(|echo| info!("callback got {:?}", echo))),
    )?;

    let (future, handle) = adapter.send_request_tracked::<Echo>(RequestEnvelope::new(1, "tracked"), None)?;
    let outcome = runtime.block_on(handle.join())?;
    info!("tracked request finished with {:?}: {:?}", outcome, future.result());
    if let Some(echo) = future.result() {
        info!("request {} echoed '{}'", echo.opaque, echo.body);
    }

    runtime.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}
