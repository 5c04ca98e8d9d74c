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

//! Host execution loop for netfuture.
//!
//! Poller tasks are cooperative tokio tasks; this crate owns the runtime they run on when the host
//! does not already provide one.

use std::future::Future;
use std::time::Duration;

use netfuture_error::NetFutureResult;
use tokio::task::JoinHandle;
use tracing::info;

pub enum NetFutureRuntime {
    Multi(tokio::runtime::Runtime),
    CurrentThread(tokio::runtime::Runtime),
}

impl NetFutureRuntime {
    #[inline]
    pub fn new_multi(threads: usize, name: &str) -> NetFutureResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name(name)
            .enable_all()
            .build()?;
        info!("netfuture runtime '{}' started with {} worker threads", name, threads.max(1));
        Ok(Self::Multi(runtime))
    }

    /// A multi-thread runtime with one worker per logical CPU.
    #[inline]
    pub fn new_multi_default(name: &str) -> NetFutureResult<Self> {
        Self::new_multi(num_cpus::get(), name)
    }

    /// A single-threaded cooperative loop. Every poller shares the thread that drives
    /// [`NetFutureRuntime::block_on`].
    #[inline]
    pub fn new_current_thread() -> NetFutureResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(Self::CurrentThread(runtime))
    }
}

impl NetFutureRuntime {
    #[inline]
    pub fn get_handle(&self) -> &tokio::runtime::Handle {
        self.get_runtime().handle()
    }

    #[inline]
    pub fn get_runtime(&self) -> &tokio::runtime::Runtime {
        match self {
            Self::Multi(runtime) | Self::CurrentThread(runtime) => runtime,
        }
    }

    #[inline]
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.get_handle().spawn(task)
    }

    #[inline]
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.get_runtime().block_on(future)
    }

    #[inline]
    pub fn shutdown(self) {
        match self {
            Self::Multi(runtime) | Self::CurrentThread(runtime) => runtime.shutdown_background(),
        }
    }

    #[inline]
    pub fn shutdown_timeout(self, timeout: Duration) {
        match self {
            Self::Multi(runtime) | Self::CurrentThread(runtime) => runtime.shutdown_timeout(timeout),
        }
    }
}
