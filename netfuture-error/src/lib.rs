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

//! # NetFuture Error Handling
//!
//! This crate provides the error type shared by every netfuture crate.
//!
//! Errors fall into two groups:
//! - **Submission/startup errors** (`InvalidArgument`, `InvalidConfiguration`, `NotImplemented`) are returned
//!   synchronously to the caller and leave no state behind.
//! - **Completion contract violations** (`InvalidOperation`, `NullCompletion`) mean a producer broke the
//!   single-completion contract. They are fatal and must never be retried.
//!
//! ### Usage
//!
//! ```rust
//! use netfuture_error::NetFutureError;
//! use netfuture_error::NetFutureResult;
//!
//! fn check_interval(seconds: f64) -> NetFutureResult<()> {
//!     if seconds < 0.0 {
//!         return Err(NetFutureError::invalid_configuration(
//!             "poll_interval_seconds",
//!             "must not be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! # check_interval(0.1).unwrap();
//! ```

pub mod unified;

pub use unified::NetFutureError;
pub use unified::NetFutureResult;
