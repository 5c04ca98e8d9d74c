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

//! Unified error type for netfuture operations

use std::io;

use thiserror::Error;

/// Main error type for all netfuture operations
///
/// # Examples
///
/// ```rust
/// use netfuture_error::NetFutureError;
///
/// let err = NetFutureError::invalid_argument("envelope", "request envelope is absent");
/// assert!(!err.is_fatal());
///
/// let err = NetFutureError::invalid_operation("poll", "future completed without a result");
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, Error)]
pub enum NetFutureError {
    // ============================================================================
    // Submission Errors
    // ============================================================================
    /// A request argument was missing or malformed; no future was created
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: &'static str, reason: String },

    /// The requested submission path is not supported by the inner service
    #[error("Operation '{operation}' is not implemented")]
    NotImplemented { operation: &'static str },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// A configuration value failed validation at startup
    #[error("Invalid configuration '{key}': {reason}")]
    InvalidConfiguration { key: &'static str, reason: String },

    /// The configuration source could not be read or deserialized
    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    // ============================================================================
    // Completion Contract Violations
    // ============================================================================
    /// A future reported completion without a result
    #[error("Invalid operation '{operation}': {reason}")]
    InvalidOperation { operation: &'static str, reason: String },

    /// A producer completed a future with an absent value
    #[error("Null completion: {reason}")]
    NullCompletion { reason: String },

    // ============================================================================
    // Poller Errors
    // ============================================================================
    /// The bounded wait elapsed before the future completed
    #[error("Poll timeout after {waited_ms}ms")]
    PollTimeout { waited_ms: u64 },

    /// The poller task panicked or was torn down by the runtime
    #[error("Poller aborted: {reason}")]
    PollerAborted { reason: String },

    // ============================================================================
    // System Errors
    // ============================================================================
    /// IO error from std library
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl NetFutureError {
    /// Create an invalid argument error
    #[inline]
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    #[inline]
    pub fn invalid_configuration(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            key,
            reason: reason.into(),
        }
    }

    /// Create an invalid operation error
    #[inline]
    pub fn invalid_operation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn null_completion(reason: impl Into<String>) -> Self {
        Self::NullCompletion { reason: reason.into() }
    }

    #[inline]
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented { operation }
    }

    #[inline]
    pub fn poll_timeout(waited_ms: u64) -> Self {
        Self::PollTimeout { waited_ms }
    }

    #[inline]
    pub fn poller_aborted(reason: impl Into<String>) -> Self {
        Self::PollerAborted { reason: reason.into() }
    }

    /// Returns `true` if the error signals a broken invariant rather than a caller mistake.
    ///
    /// Fatal errors must terminate the owning task; they are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperation { .. } | Self::NullCompletion { .. } | Self::PollerAborted { .. }
        )
    }
}

/// Result type alias for netfuture operations
pub type NetFutureResult<T> = std::result::Result<T, NetFutureError>;
