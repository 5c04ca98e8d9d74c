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

use std::path::Path;
use std::time::Duration;

use config::Config;
use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Prefix of environment variables overriding [`PollingConfig`] fields, e.g.
/// `NETFUTURE_POLL_INTERVAL_SECONDS`.
pub const ENV_PREFIX: &str = "NETFUTURE";
pub const POLL_INTERVAL_SECONDS: &str = "poll_interval_seconds";
pub const MAX_WAIT_SECONDS: &str = "max_wait_seconds";

/// Polling behaviour shared by every poller of an adapter. Validated once at startup.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between two completion checks. Zero re-checks on every scheduler turn.
    pub poll_interval_seconds: f64,
    /// Upper bound on how long a poller waits; absent waits indefinitely.
    pub max_wait_seconds: Option<f64>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            poll_interval_seconds: 0.1,
            max_wait_seconds: None,
        }
    }
}

impl PollingConfig {
    pub fn new(poll_interval_seconds: f64) -> Self {
        Self {
            poll_interval_seconds,
            ..Self::default()
        }
    }

    pub fn with_max_wait_seconds(mut self, max_wait_seconds: f64) -> Self {
        self.max_wait_seconds = Some(max_wait_seconds);
        self
    }

    /// Loads the configuration from an optional file, then applies `NETFUTURE_*` environment
    /// overrides. Missing keys keep their defaults. The result is not validated.
    pub fn load(config_file: Option<&Path>) -> NetFutureResult<Self> {
        let mut builder = Config::builder();
        if let Some(config_file) = config_file {
            builder = builder.add_source(config::File::from(config_file));
        }
        let cfg = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(cfg.try_deserialize::<PollingConfig>()?)
    }

    /// Environment overrides on top of the defaults.
    pub fn from_env() -> NetFutureResult<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> NetFutureResult<()> {
        seconds_to_duration(POLL_INTERVAL_SECONDS, self.poll_interval_seconds)?;
        if let Some(max_wait_seconds) = self.max_wait_seconds {
            seconds_to_duration(MAX_WAIT_SECONDS, max_wait_seconds)?;
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> NetFutureResult<Duration> {
        seconds_to_duration(POLL_INTERVAL_SECONDS, self.poll_interval_seconds)
    }

    pub fn max_wait(&self) -> NetFutureResult<Option<Duration>> {
        self.max_wait_seconds
            .map(|seconds| seconds_to_duration(MAX_WAIT_SECONDS, seconds))
            .transpose()
    }
}

fn seconds_to_duration(key: &'static str, seconds: f64) -> NetFutureResult<Duration> {
    if seconds.is_nan() || seconds.is_infinite() {
        return Err(NetFutureError::invalid_configuration(
            key,
            format!("{} is not a finite number of seconds", seconds),
        ));
    }
    if seconds < 0.0 {
        return Err(NetFutureError::invalid_configuration(
            key,
            format!("{} must not be negative", seconds),
        ));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| NetFutureError::invalid_configuration(key, e.to_string()))
}

/// Deserializes any config file format the `config` crate understands into `C`.
pub fn parse_config_file<C>(config_file: impl AsRef<Path>) -> NetFutureResult<C>
where
    C: DeserializeOwned,
{
    let cfg = Config::builder()
        .add_source(config::File::from(config_file.as_ref()))
        .build()?;
    let config_file = cfg.try_deserialize::<C>()?;
    Ok(config_file)
}
