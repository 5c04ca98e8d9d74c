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

use std::fmt;
use std::str::FromStr;

use netfuture_error::NetFutureError;
use netfuture_error::NetFutureResult;

/// Initializes the logger from the environment.
///
/// Reads the log level from `RUST_LOG`, defaulting to `INFO` when unset or unparsable. The output
/// includes thread names, thread ids, levels and line numbers. Calling it again after a subscriber
/// has been installed is a no-op.
pub fn init_logger() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    init_logger_with_level(level);
}

pub fn init_logger_with_level(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_level(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_max_level(level.as_tracing())
        .try_init();
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Level(&'static str);

impl Level {
    pub const ERROR: Level = Level("ERROR");

    pub const WARN: Level = Level("WARN");

    pub const INFO: Level = Level("INFO");

    pub const DEBUG: Level = Level("DEBUG");

    pub const TRACE: Level = Level("TRACE");

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    fn as_tracing(&self) -> tracing::Level {
        match self.0 {
            "ERROR" => tracing::Level::ERROR,
            "WARN" => tracing::Level::WARN,
            "DEBUG" => tracing::Level::DEBUG,
            "TRACE" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

impl FromStr for Level {
    type Err = NetFutureError;

    fn from_str(level: &str) -> NetFutureResult<Self> {
        match level.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::ERROR),
            "WARN" => Ok(Level::WARN),
            "INFO" => Ok(Level::INFO),
            "DEBUG" => Ok(Level::DEBUG),
            "TRACE" => Ok(Level::TRACE),
            _ => Err(NetFutureError::invalid_configuration(
                "RUST_LOG",
                format!("invalid log level: {}", level),
            )),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_str_accepts_any_case() {
        assert_eq!("error".parse::<Level>().unwrap(), Level::ERROR);
        assert_eq!("Warn".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!(" INFO ".parse::<Level>().unwrap(), Level::INFO);
        assert_eq!("debug".parse::<Level>().unwrap(), Level::DEBUG);
        assert_eq!("TRACE".parse::<Level>().unwrap(), Level::TRACE);
    }

    #[test]
    fn level_from_str_rejects_unknown() {
        assert!(matches!(
            "verbose".parse::<Level>(),
            Err(NetFutureError::InvalidConfiguration { key: "RUST_LOG", .. })
        ));
    }

    #[test]
    fn level_display_formats_correctly() {
        assert_eq!(format!("{}", Level::ERROR), "ERROR");
        assert_eq!(format!("{:>5}", Level::WARN), " WARN");
        assert_eq!(Level::DEBUG.as_tracing(), tracing::Level::DEBUG);
    }

    #[test]
    fn init_logger_twice_is_harmless() {
        init_logger_with_level(Level::DEBUG);
        init_logger();
    }
}
