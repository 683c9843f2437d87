// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Providers let the engine run in different contexts by plugging in
//! implementations of core services. Today that is only logging: a
//! datapath wants its journal, a unit test wants `println!` or a
//! record it can inspect afterwards.

use std::fmt;
use std::fmt::Display;
use std::sync::Arc;

/// A logging provider provides the means to log messages to some
/// destination based on the context in which the engine is running.
///
/// The engine logs benign no-ops (popping an absent tag) as notes,
/// skipped input (an unsupported OXM field or action) as warnings,
/// and broken internal state as errors.
pub trait LogProvider: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, msg: &str);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Note,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_s = match self {
            Self::Note => "[NOTE]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        };
        write!(f, "{level_s}")
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PrintlnLog;

impl LogProvider for PrintlnLog {
    fn log(&self, level: LogLevel, msg: &str) {
        println!("{level} {msg}");
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLog;

impl LogProvider for NullLog {
    fn log(&self, _level: LogLevel, _msg: &str) {}
}

/// The provider a packet uses unless told otherwise.
pub fn default_log() -> Arc<dyn LogProvider> {
    Arc::new(PrintlnLog)
}

#[cfg(any(feature = "test-help", test))]
pub use record::RecordLog;

#[cfg(any(feature = "test-help", test))]
mod record {
    use super::LogLevel;
    use super::LogProvider;
    use std::sync::Mutex;

    /// Keeps every message so a test can assert on what was logged.
    #[derive(Debug, Default)]
    pub struct RecordLog {
        entries: Mutex<Vec<(LogLevel, String)>>,
    }

    impl RecordLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn entries(&self) -> Vec<(LogLevel, String)> {
            match self.entries.lock() {
                Ok(entries) => entries.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }

        /// Count the messages at `level` containing `needle`.
        pub fn count(&self, level: LogLevel, needle: &str) -> usize {
            self.entries()
                .iter()
                .filter(|(l, msg)| *l == level && msg.contains(needle))
                .count()
        }

        pub fn is_empty(&self) -> bool {
            self.entries().is_empty()
        }
    }

    impl LogProvider for RecordLog {
        fn log(&self, level: LogLevel, msg: &str) {
            let mut entries = match self.entries.lock() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries.push((level, msg.to_string()));
        }
    }
}
