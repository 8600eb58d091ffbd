//! Donation Logging
//!
//! Shared `tracing` subscriber setup for the donation binaries and tests.
//! `RUST_LOG` always overrides the level chosen in code.

use std::fmt;

use tracing::debug;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive for this level, with the donation crates one level chattier
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info,donations_payments=debug",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        f.write_str(name)
    }
}

fn filter_for(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber, failing if one is already set
pub fn try_init(level: LogLevel) -> Result<(), TryInitError> {
    init_with_filter(level.directive())
}

/// Install the global subscriber, ignoring an already-installed one
pub fn init(level: LogLevel) {
    let _ = try_init(level);
}

/// Install the global subscriber from `RUST_LOG`, or `default_filter` when unset
pub fn init_from_env(default_filter: &str) -> Result<(), TryInitError> {
    init_with_filter(default_filter)
}

fn init_with_filter(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt_layer::layer())
        .with(filter_for(default_directive))
        .try_init()?;
    debug!("Logging initialized (default filter: {})", default_directive);
    Ok(())
}
