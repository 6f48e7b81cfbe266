//! Tracing subscriber installation
//!
//! The library only emits `tracing` events. Test suites and tools that want
//! to see them call [`init`] once; `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a human readable subscriber filtered by `RUST_LOG`, or by
/// `default_filter` (e.g. `"edsl=debug"`) when it is unset.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    init_with_format(default_filter, LogFormat::Pretty)
}

/// [`init`] with an explicit output format
pub fn init_with_format(default_filter: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_test_writer())
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .try_init()
            .is_ok(),
    }
}
