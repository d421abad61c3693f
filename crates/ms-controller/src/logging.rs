//! Tracing subscriber setup for binaries driving the controller.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

/// Filter override read before `RUST_LOG`.
pub const LOG_ENV: &str = "MSIM_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines with targets.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Pick the filter directive: `MSIM_LOG`, then `RUST_LOG`, then `info`.
/// Empty values count as unset.
pub fn filter_directive(msim_log: Option<&str>, rust_log: Option<&str>) -> String {
    msim_log
        .filter(|s| !s.trim().is_empty())
        .or(rust_log.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_owned()
}

/// Install a global `fmt` subscriber on stderr.
///
/// An invalid directive falls back to `info` with a note on stderr.  Does
/// nothing if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat) {
    let msim = std::env::var(LOG_ENV).ok();
    let rust = std::env::var("RUST_LOG").ok();
    let directive = filter_directive(msim.as_deref(), rust.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("invalid log directive {directive:?} ({err}); defaulting to {DEFAULT_DIRECTIVE}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    });

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .with_target(false)
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    if installed {
        info!(filter = %directive, format = ?format, "tracing initialised");
    }
}
