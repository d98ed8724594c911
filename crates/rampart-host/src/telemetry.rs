//! Process-wide `tracing` subscriber for the host.
//!
//! Breakers, the validator, the dispatcher and the host all log under
//! `<crate>::<concern>` targets (for example `rampart_breaker::breaker` or
//! `rampart_host::health`), so `log_filter` directives such as
//! `info,rampart_dispatch::guard=debug` select one concern at a time.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use rampart_config::{Config, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static INSTALLED: OnceCell<TelemetryHandle> = OnceCell::new();

/// Describes the subscriber installed for this process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    coloured: bool,
}

impl TelemetryHandle {
    /// Layout of rendered events.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }

    /// Returns `true` when events carry ANSI colour codes.
    #[must_use]
    pub const fn is_coloured(self) -> bool {
        self.coloured
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured `log_filter` is not a valid directive list.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another subscriber already owns the process.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the subscriber described by `config` on first use.
///
/// Every later call, whatever its configuration, returns the handle of the
/// subscriber that was installed first. Several hosts in one process (as in
/// tests) therefore share one log stream.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable `log_filter` and
/// [`TelemetryError::Subscriber`] when a subscriber was installed by
/// something other than this function.
///
/// # Examples
///
/// ```rust
/// use rampart_config::{Config, LogColour, LogFormat};
/// use rampart_host::telemetry;
///
/// # fn main() -> Result<(), rampart_host::TelemetryError> {
/// let first = telemetry::initialise(&Config::default().with_log_colour(LogColour::Never))?;
/// let second = telemetry::initialise(&Config::default().with_log_format(LogFormat::Pretty))?;
/// assert_eq!(first, second);
/// assert!(!second.is_coloured());
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED.get_or_try_init(|| install(config)).copied()
}

fn install(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let handle = TelemetryHandle {
        format: config.log_format(),
        coloured: config
            .log_colour()
            .resolve(config.log_format(), io::stderr().is_terminal()),
    };

    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(handle.coloured)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match handle.format {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
        LogFormat::Pretty => Box::new(
            base.pretty()
                .with_file(true)
                .with_line_number(true)
                .finish(),
        ),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;

    tracing::debug!(
        target: TELEMETRY_TARGET,
        format = %handle.format,
        coloured = handle.coloured,
        filter = config.log_filter(),
        "telemetry installed"
    );
    Ok(handle)
}
