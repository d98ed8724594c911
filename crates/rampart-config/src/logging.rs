//! How the host renders its `tracing` output.
//!
//! Log events always go to standard error; standard output is reserved for
//! command results such as the breaker status report.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Layout of a rendered log event.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with breaker, plugin and guard fields
    /// flattened to the top level.
    #[default]
    Json,
    /// One line per event.
    Compact,
    /// Multi-line events with source locations, for local debugging.
    Pretty,
}

impl LogFormat {
    /// Returns `true` for layouts read by people rather than log shippers.
    #[must_use]
    pub const fn is_human_readable(self) -> bool {
        !matches!(self, Self::Json)
    }
}

/// When rendered events carry ANSI colour codes.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogColour {
    /// Colour only when standard error is a terminal.
    #[default]
    Auto,
    /// Always colour human-readable output.
    Always,
    /// Never colour.
    Never,
}

impl LogColour {
    /// Decides whether `format` output is coloured on a sink that is or is
    /// not a terminal. JSON output is never coloured.
    ///
    /// # Examples
    ///
    /// ```
    /// use rampart_config::{LogColour, LogFormat};
    ///
    /// assert!(LogColour::Auto.resolve(LogFormat::Compact, true));
    /// assert!(!LogColour::Auto.resolve(LogFormat::Compact, false));
    /// assert!(!LogColour::Always.resolve(LogFormat::Json, true));
    /// ```
    #[must_use]
    pub const fn resolve(self, format: LogFormat, sink_is_terminal: bool) -> bool {
        if !format.is_human_readable() {
            return false;
        }
        match self {
            Self::Auto => sink_is_terminal,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Error returned when [`LogFormat`] or [`LogColour`] text is not recognised.
pub type LogSettingParseError = strum::ParseError;
