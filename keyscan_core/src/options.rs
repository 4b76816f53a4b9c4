//! Progress session options
//!
//! These options are deserialized from the CLI's layered configuration, so
//! every field has a serde default.

use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Label of the single tracker a session registers
pub const DEFAULT_MESSAGE: &str = "Scanning keys";

/// How a session chooses its renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Ask the terminal probe
    #[default]
    Auto,
    /// Always redraw an interactive bar in place
    Bar,
    /// Always append plain status lines
    Log,
    /// Append one JSON object per refresh
    Json,
}

impl ProgressMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Bar => "bar",
            Self::Log => "log",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "bar" | "interactive" => Ok(Self::Bar),
            "log" | "plain" => Ok(Self::Log),
            "json" => Ok(Self::Json),
            other => Err(ValidationError::invalid_parameter(
                "mode",
                &format!("unknown progress mode '{other}', expected one of auto, bar, log, json"),
            )
            .into()),
        }
    }
}

/// Options shared by every renderer of a progress session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressOptions {
    /// Tracker label
    pub message: String,
    /// Column width the label is padded to
    pub message_width: usize,
    /// Number of cells in the progress bar
    pub bar_width: usize,
    /// Refresh interval when attached to a terminal
    pub interactive_refresh_ms: u64,
    /// Refresh interval when writing to a file or pipe
    pub log_refresh_secs: u64,
    pub mode: ProgressMode,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            message_width: 13,
            bar_width: 50,
            interactive_refresh_ms: 100,
            log_refresh_secs: 30,
            mode: ProgressMode::Auto,
        }
    }
}

impl ProgressOptions {
    /// Set the tracker label
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the rendering mode
    pub fn with_mode(mut self, mode: ProgressMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn interactive_refresh(&self) -> Duration {
        Duration::from_millis(self.interactive_refresh_ms.max(1))
    }

    pub fn log_refresh(&self) -> Duration {
        Duration::from_secs(self.log_refresh_secs.max(1))
    }

    /// Check that the options describe a renderable tracker
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(ValidationError::invalid_configuration("progress message must not be empty").into());
        }
        if self.bar_width == 0 {
            return Err(ValidationError::invalid_configuration("bar_width must be positive").into());
        }
        if self.interactive_refresh_ms == 0 {
            return Err(ValidationError::invalid_configuration(
                "interactive_refresh_ms must be positive",
            )
            .into());
        }
        if self.log_refresh_secs == 0 {
            return Err(ValidationError::invalid_configuration("log_refresh_secs must be positive").into());
        }
        Ok(())
    }
}
