use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};

/// UTC offset of China Standard Time, which has no daylight saving.
pub const BEIJING_OFFSET_SECS: i32 = 8 * 60 * 60;

/// Console layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    /// `"prod"` selects production, anything else development.
    pub fn parse(mode: &str) -> Self {
        if mode == "prod" {
            Mode::Production
        } else {
            Mode::Development
        }
    }
}

impl From<&str> for Mode {
    fn from(mode: &str) -> Self {
        Mode::parse(mode)
    }
}

/// Configuration of a [`Logger`](crate::Logger).
#[derive(Debug, Clone)]
pub struct Config {
    info_log_path: PathBuf,
    error_log_path: PathBuf,
    mode: Mode,
    console: bool,
    utc_offset: FixedOffset,
}

impl Config {
    /// Debug to warn records go to `info_log_path`, error and fatal records to
    /// `error_log_path`. The console channel is enabled by default.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(info_log_path: P, error_log_path: Q) -> Self {
        Self {
            info_log_path: info_log_path.as_ref().to_path_buf(),
            error_log_path: error_log_path.as_ref().to_path_buf(),
            mode: Mode::default(),
            console: true,
            utc_offset: Utc.fix(),
        }
    }
    /// Sets the console layout, from a [`Mode`] or a mode string.
    pub fn with_mode(self, mode: impl Into<Mode>) -> Self {
        Self {
            mode: mode.into(),
            ..self
        }
    }
    /// Ignore console logging
    pub fn no_console(self) -> Self {
        Self {
            console: false,
            ..self
        }
    }
    /// Dynamically set the console flag.
    pub fn with_console(self, yes: bool) -> Self {
        Self {
            console: yes,
            ..self
        }
    }
    /// Renders timestamps at a fixed offset instead of UTC.
    pub fn with_utc_offset(self, utc_offset: FixedOffset) -> Self {
        Self { utc_offset, ..self }
    }

    pub fn info_log_path(&self) -> &Path {
        &self.info_log_path
    }

    pub fn error_log_path(&self) -> &Path {
        &self.error_log_path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn console(&self) -> bool {
        self.console
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}
