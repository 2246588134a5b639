use std::fmt;

/// Severity of a record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Lowercase name, as written to JSON records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Maps a `log` crate level. `Trace` has no counterpart.
    pub fn from_log(level: log::Level) -> Option<Self> {
        match level {
            log::Level::Error => Some(Level::Error),
            log::Level::Warn => Some(Level::Warn),
            log::Level::Info => Some(Level::Info),
            log::Level::Debug => Some(Level::Debug),
            log::Level::Trace => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of levels a sink accepts. An open upper bound accepts
/// everything at or above `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    min: Level,
    max: Option<Level>,
}

impl LevelRange {
    pub fn at_least(min: Level) -> Self {
        Self { min, max: None }
    }

    pub fn between(min: Level, max: Level) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn accepts(&self, level: Level) -> bool {
        level >= self.min && self.max.is_none_or(|max| level <= max)
    }
}

#[test]
fn test_level_ordering() {
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Warn);
    assert!(Level::Warn < Level::Error);
    assert!(Level::Error < Level::Fatal);
}

#[test]
fn test_level_range() {
    let info = LevelRange::between(Level::Debug, Level::Warn);
    assert!(info.accepts(Level::Debug));
    assert!(info.accepts(Level::Warn));
    assert!(!info.accepts(Level::Error));
    assert!(!info.accepts(Level::Fatal));

    let error = LevelRange::at_least(Level::Error);
    assert!(!error.accepts(Level::Warn));
    assert!(error.accepts(Level::Error));
    assert!(error.accepts(Level::Fatal));
}

#[test]
fn test_from_log_level() {
    assert_eq!(Level::from_log(log::Level::Warn), Some(Level::Warn));
    assert_eq!(Level::from_log(log::Level::Trace), None);
}
