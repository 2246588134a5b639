//! # tierlog
//! Structured logger routing records by severity to rotating JSON log files
//! and the console.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! tierlog = "0.1.0"
//! ```
//!
//! ```rust
//! use tierlog::{Config, Field, Logger};
//!
//! let logger = Logger::new(
//!     &Config::new("/tmp/tierlog_doc/info.log", "/tmp/tierlog_doc/error.log").with_mode("prod"),
//! )
//! .expect("Unable to open log files");
//! logger.info("server started", &[Field::new("port", 8080)]);
//! tierlog::warnf!(logger, "{} connections dropped", 3);
//! logger.flush(); // ensure records are written
//! ```
//!
//! ## Channels
//! Every record is delivered to each channel whose level range accepts it:
//! - `info`: debug, info and warn records, as JSON lines in the info file
//! - `error`: error and fatal records, as JSON lines in the error file
//! - `console`: every record, on stdout (can be disabled with [`Config::no_console`])
//!
//! Files rotate at 500 MB, keeping 3 backups for at most 28 days.
//!
//! ## Errors
//! [`Logger::error`] and [`errorf!`] with an error attach `error` and `stacktrace`
//! fields to the record.
//!
//! ```rust
//! use tierlog::{Config, Logger};
//!
//! let logger = Logger::new(
//!     &Config::new("/tmp/tierlog_doc_err/info.log", "/tmp/tierlog_doc_err/error.log").no_console(),
//! )
//! .unwrap();
//! let err = std::fs::read("/does/not/exist").unwrap_err();
//! logger.error("unable to read settings", &err, &[]);
//! tierlog::errorf!(logger, error = err; "unable to read {}", "/does/not/exist");
//! logger.flush();
//! let logged = std::fs::read_to_string("/tmp/tierlog_doc_err/error.log").unwrap();
//! assert!(logged.contains("\"stacktrace\""));
//! ```
//!
//! ## Global logger
//! [`init`] builds one process-wide logger and installs it as the backend of
//! the `log` crate macros. Later calls return the same instance.
//!
//! ```rust
//! use tierlog::Config;
//!
//! let config = Config::new("/tmp/tierlog_doc_global/info.log", "/tmp/tierlog_doc_global/error.log");
//! tierlog::init(&config).expect("Unable to open log files");
//! log::info!("Hello, world!");
//! tierlog::logger().debug("debug records go to the info file", &[]);
//! tierlog::flush(); // call before exiting, records are buffered
//! ```

mod config;
mod error;
mod logger;
mod macros;

use std::sync::{Mutex, OnceLock, PoisonError};

pub use config::{BEIJING_OFFSET_SECS, Config, Mode};
pub use error::Error;
pub use logger::Logger;
pub use tierlog_core::{
    Encoder, Field, Format, Level, LevelRange, LogStdout, LogWriter, RotatingFile, RotationPolicy,
    Sink, Tee,
};

/// Process-wide logger, set once by [`init`].
static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();
/// Serializes construction so concurrent first calls build a single logger.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Builds the global logger from `config` and installs it as the `log` crate
/// backend. Only the first call has an effect; later calls return the
/// existing logger and ignore their config.
pub fn init(config: &Config) -> Result<&'static Logger, Error> {
    if let Some(logger) = GLOBAL_LOGGER.get() {
        return Ok(logger);
    }
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(logger) = GLOBAL_LOGGER.get() {
        return Ok(logger);
    }
    let logger = Logger::new(config)?;
    let logger = GLOBAL_LOGGER.get_or_init(|| logger);
    match log::set_logger(logger) {
        Ok(()) => log::set_max_level(log::LevelFilter::Debug),
        Err(_) => logger.warn(
            "log crate backend already set, log macros will not reach tierlog",
            &[],
        ),
    }
    Ok(logger)
}

/// The global logger, if [`init`] has run.
pub fn global() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}

/// The global logger.
///
/// # Panics
/// If [`init`] has not been called.
pub fn logger() -> &'static Logger {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger,
        None => panic!("tierlog::logger() called before tierlog::init()"),
    }
}

/// Flushes the global logger. Does nothing before [`init`].
pub fn flush() {
    if let Some(logger) = GLOBAL_LOGGER.get() {
        logger.flush();
    }
}
