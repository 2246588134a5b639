//! # tierlog-core
//! Core utilities for tierlog: records, encoders, level-filtered sinks and
//! rotating log files.

mod config;
mod encoder;
mod level;
mod log_rotation;
mod log_writer;
mod record;
mod sink;
mod utils;

pub use config::{TIERLOG_CONFIG, TierlogConfig};
pub use encoder::{Encoder, Format};
pub use level::{Level, LevelRange};
pub use log_rotation::{RotatingFile, RotationPolicy};
pub use log_writer::{LogStdout, LogWriter};
pub use record::{ERROR_KEY, Field, Record, STACKTRACE_KEY};
pub use sink::{Sink, Tee};
