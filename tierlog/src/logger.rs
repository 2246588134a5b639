use std::{error::Error as StdError, fmt, path::Path, sync::Arc};

use tierlog_core::{
    Encoder, Field, Format, Level, LevelRange, LogStdout, LogWriter, Record, RotatingFile,
    RotationPolicy, Sink, Tee,
};

use crate::{
    config::{Config, Mode},
    error::Error,
};

/// Handle to a set of level-routed sinks. Clones share the same sinks; the
/// sinks are drained and closed when the last clone is dropped.
#[derive(Clone)]
pub struct Logger {
    tee: Arc<Tee>,
}

fn file_sink(
    channel: &'static str,
    path: &Path,
    filter: LevelRange,
    encoder: Encoder,
) -> Result<Sink, Error> {
    let writer = RotatingFile::new(path, RotationPolicy::default()).map_err(|source| {
        Error::OpenLog {
            channel,
            path: path.to_path_buf(),
            source,
        }
    })?;
    Sink::spawn(channel, filter, encoder, writer).map_err(|source| Error::Spawn { channel, source })
}

impl Logger {
    /// Opens the info and error files and starts the sinks:
    /// - `info`: debug to warn, JSON lines to the info log path
    /// - `error`: error and fatal, JSON lines to the error log path
    /// - `console` (optional): every level, to stdout in the configured mode
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::with_console_writer(config, LogStdout)
    }

    /// Same channels as [`Logger::new`], with `console` as the console output.
    pub(crate) fn with_console_writer<W: LogWriter + Send + 'static>(
        config: &Config,
        console: W,
    ) -> Result<Self, Error> {
        let offset = config.utc_offset();
        let json = Encoder::new(Format::Json, offset);
        let mut sinks = vec![
            file_sink(
                "info",
                config.info_log_path(),
                LevelRange::between(Level::Debug, Level::Warn),
                json,
            )?,
            file_sink(
                "error",
                config.error_log_path(),
                LevelRange::at_least(Level::Error),
                json,
            )?,
        ];
        if config.console() {
            let format = match config.mode() {
                Mode::Production => Format::Production,
                Mode::Development => Format::Development,
            };
            let sink = Sink::spawn(
                "console",
                LevelRange::at_least(Level::Debug),
                Encoder::new(format, offset),
                console,
            )
            .map_err(|source| Error::Spawn {
                channel: "console",
                source,
            })?;
            sinks.push(sink);
        }
        Ok(Self::from_tee(Tee::new(sinks)))
    }

    /// Wraps an already composed set of sinks.
    pub fn from_tee(tee: Tee) -> Self {
        Self { tee: Arc::new(tee) }
    }

    /// Whether a record at `level` would reach any sink.
    pub fn enabled(&self, level: Level) -> bool {
        self.tee.enabled(level)
    }

    pub fn emit(&self, level: Level, message: impl Into<String>, fields: Vec<Field>) {
        if self.tee.enabled(level) {
            self.tee.dispatch(Record::new(level, message, fields));
        }
    }

    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Debug, message, fields.to_vec());
    }

    pub fn info(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Info, message, fields.to_vec());
    }

    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.emit(Level::Warn, message, fields.to_vec());
    }

    /// Logs at error level with `error` and `stacktrace` fields appended after
    /// `fields`.
    pub fn error(&self, message: &str, err: &dyn StdError, fields: &[Field]) {
        if !self.tee.enabled(Level::Error) {
            return;
        }
        let mut fields = fields.to_vec();
        fields.extend(Field::error_with_stack(err));
        self.emit(Level::Error, message, fields);
    }

    /// Logs at fatal level, flushes every sink and exits the process with
    /// status 1.
    pub fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        self.emit(Level::Fatal, message, fields.to_vec());
        self.exit()
    }

    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args.to_string(), Vec::new());
    }

    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args.to_string(), Vec::new());
    }

    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args.to_string(), Vec::new());
    }

    /// Logs a formatted message at error level. When `err` is given, its
    /// message and a stack trace are attached.
    pub fn errorf(&self, err: Option<&dyn StdError>, args: fmt::Arguments<'_>) {
        if !self.tee.enabled(Level::Error) {
            return;
        }
        let fields = match err {
            Some(err) => Field::error_with_stack(err).to_vec(),
            None => Vec::new(),
        };
        self.emit(Level::Error, args.to_string(), fields);
    }

    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.emit(Level::Fatal, args.to_string(), Vec::new());
        self.exit()
    }

    /// Blocks until every record logged before the call is written and synced.
    pub fn flush(&self) {
        self.tee.flush();
    }

    fn exit(&self) -> ! {
        self.tee.flush();
        std::process::exit(1)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Level::from_log(metadata.level()).is_some_and(|level| self.tee.enabled(level))
    }

    fn log(&self, record: &log::Record) {
        let Some(level) = Level::from_log(record.level()) else {
            return;
        };
        self.emit(
            level,
            record.args().to_string(),
            vec![Field::new("target", record.target())],
        );
    }

    fn flush(&self) {
        self.tee.flush();
    }
}
