use std::{io, sync::Arc};

use crate::{
    encoder::Encoder,
    level::{Level, LevelRange},
    log_writer::LogWriter,
    record::Record,
    utils::{SinkSender, spawn_sink_thread},
};

/// One output channel: a level filter in front of an encoder and a writer
/// running on its own thread.
pub struct Sink {
    filter: LevelRange,
    sender: SinkSender,
}

impl Sink {
    pub fn spawn<W: LogWriter + Send + 'static>(
        name: &str,
        filter: LevelRange,
        encoder: Encoder,
        writer: W,
    ) -> Result<Self, io::Error> {
        Ok(Self {
            filter,
            sender: spawn_sink_thread(name, writer, encoder)?,
        })
    }

    pub fn accepts(&self, level: Level) -> bool {
        self.filter.accepts(level)
    }
}

/// Fan-out over several sinks. Each record is handed to every sink whose
/// filter accepts its level.
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Sink>,
}

impl Tee {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    /// Whether any sink would accept a record at `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|sink| sink.accepts(level))
    }

    pub fn dispatch(&self, record: Record) {
        let record = Arc::new(record);
        for sink in self.sinks.iter().filter(|sink| sink.accepts(record.level)) {
            sink.sender.send(Arc::clone(&record));
        }
    }

    /// Blocks until every sink has written and synced what was dispatched
    /// before the call.
    pub fn flush(&self) {
        for sink in &self.sinks {
            sink.sender.flush();
        }
    }
}
