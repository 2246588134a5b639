use std::{
    io,
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};

use crate::{config::TIERLOG_CONFIG, encoder::Encoder, log_writer::LogWriter, record::Record};

/// Message consumed by a sink thread.
#[derive(Debug)]
pub(crate) enum SinkMessage {
    Record(Arc<Record>),
    /// Sync the writer, then acknowledge.
    Flush(Sender<()>),
    Shutdown,
}

/// Handle to a sink thread. Dropping it drains the queue, syncs the writer and
/// joins the thread.
pub(crate) struct SinkSender {
    name: String,
    sender: Sender<SinkMessage>,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SinkSender {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SinkSender {
    pub(crate) fn send(&self, record: Arc<Record>) {
        // The thread only disappears after shutdown.
        let _ = self.sender.send(SinkMessage::Record(record));
    }

    /// Blocks until every record sent before this call is written and synced.
    pub(crate) fn flush(&self) {
        let (ack, done) = bounded(1);
        if self.sender.send(SinkMessage::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }

    pub(crate) fn shutdown(&self) {
        let mut guard = match self.handler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.take() {
            // Ignore error if channel is already closed
            let _ = self.sender.send(SinkMessage::Shutdown);
            if handle.join().is_err() {
                eprintln!("tierlog: {} sink thread panicked", self.name);
            }
        }
    }
}

fn report(name: &str, err: io::Error) {
    eprintln!("tierlog: {name} sink write failed: {err}");
}

/// Handles one message, returns false on shutdown.
fn process<W: LogWriter>(
    name: &str,
    writer: &mut W,
    encoder: &Encoder,
    message: SinkMessage,
) -> bool {
    match message {
        SinkMessage::Record(record) => {
            if let Err(err) = writer.write_line(&encoder.encode(&record)) {
                report(name, err);
            }
            true
        }
        SinkMessage::Flush(ack) => {
            if let Err(err) = writer.sync() {
                report(name, err);
            }
            let _ = ack.send(());
            true
        }
        SinkMessage::Shutdown => false,
    }
}

fn run<W: LogWriter>(name: &str, mut writer: W, encoder: Encoder, receiver: Receiver<SinkMessage>) {
    let batch_size = TIERLOG_CONFIG.BATCH_SIZE.max(1);
    let flush_interval = Duration::from_millis(TIERLOG_CONFIG.FLUSH_INTERVAL_MS);
    let mut batch = Vec::with_capacity(batch_size);
    let mut last_flush = Instant::now();
    let mut running = true;
    while running {
        // Calculate timeout until next flush
        let timeout = flush_interval
            .saturating_sub(last_flush.elapsed())
            .max(Duration::from_millis(1));

        match receiver.recv_timeout(timeout) {
            Ok(message) => {
                batch.push(message);
                while batch.len() < batch_size {
                    match receiver.try_recv() {
                        Ok(message) => batch.push(message),
                        Err(_) => break,
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => running = false,
        }

        // Messages batched behind a shutdown are still handled.
        for message in batch.drain(..) {
            running &= process(name, &mut writer, &encoder, message);
        }

        if last_flush.elapsed() >= flush_interval {
            if let Err(err) = writer.flush() {
                report(name, err);
            }
            last_flush = Instant::now();
        }
    }
    // Drain anything sent after the last batch.
    for message in receiver.try_iter() {
        process(name, &mut writer, &encoder, message);
    }
    if let Err(err) = writer.sync() {
        report(name, err);
    }
}

/// Spawns a thread encoding records with `encoder` and writing them to `writer`.
pub(crate) fn spawn_sink_thread<W: LogWriter + Send + 'static>(
    name: &str,
    writer: W,
    encoder: Encoder,
) -> Result<SinkSender, io::Error> {
    let (sender, receiver) = unbounded::<SinkMessage>();
    let thread_name = name.to_owned();
    let handler = std::thread::Builder::new()
        .name(format!("tierlog-{name}"))
        .spawn(move || run(&thread_name, writer, encoder, receiver))?;
    Ok(SinkSender {
        name: name.to_owned(),
        sender,
        handler: Mutex::new(Some(handler)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encoder::Format, level::Level};
    use chrono::FixedOffset;

    #[derive(Clone, Default)]
    struct MemoryWriter {
        lines: Arc<Mutex<Vec<String>>>,
        syncs: Arc<Mutex<usize>>,
    }

    impl LogWriter for MemoryWriter {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.lines.lock().unwrap().push(line.to_owned());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            *self.syncs.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn record(message: &str) -> SinkMessage {
        SinkMessage::Record(Arc::new(Record::new(Level::Info, message, vec![])))
    }

    #[test]
    fn test_messages_behind_shutdown_are_handled() {
        let writer = MemoryWriter::default();
        let (sender, receiver) = unbounded();
        let (ack, done) = bounded(1);
        sender.send(record("first")).unwrap();
        sender.send(SinkMessage::Shutdown).unwrap();
        sender.send(record("second")).unwrap();
        sender.send(SinkMessage::Flush(ack)).unwrap();

        run(
            "memory",
            writer.clone(),
            Encoder::new(Format::Production, FixedOffset::east_opt(0).unwrap()),
            receiver,
        );

        let lines = writer.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\tinfo\tfirst"));
        assert!(lines[1].ends_with("\tinfo\tsecond"));
        assert!(done.try_recv().is_ok());
        // the flush request, then the final sync
        assert_eq!(*writer.syncs.lock().unwrap(), 2);
    }

    #[test]
    fn test_flush_waits_for_pending_records() {
        let writer = MemoryWriter::default();
        let sender = spawn_sink_thread(
            "memory",
            writer.clone(),
            Encoder::new(Format::Json, FixedOffset::east_opt(0).unwrap()),
        )
        .unwrap();
        for i in 0..50 {
            sender.send(Arc::new(Record::new(Level::Debug, format!("msg{i}"), vec![])));
        }
        sender.flush();
        assert_eq!(writer.lines.lock().unwrap().len(), 50);
        sender.shutdown();
        sender.shutdown();
    }
}
