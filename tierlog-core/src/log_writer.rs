use std::io::{self, Write};

/// Destination of encoded lines. Implementations are driven by a single sink
/// thread and need no internal locking.
pub trait LogWriter {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// Flushes and makes the written data durable.
    fn sync(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Writes lines to standard output, flushing each one.
#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

#[test]
fn test_log_stdout() {
    let mut log_stdout = LogStdout;
    log_stdout.write_line("Hello, world!").unwrap();
    log_stdout.write_line("rust is awesome !").unwrap();
    log_stdout.sync().unwrap();
}
