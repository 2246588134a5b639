use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while building a [`Logger`](crate::Logger).
#[derive(Debug, Error)]
pub enum Error {
    /// A channel's log file could not be opened.
    #[error("unable to open {channel} log file {}: {source}", .path.display())]
    OpenLog {
        channel: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A channel's writer thread could not be spawned.
    #[error("unable to start {channel} sink: {source}")]
    Spawn {
        channel: &'static str,
        #[source]
        source: io::Error,
    },
}
