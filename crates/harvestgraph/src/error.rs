//! Error types for harvestgraph.

use crate::exit_codes::ExitCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harvestgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type. Every variant maps to a stable process exit code,
/// see [`crate::exit_codes`].
#[derive(Debug, Error)]
pub enum Error {
    /// No log directory was supplied and the default location holds no live
    /// log. Recoverable by the user: point the tool at the right directory.
    #[error("no harvester log found under '{}'; pass the log directory as an argument", .0.display())]
    NoLogDir(PathBuf),

    /// The file-system watcher could not be set up or died.
    #[error("failed to watch log directory: {0}")]
    Watch(#[from] notify::Error),

    /// The watcher's notification channel closed underneath us.
    #[error("log watcher channel closed")]
    WatcherGone,

    /// Unrecoverable I/O failure while reading the live log.
    #[error("fatal I/O error while tailing log: {0}")]
    TailIo(#[source] std::io::Error),

    /// stdout is not attached to a terminal.
    #[error("stdout is not a terminal")]
    NotATerminal,

    /// Terminal setup or drawing failed.
    #[error("terminal renderer error: {0}")]
    Render(#[source] std::io::Error),
}

impl Error {
    /// Exit code this error terminates the process with.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::NoLogDir(_) => ExitCode::NoLogDir,
            Error::Watch(_) | Error::WatcherGone | Error::TailIo(_) => ExitCode::TailIo,
            Error::NotATerminal | Error::Render(_) => ExitCode::RendererInit,
        }
    }
}
