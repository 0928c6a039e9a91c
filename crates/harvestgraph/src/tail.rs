//! Incremental reader for the rotating harvester log.
//!
//! The harvester appends to `debug.log` and rotates it through a fixed
//! naming scheme (`debug.log.1` .. `debug.log.7`, highest number oldest).
//! Rotation happens without notice, so the reader leans on a file-system
//! watcher scoped to the log directory:
//!
//! - *created* for the live name: the old handle is stale; reopen from the
//!   start and drain everything.
//! - *modified* for the live name: drain from the current position.
//! - *deleted*: log it and wait; a *created* follows when rotation finishes.
//!
//! At startup, [`LogTailer::replay`] drains the rotated generations oldest
//! first, then the live file, rebuilding the whole window before any live
//! following begins. Lines are always consumed whole and in file order; a
//! partial line at the end of the live file is carried over and completed on
//! the next drain.

use crate::error::{Error, Result};
use crate::event;
use crate::window::{Insert, Window};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Name of the live log file inside the monitored directory.
pub const LIVE_LOG_NAME: &str = "debug.log";

/// Rotated generations drained at startup, `debug.log.1` .. `debug.log.N`.
pub const ROTATED_GENERATIONS: u32 = 7;

/// Upper bound on one wait for log activity; sets the main loop tick rate.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

enum TailState {
    Closed,
    Reading(BufReader<File>),
}

/// Tails the harvester log directory and feeds parsed events into a window.
pub struct LogTailer {
    dir: PathBuf,
    state: TailState,
    /// Unterminated tail of the last read, waiting for its newline.
    partial: String,
    rx: Receiver<notify::Result<notify::Event>>,
    // Dropping the watcher stops the notification stream.
    _watcher: RecommendedWatcher,
}

impl LogTailer {
    /// Start watching `dir`. The tailer begins `Closed`; call
    /// [`LogTailer::replay`] to drain history and open the live log.
    pub fn new(dir: PathBuf) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(Self {
            dir,
            state: TailState::Closed,
            partial: String::new(),
            rx,
            _watcher: watcher,
        })
    }

    /// Drain all retained log generations, oldest first, then the live file.
    /// Missing or unreadable generations are skipped. Returns the number of
    /// lines consumed.
    pub fn replay(&mut self, window: &mut Window) -> Result<usize> {
        let mut lines = 0;
        for generation in (1..=ROTATED_GENERATIONS).rev() {
            let name = format!("{LIVE_LOG_NAME}.{generation}");
            // Rotated files are closed; flush an unterminated final line.
            lines += self.drain_one(&name, window, true)?;
        }
        // The live file stays open for following; its last line may still be
        // in flight, so no flush.
        lines += self.drain_one(LIVE_LOG_NAME, window, false)?;
        Ok(lines)
    }

    fn drain_one(&mut self, name: &str, window: &mut Window, flush: bool) -> Result<usize> {
        match self.open(name) {
            Ok(()) => {
                let lines = self.drain(window, flush)?;
                debug!(file = name, lines, "drained log generation");
                Ok(lines)
            }
            Err(err) => {
                debug!(file = name, %err, "skipping unreadable log generation");
                Ok(0)
            }
        }
    }

    /// Close any existing handle and open `<dir>/<name>` from the start.
    /// On failure the state is `Closed` and the caller decides when to retry
    /// (usually: wait for a *created* notification).
    fn open(&mut self, name: &str) -> std::io::Result<()> {
        self.state = TailState::Closed;
        self.partial.clear();
        let file = File::open(self.dir.join(name))?;
        self.state = TailState::Reading(BufReader::new(file));
        Ok(())
    }

    /// Read complete lines until none is immediately available, feeding each
    /// through the parser into the window. With `flush`, an unterminated
    /// final line is consumed too (the file is known closed).
    fn drain(&mut self, window: &mut Window, flush: bool) -> Result<usize> {
        let TailState::Reading(reader) = &mut self.state else {
            return Ok(0);
        };
        let mut lines = 0;
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = reader.read_line(&mut buf).map_err(Error::TailIo)?;
            if n == 0 {
                if flush && !self.partial.is_empty() {
                    ingest(&self.partial, window);
                    self.partial.clear();
                    lines += 1;
                }
                return Ok(lines);
            }
            if buf.ends_with('\n') {
                if self.partial.is_empty() {
                    ingest(&buf, window);
                } else {
                    self.partial.push_str(&buf);
                    ingest(&self.partial, window);
                    self.partial.clear();
                }
                lines += 1;
            } else {
                // Writer is mid-line; keep the fragment for the next drain.
                self.partial.push_str(&buf);
            }
        }
    }

    /// Wait up to [`POLL_TIMEOUT`] for log activity and react to it.
    /// Returns the number of lines consumed; 0 on a quiet tick.
    ///
    /// Watcher failures and live-file I/O errors are fatal: the process has
    /// no way to re-establish a consistent position in the log.
    pub fn poll(&mut self, window: &mut Window) -> Result<usize> {
        let fs_event = match self.rx.recv_timeout(POLL_TIMEOUT) {
            Ok(Ok(ev)) => ev,
            Ok(Err(err)) => return Err(Error::Watch(err)),
            Err(RecvTimeoutError::Timeout) => return Ok(0),
            Err(RecvTimeoutError::Disconnected) => return Err(Error::WatcherGone),
        };
        let live = OsStr::new(LIVE_LOG_NAME);
        if !fs_event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(live))
        {
            return Ok(0);
        }
        match fs_event.kind {
            EventKind::Create(_) => {
                info!("log rotated, reopening live file");
                if let Err(err) = self.open(LIVE_LOG_NAME) {
                    warn!(%err, "freshly created log not yet readable");
                    return Ok(0);
                }
                self.drain(window, false)
            }
            EventKind::Modify(_) => self.drain(window, false),
            EventKind::Remove(_) => {
                debug!("live log deleted, awaiting recreation");
                Ok(0)
            }
            _ => Ok(0),
        }
    }
}

fn ingest(line: &str, window: &mut Window) {
    let Some(ev) = event::parse_line(line) else {
        return;
    };
    match window.insert(ev) {
        Insert::Recorded => {}
        Insert::Duplicate => trace!(stamp = ev.stamp, "duplicate check stamp rejected"),
        Insert::TooOld => trace!(stamp = ev.stamp, "check predates window"),
        Insert::BucketFull => warn!(
            stamp = ev.stamp,
            dropped = window.dropped(),
            "bucket at capacity, check dropped"
        ),
    }
}
