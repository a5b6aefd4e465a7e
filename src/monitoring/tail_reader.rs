//! Incremental reader for a growing log file
//!
//! The reader keeps a byte cursor into the monitored file:
//! - at start the cursor jumps to end-of-file, so existing content is never replayed
//! - every poll yields the complete lines appended since the last poll
//! - a trailing line without terminator stays unconsumed until it is completed
//! - truncation (size below cursor) or an explicit replace mark resets the cursor to 0
//!
//! Polling is cooperative: when nothing new arrived the run loop sleeps for the
//! configured interval, and a `watch` shutdown signal stops it.

use crate::utils::AppError;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Upper bound of bytes consumed by a single poll
const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Tail reader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    NotStarted,
    Following,
    FileMissing,
    Stopped,
}

/// One complete line read from the monitored file
#[derive(Debug, Clone)]
pub struct LogLine {
    /// Line text without terminator
    pub text: String,
    /// Sequence number since the reader started (1-based)
    pub position: u64,
    /// Byte offset of the line start in the file
    pub offset: u64,
    pub seen_at: DateTime<Utc>,
}

/// Hand-off between the upload path and the tail reader.
///
/// Replacing the file and raising the mark happen under the same lock a poll
/// holds, so a poll sees either the old file or the new file already marked.
#[derive(Debug, Clone, Default)]
pub struct ReplaceSignal {
    replaced: Arc<AtomicBool>,
    file_lock: Arc<Mutex<()>>,
}

impl ReplaceSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `path` with `contents` and mark it replaced; the next poll restarts from offset 0
    pub fn replace_contents(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let _guard = lock_file(&self.file_lock);
        let result = fs::write(path, contents);
        // Even a partial write invalidates the cursor
        self.replaced.store(true, Ordering::SeqCst);
        result
    }

    /// Consume the mark
    fn take(&self) -> bool {
        self.replaced.swap(false, Ordering::SeqCst)
    }
}

fn lock_file(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tail reader over a single file
pub struct TailReader {
    path: PathBuf,
    cursor: u64,
    state: TailState,
    lines_read: u64,
    poll_interval: Duration,
    replaced: ReplaceSignal,
}

impl TailReader {
    pub fn new(path: impl Into<PathBuf>, poll_interval: Duration, replaced: ReplaceSignal) -> Self {
        Self {
            path: path.into(),
            cursor: 0,
            state: TailState::NotStarted,
            lines_read: 0,
            poll_interval,
            replaced,
        }
    }

    /// Position the cursor at end-of-file, or report the file missing
    pub fn start(&mut self) -> TailState {
        if self.state != TailState::NotStarted {
            return self.state;
        }

        let file_lock = Arc::clone(&self.replaced.file_lock);
        let _guard = lock_file(&file_lock);

        match fs::metadata(&self.path) {
            Ok(meta) => {
                self.cursor = meta.len();
                self.state = TailState::Following;
                // A replace mark raised before start refers to content we skip anyway
                self.replaced.take();
                info!(
                    log_file = %self.path.display(),
                    cursor = self.cursor,
                    "Tail reader following log file"
                );
            }
            Err(e) => {
                self.state = TailState::FileMissing;
                error!(
                    error = %e,
                    log_file = %self.path.display(),
                    "Log file not found, tail reader will not start"
                );
            }
        }
        self.state
    }

    /// Read every complete line appended since the last poll
    pub fn poll(&mut self) -> io::Result<Vec<LogLine>> {
        if self.state != TailState::Following {
            return Ok(Vec::new());
        }

        let file_lock = Arc::clone(&self.replaced.file_lock);
        let _guard = lock_file(&file_lock);

        if self.replaced.take() {
            info!(previous_cursor = self.cursor, "Log file replaced, restarting from the beginning");
            self.cursor = 0;
        }

        let len = fs::metadata(&self.path)?.len();
        if len < self.cursor {
            info!(
                previous_cursor = self.cursor,
                current_len = len,
                "Log file appears to have been truncated, resetting cursor"
            );
            self.cursor = 0;
        }

        if len == self.cursor {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.cursor))?;

        let mut buf = Vec::new();
        file.take(MAX_READ_BYTES).read_to_end(&mut buf)?;

        let lines = self.split_complete_lines(&buf);
        if !lines.is_empty() {
            debug!(count = lines.len(), cursor = self.cursor, "Read new log lines");
        }
        Ok(lines)
    }

    /// Split `buf` (read from the cursor) into complete lines and advance the cursor
    fn split_complete_lines(&mut self, buf: &[u8]) -> Vec<LogLine> {
        let mut lines = Vec::new();
        let mut start = 0usize;

        while let Some(rel) = buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + rel;
            self.push_line(&mut lines, &buf[start..end], start as u64);
            start = end + 1;
        }

        // A full chunk without any terminator is a single oversized line
        if start == 0 && buf.len() as u64 >= MAX_READ_BYTES {
            warn!(bytes = buf.len(), "Oversized log line without terminator, forcing it through");
            self.push_line(&mut lines, buf, 0);
            start = buf.len();
        }

        self.cursor += start as u64;
        lines
    }

    fn push_line(&mut self, lines: &mut Vec<LogLine>, raw: &[u8], rel_offset: u64) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        self.lines_read += 1;
        lines.push(LogLine {
            text: String::from_utf8_lossy(raw).into_owned(),
            position: self.lines_read,
            offset: self.cursor + rel_offset,
            seen_at: Utc::now(),
        });
    }

    /// Follow the file until shutdown, sending every new line to `tx`.
    /// Returns the final state: `FileMissing` when the file was absent at start,
    /// `Stopped` otherwise.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<LogLine>,
        mut shutdown: watch::Receiver<bool>,
    ) -> TailState {
        if self.start() == TailState::FileMissing {
            return TailState::FileMissing;
        }

        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Starting tail reader loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.poll() {
                Ok(lines) if !lines.is_empty() => {
                    for line in lines {
                        if tx.send(line).await.is_err() {
                            warn!("Line consumer dropped, stopping tail reader");
                            self.state = TailState::Stopped;
                            return self.state;
                        }
                    }
                    // More data may already be waiting
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, log_file = %self.path.display(), "Failed to poll log file, will retry");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.state = TailState::Stopped;
        info!(log_file = %self.path.display(), "Tail reader stopped");
        self.state
    }
}

/// Last `limit` non-empty lines of `path`, trimmed
pub fn read_last_lines(path: &Path, limit: usize) -> Result<Vec<String>, AppError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            AppError::LogFileNotFound(path.display().to_string())
        } else {
            error!(error = %e, file = %path.display(), "Failed to open log file");
            AppError::InternalError(format!("Failed to open log file: {}", e))
        }
    })?;

    let mut lines = Vec::new();
    for line_result in BufReader::new(file).split(b'\n') {
        let raw = line_result.map_err(|e| {
            error!(error = %e, file = %path.display(), "Failed to read log file");
            AppError::InternalError(format!("Failed to read log file: {}", e))
        })?;
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    let skip = lines.len().saturating_sub(limit);
    Ok(lines.split_off(skip))
}
