//! Rotating file sink
//!
//! Records are formatted on the calling thread and handed to a single
//! background worker that appends them in submission order, so callers never
//! wait on disk I/O. The worker rotates the file by size before each write,
//! keeping `app.log.1 ..= app.log.N` with `.1` the most recent backup.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use super::traits::{render_error_chain, ErrorPayload, LogSink, SinkError, SinkResult};
use crate::level::Level;

/// Default rotation threshold (5 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Default number of backup generations
pub const DEFAULT_BACKUP_COUNT: u32 = 3;
/// Default base file name
pub const DEFAULT_FILE_NAME: &str = "app.log";

const LEVEL_WIDTH: usize = 7;
const TAG_WIDTH: usize = 24;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Rotation settings of a [`FileSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkOptions {
    /// Rotate once the active file reaches this many bytes
    pub max_bytes: u64,
    /// Number of backups to keep; `0` truncates the active file instead
    pub backup_count: u32,
    /// Name of the active file inside the log directory
    pub file_name: String,
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

/// Work items for the background writer
enum Command {
    Write(String),
    Flush(FlushAck),
}

/// Reply channel of a flush request
///
/// Blocking callers wait on a std channel so the wait is valid on any thread,
/// including tokio runtime threads; async callers await a oneshot.
enum FlushAck {
    Blocking(std_mpsc::SyncSender<()>),
    Async(oneshot::Sender<()>),
}

impl FlushAck {
    fn complete(self) {
        match self {
            FlushAck::Blocking(done) => {
                let _ = done.send(());
            }
            FlushAck::Async(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// A sink that appends to a size-rotated file in a private log directory
///
/// # Example
///
/// ```no_run
/// use techwizards_log::sinks::{FileSink, LogSink};
/// use techwizards_log::Level;
///
/// let sink = FileSink::new("/tmp/techwizards/logs").unwrap();
/// sink.emit(Level::Info, "Partida", "nueva partida", None).unwrap();
/// sink.flush().unwrap();
/// ```
pub struct FileSink {
    dir: PathBuf,
    path: PathBuf,
    options: FileSinkOptions,
    sender: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<()>>,
    failed_writes: Arc<AtomicU64>,
}

impl FileSink {
    /// Create a file sink with default rotation settings
    pub fn new(dir: impl Into<PathBuf>) -> SinkResult<Self> {
        Self::with_options(dir, FileSinkOptions::default())
    }

    /// Create a file sink, creating `dir` if needed and starting the writer
    pub fn with_options(dir: impl Into<PathBuf>, options: FileSinkOptions) -> SinkResult<Self> {
        if options.file_name.trim().is_empty() {
            return Err(SinkError::Other("log file name must not be empty".to_string()));
        }

        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = dir.join(&options.file_name);

        let failed_writes = Arc::new(AtomicU64::new(0));
        let writer = RotatingWriter {
            dir: dir.clone(),
            path: path.clone(),
            options: options.clone(),
            file: None,
            failed_writes: Arc::clone(&failed_writes),
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = std::thread::Builder::new()
            .name("techwizards-log-file".to_string())
            .spawn(move || writer.run(receiver))?;

        Ok(Self {
            dir,
            path,
            options,
            sender: Some(sender),
            worker: Some(worker),
            failed_writes,
        })
    }

    /// Directory holding the active file and its backups
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the active log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotation settings
    pub fn options(&self) -> &FileSinkOptions {
        &self.options
    }

    /// Path of backup generation `n` (`app.log.n`)
    pub fn backup_path(&self, n: u32) -> PathBuf {
        backup_path(&self.dir, &self.options.file_name, n)
    }

    /// Number of lines the background writer failed to persist
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Async counterpart of [`LogSink::flush`]
    pub async fn flush_async(&self) -> SinkResult<()> {
        let (done, wait) = oneshot::channel();
        self.send(Command::Flush(FlushAck::Async(done)))?;
        wait.await.map_err(|_| SinkError::WorkerStopped)
    }

    fn send(&self, command: Command) -> SinkResult<()> {
        self.sender
            .as_ref()
            .ok_or(SinkError::WorkerStopped)?
            .send(command)
            .map_err(|_| SinkError::WorkerStopped)
    }
}

impl LogSink for FileSink {
    fn emit(&self, level: Level, tag: &str, message: &str, error: Option<ErrorPayload<'_>>) -> SinkResult<()> {
        let line = format_line(Local::now().naive_local(), level, tag, message, error);
        self.send(Command::Write(line))
    }

    /// Blocks until every line enqueued before this call is on disk.
    ///
    /// Safe to call from runtime threads (e.g. at the end of `#[tokio::main]`);
    /// the writer runs on its own thread, so the wait cannot deadlock. Async
    /// code that must not block can use [`FileSink::flush_async`].
    fn flush(&self) -> SinkResult<()> {
        let (done, wait) = std_mpsc::sync_channel(1);
        self.send(Command::Flush(FlushAck::Blocking(done)))?;
        wait.recv().map_err(|_| SinkError::WorkerStopped)
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued, then exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("failed_writes", &self.failed_writes())
            .finish()
    }
}

/// Format one file line, newline included
pub fn format_line(
    timestamp: NaiveDateTime,
    level: Level,
    tag: &str,
    message: &str,
    error: Option<ErrorPayload<'_>>,
) -> String {
    let mut line = format!(
        "{} {:<lw$} {:<tw$.tw$} | {}",
        timestamp.format(TIMESTAMP_FORMAT),
        level,
        tag,
        message,
        lw = LEVEL_WIDTH,
        tw = TAG_WIDTH,
    );
    if let Some(err) = error {
        line.push_str(" | ex=");
        line.push_str(&render_error_chain(err));
    }
    line.push('\n');
    line
}

fn backup_path(dir: &Path, file_name: &str, n: u32) -> PathBuf {
    dir.join(format!("{}.{}", file_name, n))
}

/// State owned by the background writer thread
struct RotatingWriter {
    dir: PathBuf,
    path: PathBuf,
    options: FileSinkOptions,
    file: Option<File>,
    failed_writes: Arc<AtomicU64>,
}

impl RotatingWriter {
    fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.blocking_recv() {
            match command {
                Command::Write(line) => {
                    if self.write_line(&line).is_err() {
                        self.failed_writes.fetch_add(1, Ordering::Relaxed);
                        // Reopen on the next write
                        self.file = None;
                    }
                }
                Command::Flush(done) => {
                    if let Some(file) = self.file.as_mut() {
                        let _ = file.sync_data();
                    }
                    done.complete();
                }
            }
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.rotate_if_needed()?;
        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new().create(true).append(true).open(&self.path)?,
        };
        self.file.insert(file).write_all(line.as_bytes())
    }

    fn current_size(&self) -> io::Result<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn rotate_if_needed(&mut self) -> io::Result<()> {
        if self.current_size()? < self.options.max_bytes {
            return Ok(());
        }

        // Close the handle before renaming underneath it
        self.file = None;

        let backups = self.options.backup_count;
        if backups > 0 {
            let oldest = self.backup(backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for i in (1..backups).rev() {
                let src = self.backup(i);
                if src.exists() {
                    fs::rename(&src, self.backup(i + 1))?;
                }
            }
            if self.path.exists() {
                fs::rename(&self.path, self.backup(1))?;
            }
        }

        self.file = Some(File::create(&self.path)?);
        Ok(())
    }

    fn backup(&self, n: u32) -> PathBuf {
        backup_path(&self.dir, &self.options.file_name, n)
    }
}
