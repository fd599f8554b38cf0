//! Rotating file logger for access and service events.
//!
//! Lines are appended to `<dir>/<YYYY-MM-DD>/log_<YYYY-MM-DD>_<HH-MM>.log`, where
//! `HH-MM` is the start of the current rotation window counted from local midnight.
//! A file is opened lazily by the first write that falls into its window; the
//! previous file is flushed and closed at the same moment.
//!
//! All state lives behind a single mutex so line order and rotation stay
//! consistent across concurrent requests. If the file cannot be opened or written,
//! the line goes to stderr instead of being dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Timelike};

use crate::config::LoggingConfig;

pub const DEFAULT_ROTATION_MINUTES: u32 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 4096;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// 5xx → error, 4xx → warn, everything else → info.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Level::Error
        } else if status >= 400 {
            Level::Warn
        } else {
            Level::Info
        }
    }
}

/// One rotation window of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub day: String,
    pub time: String,
}

impl Bucket {
    pub fn for_time(now: &DateTime<Local>, window_minutes: u32) -> Self {
        let window = window_minutes.clamp(1, 1440);
        let minute_of_day = now.hour() * 60 + now.minute();
        let start = minute_of_day - minute_of_day % window;
        Self {
            day: now.format("%Y-%m-%d").to_string(),
            time: format!("{:02}-{:02}", start / 60, start % 60),
        }
    }

    pub fn id(&self) -> String {
        format!("{}_{}", self.day, self.time)
    }

    pub fn path(&self, base: &Path) -> PathBuf {
        base.join(&self.day).join(format!("log_{}.log", self.id()))
    }
}

struct OpenFile {
    bucket: Bucket,
    path: PathBuf,
    writer: BufWriter<File>,
}

struct LoggerInner {
    dir: PathBuf,
    window_minutes: u32,
    current: Mutex<Option<OpenFile>>,
}

/// Handle to the process-wide log writer. Cloning shares the same file state.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub fn new(dir: impl Into<PathBuf>, window_minutes: u32) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                dir: dir.into(),
                window_minutes: window_minutes.clamp(1, 1440),
                current: Mutex::new(None),
            }),
        }
    }

    pub fn from_config(cfg: &LoggingConfig) -> Self {
        Self::new(cfg.dir.clone(), cfg.rotation_minutes)
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    pub fn info(&self, module: &str, message: impl AsRef<str>) {
        self.log(Level::Info, module, message.as_ref());
    }

    pub fn warn(&self, module: &str, message: impl AsRef<str>) {
        self.log(Level::Warn, module, message.as_ref());
    }

    pub fn error(&self, module: &str, message: impl AsRef<str>) {
        self.log(Level::Error, module, message.as_ref());
    }

    pub fn log(&self, level: Level, module: &str, message: &str) {
        self.log_at(Local::now(), level, module, message);
    }

    /// Writes one line stamped with `now`, rotating first if `now` belongs to a
    /// different bucket than the open file.
    pub fn log_at(&self, now: DateTime<Local>, level: Level, module: &str, message: &str) {
        let line = format_line(&now, module, level, message);
        let bucket = Bucket::for_time(&now, self.inner.window_minutes);

        let mut current = self.lock();
        if let Err(e) = self.write_locked(&mut current, bucket, &line) {
            // Drop the handle so the next write retries the open.
            *current = None;
            eprint!("logger error: {} | {}", e, line);
        }
    }

    /// Path of the file currently open, if any.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|open| open.path.clone())
    }

    /// Flushes and releases the open file. Later writes reopen lazily.
    pub fn close(&self) {
        let mut current = self.lock();
        if let Some(mut open) = current.take() {
            if let Err(e) = open.writer.flush() {
                eprintln!("logger error: flush on close failed for {}: {}", open.path.display(), e);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<OpenFile>> {
        self.inner.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_locked(&self, current: &mut Option<OpenFile>, bucket: Bucket, line: &str) -> io::Result<()> {
        let needs_open = match current.as_ref() {
            Some(open) => open.bucket != bucket,
            None => true,
        };
        if needs_open {
            if let Some(mut old) = current.take() {
                let _ = old.writer.flush();
            }
            let path = bucket.path(&self.inner.dir);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            *current = Some(OpenFile { bucket, path, writer: BufWriter::new(file) });
        }

        let open = current
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        open.writer.write_all(line.as_bytes())?;
        open.writer.flush()
    }
}

/// `<YYYY-MM-DD HH:MM:SS.mmm> [<module>] [<level>] <message>\n`, with any line
/// breaks inside `message` flattened to spaces.
pub fn format_line(now: &DateTime<Local>, module: &str, level: Level, message: &str) -> String {
    format!(
        "{} [{}] [{}] {}\n",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        module,
        level.as_str(),
        strip_newlines(message)
    )
}

/// Module name for a route: its first non-empty segment, or `api` for the root.
pub fn module_from_route(route: &str) -> &str {
    route.trim_matches('/').split('/').next().filter(|s| !s.is_empty()).unwrap_or("api")
}

/// Flattens newlines and truncates to `limit` bytes, appending `...` when cut.
pub fn sanitize(text: &str, limit: usize) -> String {
    let flat = strip_newlines(text);
    if flat.len() <= limit {
        return flat;
    }
    let mut cut = limit;
    while !flat.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + ELLIPSIS.len());
    out.push_str(&flat[..cut]);
    out.push_str(ELLIPSIS);
    out
}

/// Like [`sanitize`] for raw body bytes; invalid UTF-8 is replaced lossily.
pub fn sanitize_bytes(bytes: &[u8], limit: usize) -> String {
    let keep = bytes.len().min(limit);
    let mut out = strip_newlines(&String::from_utf8_lossy(&bytes[..keep]));
    if bytes.len() > limit {
        out.push_str(ELLIPSIS);
    }
    out
}

fn strip_newlines(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}
