use chrono::Utc;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Prefix of every log file written by [`FileLogger`].
pub const LOG_FILE_PREFIX: &str = "spotter";

/// A logger that writes one line per record to stdout.
pub struct StdoutLogger;

/// A logger that appends to `spotter-YYYY-MM-DD.log` and starts a new file
/// when the UTC date changes.
pub struct FileLogger {
    state: Mutex<FileLoggerState>,
}

struct FileLoggerState {
    dir: PathBuf,
    current_date: String,
    file: File,
}

impl FileLogger {
    /// Create a FileLogger writing into `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let current_date = format_today();
        let file = open_log_file(&dir, &current_date)?;

        Ok(FileLogger {
            state: Mutex::new(FileLoggerState {
                dir,
                current_date,
                file,
            }),
        })
    }
}

fn log_file_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("{LOG_FILE_PREFIX}-{date}.log"))
}

fn open_log_file(dir: &Path, date: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(dir, date))
}

/// Render a record as `timestamp [LEVEL] target file:line - message`.
pub fn format_record(record: &Record) -> String {
    format!(
        "{} [{}] {} {}:{} - {}",
        format_timestamp(),
        record.level(),
        record.target(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{}", format_record(record));
        }
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let today = format_today();
        if today != state.current_date {
            match open_log_file(&state.dir, &today) {
                Ok(file) => {
                    state.file = file;
                    state.current_date = today;
                }
                Err(e) => {
                    // keep writing to the previous day's file
                    eprintln!("failed to roll log file in {:?}: {}", state.dir, e);
                }
            }
        }

        let line = format_record(record);
        if let Err(e) = writeln!(state.file, "{line}") {
            eprintln!("failed to write log file: {e}");
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.file.flush().ok();
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmm`.
pub fn format_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Current UTC date as `YYYY-MM-DD`.
pub fn format_today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn build_max_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install [`StdoutLogger`] as the global logger.
///
/// Debug builds log at Debug, release builds at Info. Only the first
/// logger installed in a process wins; later calls are ignored.
pub fn init_stdout_logger() {
    static LOGGER: StdoutLogger = StdoutLogger;

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(build_max_level());
    }
}

/// Install a [`FileLogger`] writing into `dir` as the global logger.
///
/// Same level rules as [`init_stdout_logger`]. Fails only when the
/// directory or the log file cannot be created.
pub fn init_file_logger(dir: impl Into<PathBuf>) -> std::io::Result<()> {
    let logger = FileLogger::new(dir)?;

    // set_logger needs a 'static reference; the logger lives for the process
    if log::set_logger(Box::leak(Box::new(logger))).is_ok() {
        log::set_max_level(build_max_level());
    }

    Ok(())
}
