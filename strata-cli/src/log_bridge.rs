use env_logger::Logger;
use log::{Log, Metadata, Record, SetLoggerError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

/// Append-only copy of every emitted log line under the config directory.
struct CliLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl CliLogFile {
    fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
            .join("logs")
            .join("cli.log");
        let file = Self::open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append_line(&self, line: &str) {
        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.write_all(b"\n");
            let _ = file.flush();
        }
    }
}

static LOG_FILE: LazyLock<CliLogFile> = LazyLock::new(CliLogFile::new);

fn timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn format_log_line(level: &str, target: &str, message: &str) -> String {
    format!(
        "{} [{}] [{}] {}",
        timestamp_ms(),
        level.to_uppercase(),
        target,
        message.replace('\n', "\\n")
    )
}

/// env_logger on stderr, mirrored into the log file.
struct MirrorLogger {
    inner: Logger,
}

impl Log for MirrorLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.inner.log(record);
        LOG_FILE.append_line(&format_log_line(
            record.level().as_str(),
            record.target(),
            &record.args().to_string(),
        ));
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the logger. Filter comes from RUST_LOG, defaulting to "warn".
pub fn init() -> Result<(), SetLoggerError> {
    let builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .build();
    let max_level = builder.filter();
    let logger = Box::leak(Box::new(MirrorLogger { inner: builder }));
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn log_file_path() -> String {
    LOG_FILE.path.display().to_string()
}

pub fn write_fallback_line(message: &str) {
    let line = format_log_line("error", "strata.cli.log_bridge", message);
    eprintln!("{}", line);
    LOG_FILE.append_line(&line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log_line_escapes_newlines() {
        let line = format_log_line("warn", "strata.store", "a\nb");
        assert!(line.contains("[WARN] [strata.store] a\\nb"));
    }
}
