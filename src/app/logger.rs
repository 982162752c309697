use std::io::Write;
use std::str::FromStr;
use std::time::SystemTime;

pub const DEFAULT_LOG_PATH: &str = "/tmp/oled-display.log";
pub const LOG_LEVEL_ENV: &str = "OLEDSTAT_LOG_LEVEL";
pub const LOG_PATH_ENV: &str = "OLEDSTAT_LOG_PATH";

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

/// Stderr plus append-only file logger. Write failures are dropped.
pub struct Logger {
    level: LogLevel,
    stderr: bool,
    file: Option<std::fs::File>,
}

impl Logger {
    /// `OLEDSTAT_LOG_LEVEL` / `OLEDSTAT_LOG_PATH` override the arguments.
    pub fn new(level: LogLevel, file_path: Option<String>) -> Self {
        let env_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok());
        let effective_level = env_level.unwrap_or(level);

        let path = std::env::var(LOG_PATH_ENV)
            .ok()
            .or(file_path)
            .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string());
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok();
        Self {
            level: effective_level,
            stderr: true,
            file,
        }
    }

    /// Logger with no sinks, for tests and tools.
    pub fn silent() -> Self {
        Self {
            level: LogLevel::Error,
            stderr: false,
            file: None,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn log(&self, level: LogLevel, msg: impl AsRef<str>) {
        if level > self.level || (!self.stderr && self.file.is_none()) {
            return;
        }
        let line = format_line(SystemTime::now(), level, msg.as_ref());
        if self.stderr {
            eprintln!("{line}");
        }
        if let Some(file) = self.file.as_ref() {
            if let Ok(mut clone) = file.try_clone() {
                let _ = writeln!(clone, "{line}");
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn trace(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Trace, msg);
    }
}

/// `<timestamp>: [LEVEL] message`
pub fn format_line(at: SystemTime, level: LogLevel, msg: &str) -> String {
    format!(
        "{}: [{}] {msg}",
        humantime::format_rfc3339_seconds(at),
        level.as_str()
    )
}

/// An error and every `source()` below it, one per line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        out.push_str(&format!("\n  caused by: {inner}"));
        cause = inner.source();
    }
    out
}
