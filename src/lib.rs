pub mod app;
pub mod config;
pub mod display;
pub mod pager;
pub mod render;
pub mod retry;
pub mod telemetry;
pub mod timesync;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    InvalidArgs(String),
    Io(std::io::Error),
    Probe(String),
    TimeSync(String),
    Display(String),
    DisplayInit { attempts: u32, last: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Probe(msg) => write!(f, "probe failed: {msg}"),
            Error::TimeSync(msg) => write!(f, "time sync failed: {msg}"),
            Error::Display(msg) => write!(f, "display error: {msg}"),
            Error::DisplayInit { attempts, last } => write!(
                f,
                "display initialization failed after {attempts} attempts: {last}"
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
