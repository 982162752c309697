use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod loader;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/oled-display.conf";
pub const CONFIG_PATH_ENV: &str = "OLEDSTAT_CONFIG";
pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 32;
pub const DEFAULT_SCROLL_SPEED: Duration = Duration::from_millis(100);
pub const DEFAULT_NTP_SERVER: &str = "ntp.ntsc.ac.cn";
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_FONT: &str = "5x8";
pub const DEFAULT_OVERFLOW: Overflow = Overflow::Scroll;
pub const MAX_DIMENSION: u32 = 256;

/// How lines wider than the panel are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Slide the line leftwards one step per frame, re-entering from the right edge.
    Scroll,
    /// Drop trailing characters until the line fits, then center it.
    Truncate,
}

impl std::str::FromStr for Overflow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scroll" => Ok(Overflow::Scroll),
            "truncate" => Ok(Overflow::Truncate),
            other => Err(format!("expected 'scroll' or 'truncate', got '{other}'")),
        }
    }
}

impl std::fmt::Display for Overflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Overflow::Scroll => f.write_str("scroll"),
            Overflow::Truncate => f.write_str("truncate"),
        }
    }
}

/// Settings for the panel and the clock sync. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub scroll_speed: Duration,
    pub ntp_server: String,
    pub sync_timeout: Duration,
    pub font: String,
    pub overflow: Overflow,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            ntp_server: DEFAULT_NTP_SERVER.to_string(),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            font: DEFAULT_FONT.to_string(),
            overflow: DEFAULT_OVERFLOW,
        }
    }
}

/// Result of a load: the fully populated config plus every value that was ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub config: Config,
    pub warnings: Vec<String>,
}

impl Config {
    /// Location of the config file, honoring `OLEDSTAT_CONFIG`.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load_or_default() -> Loaded {
        loader::load_from_path(&Self::path())
    }

    pub fn load_from_path(path: &Path) -> Loaded {
        loader::load_from_path(path)
    }

    pub fn parse(raw: &str) -> Loaded {
        loader::parse(raw)
    }
}

fn parse_seconds(raw: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("expected seconds, got '{raw}'"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("must be a positive number of seconds, got '{raw}'"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn parse_dimension(raw: &str) -> std::result::Result<u32, String> {
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("expected pixel count, got '{raw}'"))?;
    if value == 0 || value > MAX_DIMENSION {
        return Err(format!("must be within 1..={MAX_DIMENSION}, got {value}"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.width, 128);
        assert_eq!(cfg.height, 32);
        assert_eq!(cfg.scroll_speed, Duration::from_millis(100));
        assert_eq!(cfg.ntp_server, "ntp.ntsc.ac.cn");
        assert_eq!(cfg.sync_timeout, Duration::from_secs(3));
        assert_eq!(cfg.overflow, Overflow::Scroll);
    }

    #[test]
    fn overflow_parses_case_insensitively() {
        assert_eq!("Truncate".parse::<Overflow>(), Ok(Overflow::Truncate));
        assert_eq!("scroll".parse::<Overflow>(), Ok(Overflow::Scroll));
        assert!("wrap".parse::<Overflow>().is_err());
    }

    #[test]
    fn seconds_accept_fractions() {
        assert_eq!(parse_seconds("0.25").unwrap(), Duration::from_millis(250));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("fast").is_err());
    }

    #[test]
    fn dimensions_reject_zero_and_huge() {
        assert_eq!(parse_dimension("64").unwrap(), 64);
        assert!(parse_dimension("0").is_err());
        assert!(parse_dimension("4096").is_err());
    }
}
