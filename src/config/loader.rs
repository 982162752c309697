use std::{fs, path::Path};

use super::{parse_dimension, parse_seconds, Config, Loaded, Overflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Display,
    Time,
    Other,
}

/// Read the config file. A missing file is not an error; an unreadable one yields
/// defaults plus a warning.
pub fn load_from_path(path: &Path) -> Loaded {
    if !path.exists() {
        return Loaded {
            config: Config::default(),
            warnings: Vec::new(),
        };
    }

    match fs::read_to_string(path) {
        Ok(raw) => parse(&raw),
        Err(err) => Loaded {
            config: Config::default(),
            warnings: vec![format!(
                "config load failed ({}): {err}; using defaults",
                path.display()
            )],
        },
    }
}

/// Parse INI-style text. Each field falls back to its default on its own.
pub fn parse(raw: &str) -> Loaded {
    let mut cfg = Config::default();
    let mut warnings = Vec::new();
    let mut section = Section::None;

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(name) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            section = match name.trim().to_ascii_uppercase().as_str() {
                "DISPLAY" => Section::Display,
                "TIME" => Section::Time,
                other => {
                    warnings.push(format!("ignoring unknown section [{other}] on line {line_no}"));
                    Section::Other
                }
            };
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=').or_else(|| trimmed.split_once(':')) else {
            warnings.push(format!("invalid config line {line_no}: '{line}'"));
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().trim_matches('"').trim_matches('\'');

        let outcome = match (section, key.as_str()) {
            (Section::Display, "width") => parse_dimension(value).map(|v| cfg.width = v),
            (Section::Display, "height") => parse_dimension(value).map(|v| cfg.height = v),
            (Section::Display, "scroll_speed") => {
                parse_seconds(value).map(|v| cfg.scroll_speed = v)
            }
            (Section::Display, "font") => {
                if value.is_empty() {
                    Err("font name must not be empty".to_string())
                } else {
                    cfg.font = value.to_string();
                    Ok(())
                }
            }
            (Section::Display, "overflow") => {
                value.parse::<Overflow>().map(|v| cfg.overflow = v)
            }
            (Section::Time, "ntp_server") => {
                if value.is_empty() {
                    Err("ntp_server must not be empty".to_string())
                } else {
                    cfg.ntp_server = value.to_string();
                    Ok(())
                }
            }
            (Section::Time, "timeout") => parse_seconds(value).map(|v| cfg.sync_timeout = v),
            (Section::Other, _) => Ok(()),
            (Section::None, other) => Err(format!("key '{other}' outside of any section")),
            (_, other) => Err(format!("unknown config key '{other}'")),
        };

        if let Err(reason) = outcome {
            warnings.push(format!("line {line_no}: {reason}; keeping default"));
        }
    }

    Loaded {
        config: cfg,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_HEIGHT, DEFAULT_NTP_SERVER, DEFAULT_WIDTH};
    use std::{fs, time::Duration};

    #[test]
    fn loads_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("absent.conf"));
        assert_eq!(loaded.config, Config::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn empty_source_yields_defaults() {
        let loaded = parse("");
        assert_eq!(loaded.config, Config::default());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn parses_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oled-display.conf");
        let contents = r#"
            # panel geometry
            [DISPLAY]
            width = 128
            height = 64
            scroll_speed = 0.25
            font = 6x10
            overflow = truncate

            [TIME]
            ntp_server = "pool.ntp.org"
            timeout = 5
        "#;
        fs::write(&path, contents).unwrap();
        let loaded = load_from_path(&path);
        let cfg = loaded.config;
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
        assert_eq!(cfg.width, 128);
        assert_eq!(cfg.height, 64);
        assert_eq!(cfg.scroll_speed, Duration::from_millis(250));
        assert_eq!(cfg.font, "6x10");
        assert_eq!(cfg.overflow, Overflow::Truncate);
        assert_eq!(cfg.ntp_server, "pool.ntp.org");
        assert_eq!(cfg.sync_timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_fields_fall_back_individually() {
        let loaded = parse(
            "[DISPLAY]\nwidth = wide\nheight = 64\n[TIME]\ntimeout = -3\nntp_server = time.example\n",
        );
        assert_eq!(loaded.config.width, DEFAULT_WIDTH);
        assert_eq!(loaded.config.height, 64);
        assert_eq!(loaded.config.sync_timeout, Duration::from_secs(3));
        assert_eq!(loaded.config.ntp_server, "time.example");
        assert_eq!(loaded.warnings.len(), 2);
    }

    #[test]
    fn keys_in_wrong_section_are_ignored() {
        let loaded = parse("[TIME]\nwidth = 64\n[DISPLAY]\nntp_server = x\n");
        assert_eq!(loaded.config.width, DEFAULT_WIDTH);
        assert_eq!(loaded.config.ntp_server, DEFAULT_NTP_SERVER);
        assert_eq!(loaded.warnings.len(), 2);
        assert!(loaded.warnings[0].contains("unknown config key"));
    }

    #[test]
    fn unknown_sections_are_skipped_whole() {
        let loaded = parse("[NETWORK]\nwidth = 12\n[DISPLAY]\nheight = 16\n");
        assert_eq!(loaded.config.width, DEFAULT_WIDTH);
        assert_eq!(loaded.config.height, 16);
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn garbage_lines_do_not_abort_the_load() {
        let loaded = parse("this is not ini\n[DISPLAY]\nheight = 48\n");
        assert_eq!(loaded.config.height, 48);
        assert_ne!(loaded.config.height, DEFAULT_HEIGHT);
        assert!(loaded.warnings[0].contains("invalid config line 1"));
    }

    #[test]
    fn colon_separator_and_lowercase_sections_are_accepted() {
        let loaded = parse("[display]\nwidth: 96\nheight: 16\n");
        assert_eq!(loaded.config.width, 96);
        assert_eq!(loaded.config.height, 16);
    }
}
