use std::time::Instant;

use crate::{
    config::Config,
    display::{oled, Display, Ssd1306Panel, I2C_ADDR, I2C_BUS, INIT_RETRY},
    render::{font, Renderer},
    retry::ThreadSleeper,
    telemetry::Collector,
    timesync::TimeSync,
    Error, Result,
};

mod lifecycle;
mod logger;
mod schedule;
mod status_loop;

pub use lifecycle::blank_on_exit;
pub use logger::{error_chain, format_line, LogLevel, Logger};
pub use schedule::Periodic;
pub use status_loop::{StatusLoop, PAGE_INTERVAL, REFRESH_INTERVAL, TICK};

pub struct App {
    config: Config,
    logger: Logger,
}

impl App {
    pub fn new(config: Config, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Config from `OLEDSTAT_CONFIG` or `/etc/oled-display.conf`, logger from the
    /// environment.
    pub fn from_env() -> Self {
        let logger = Logger::new(LogLevel::default(), None);
        let path = Config::path();
        let loaded = Config::load_or_default();
        logger.info(format!("config: {}", path.display()));
        for warning in &loaded.warnings {
            logger.warn(format!("config: {warning}"));
        }
        Self::new(loaded.config, logger)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Entry point for the daemon. Failures are logged here before they are returned.
    pub fn run(&self) -> Result<()> {
        let result = self.start();
        if let Err(err) = &result {
            match err {
                Error::DisplayInit { .. } => {
                    self.logger.error(format!("fatal: {}", error_chain(err)))
                }
                _ => self.logger.error(error_chain(err)),
            }
        }
        result
    }

    fn start(&self) -> Result<()> {
        let config = &self.config;
        if !oled::is_supported(config.width, config.height) {
            return Err(Error::InvalidArgs(format!(
                "unsupported panel geometry {}x{} (supported: {})",
                config.width,
                config.height,
                supported_list()
            )));
        }
        self.logger.info(format!(
            "daemon start (panel={}x{}, font={}, overflow={}, ntp={})",
            config.width, config.height, config.font, config.overflow, config.ntp_server
        ));

        let running = lifecycle::create_shutdown_flag()?;

        let time_sync = TimeSync::from_config(config);
        let sync_status = time_sync.synchronize(&self.logger);

        let display = Display::connect(
            config.width,
            config.height,
            &INIT_RETRY,
            &mut ThreadSleeper,
            &self.logger,
            || Ssd1306Panel::open(I2C_BUS, I2C_ADDR, config.width, config.height),
        )?;

        let font = font::load_font(&config.font, &self.logger);
        let renderer = Renderer::new(font, config.width, config.height, config.overflow);
        if renderer.capacity() == 0 {
            self.logger.warn(format!(
                "font {} is taller than the panel; pages will hold a single clipped line",
                config.font
            ));
        }

        let mut status_loop = StatusLoop::new(
            display,
            Collector::with_default_probes(),
            time_sync,
            renderer,
            sync_status,
            config.scroll_speed,
            Instant::now(),
            &self.logger,
        );
        let result = status_loop.run(&running, &self.logger);
        status_loop.shutdown(&self.logger);
        result
    }
}

fn supported_list() -> String {
    oled::SUPPORTED_GEOMETRIES
        .iter()
        .map(|(w, h)| format!("{w}x{h}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_geometry_fails_before_any_io() {
        let config = Config {
            width: 100,
            height: 20,
            ..Config::default()
        };
        let app = App::new(config, Logger::silent());
        match app.run() {
            Err(Error::InvalidArgs(msg)) => {
                assert!(msg.contains("100x20"));
                assert!(msg.contains("128x32, 128x64, 96x16"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn keeps_the_config_it_was_given() {
        let config = Config {
            ntp_server: "pool.ntp.org".into(),
            ..Config::default()
        };
        let app = App::new(config.clone(), Logger::silent());
        assert_eq!(app.config(), &config);
        assert_eq!(app.logger().level(), LogLevel::Error);
    }
}
