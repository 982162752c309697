use std::time::Duration;

use crate::{
    app::Logger,
    render::Frame,
    retry::{RetryPolicy, Sleeper},
    Error, Result,
};

pub mod oled;

pub use oled::Ssd1306Panel;

/// I2C bus the panel hangs off (`/dev/i2c-1`).
pub const I2C_BUS: u8 = 1;
/// SSD1306 7-bit address.
pub const I2C_ADDR: u8 = 0x3C;
pub const INIT_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(2));

/// Minimal panel surface so the hardware can be swapped out in tests.
pub trait PanelDriver {
    fn show(&mut self, frame: &Frame) -> Result<()>;
    fn blank(&mut self) -> Result<()>;
}

/// Sole owner of the panel. Nothing else touches the bus.
pub struct Display<P: PanelDriver> {
    panel: P,
    width: u32,
    height: u32,
}

impl<P: PanelDriver> Display<P> {
    /// Open the panel with `open`, retrying per `policy`. Exhaustion is fatal.
    pub fn connect<F, S>(
        width: u32,
        height: u32,
        policy: &RetryPolicy,
        sleeper: &mut S,
        logger: &Logger,
        mut open: F,
    ) -> Result<Self>
    where
        F: FnMut() -> Result<P>,
        S: Sleeper + ?Sized,
    {
        let panel = policy
            .run(
                sleeper,
                |_| open(),
                |attempt, err| {
                    logger.warn(format!("display init attempt {attempt} failed: {err}"));
                },
            )
            .map_err(|exhausted| Error::DisplayInit {
                attempts: exhausted.attempts,
                last: exhausted.last_error.to_string(),
            })?;
        logger.info(format!("display ready ({width}x{height})"));
        Ok(Self {
            panel,
            width,
            height,
        })
    }

    pub fn display(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::Display(format!(
                "frame is {}x{}, panel is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        self.panel.show(frame)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.panel.blank()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}
