//! SSD1306 panel over I2C. Linux only; other targets get a stub that refuses to open.

use super::PanelDriver;
use crate::{render::Frame, Error, Result};

/// Geometries the SSD1306 driver has buffer layouts for.
pub const SUPPORTED_GEOMETRIES: [(u32, u32); 3] = [(128, 32), (128, 64), (96, 16)];

pub fn is_supported(width: u32, height: u32) -> bool {
    SUPPORTED_GEOMETRIES.contains(&(width, height))
}

#[cfg(target_os = "linux")]
mod hw {
    use embedded_hal::i2c::I2c as I2cBus;
    use rppal::i2c::I2c;
    use ssd1306::{
        mode::{BufferedGraphicsMode, DisplayConfig},
        prelude::*,
        size::{DisplaySize, DisplaySize128x32, DisplaySize128x64, DisplaySize96x16},
        I2CDisplayInterface, Ssd1306,
    };

    use crate::{render::Frame, Error, Result};

    type Buffered<SIZE, BUS = I2c> = Ssd1306<I2CInterface<BUS>, SIZE, BufferedGraphicsMode<SIZE>>;

    pub(super) enum Surface {
        Size128x32(Buffered<DisplaySize128x32>),
        Size128x64(Buffered<DisplaySize128x64>),
        Size96x16(Buffered<DisplaySize96x16>),
    }

    fn map_i2c_err(err: rppal::i2c::Error) -> Error {
        Error::Io(std::io::Error::other(err.to_string()))
    }

    fn map_display_err<E: std::fmt::Debug>(err: E) -> Error {
        Error::Display(format!("{err:?}"))
    }

    fn start<SIZE: DisplaySize, BUS: I2cBus>(
        mut display: Buffered<SIZE, BUS>,
    ) -> Result<Buffered<SIZE, BUS>> {
        display.init().map_err(map_display_err)?;
        display.clear_buffer();
        display.flush().map_err(map_display_err)?;
        Ok(display)
    }

    fn push<SIZE: DisplaySize, BUS: I2cBus>(
        display: &mut Buffered<SIZE, BUS>,
        frame: &Frame,
    ) -> Result<()> {
        display.clear_buffer();
        for (x, y) in frame.lit_pixels() {
            display.set_pixel(x, y, true);
        }
        display.flush().map_err(map_display_err)
    }

    fn wipe<SIZE: DisplaySize, BUS: I2cBus>(display: &mut Buffered<SIZE, BUS>) -> Result<()> {
        display.clear_buffer();
        display.flush().map_err(map_display_err)
    }

    impl Surface {
        pub(super) fn open(bus: u8, addr: u8, width: u32, height: u32) -> Result<Self> {
            let i2c = I2c::with_bus(bus).map_err(map_i2c_err)?;
            let interface = I2CDisplayInterface::new_custom_address(i2c, addr);
            let rotation = DisplayRotation::Rotate0;
            match (width, height) {
                (128, 32) => Ok(Surface::Size128x32(start(
                    Ssd1306::new(interface, DisplaySize128x32, rotation)
                        .into_buffered_graphics_mode(),
                )?)),
                (128, 64) => Ok(Surface::Size128x64(start(
                    Ssd1306::new(interface, DisplaySize128x64, rotation)
                        .into_buffered_graphics_mode(),
                )?)),
                (96, 16) => Ok(Surface::Size96x16(start(
                    Ssd1306::new(interface, DisplaySize96x16, rotation)
                        .into_buffered_graphics_mode(),
                )?)),
                _ => Err(Error::InvalidArgs(format!(
                    "unsupported panel geometry {width}x{height}"
                ))),
            }
        }

        pub(super) fn show(&mut self, frame: &Frame) -> Result<()> {
            match self {
                Surface::Size128x32(d) => push(d, frame),
                Surface::Size128x64(d) => push(d, frame),
                Surface::Size96x16(d) => push(d, frame),
            }
        }

        pub(super) fn blank(&mut self) -> Result<()> {
            match self {
                Surface::Size128x32(d) => wipe(d),
                Surface::Size128x64(d) => wipe(d),
                Surface::Size96x16(d) => wipe(d),
            }
        }
    }
}

/// The physical panel, opened on a fixed bus and address.
pub struct Ssd1306Panel {
    #[cfg(target_os = "linux")]
    surface: hw::Surface,
}

impl Ssd1306Panel {
    pub fn open(bus: u8, addr: u8, width: u32, height: u32) -> Result<Self> {
        if !is_supported(width, height) {
            return Err(Error::InvalidArgs(format!(
                "unsupported panel geometry {width}x{height}"
            )));
        }

        #[cfg(target_os = "linux")]
        {
            let surface = hw::Surface::open(bus, addr, width, height)?;
            Ok(Self { surface })
        }

        #[cfg(not(target_os = "linux"))]
        {
            let _ = (bus, addr);
            Err(Error::InvalidArgs(
                "the SSD1306 panel is only available on Linux targets".into(),
            ))
        }
    }
}

impl PanelDriver for Ssd1306Panel {
    #[cfg(target_os = "linux")]
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.surface.show(frame)
    }

    #[cfg(target_os = "linux")]
    fn blank(&mut self) -> Result<()> {
        self.surface.blank()
    }

    #[cfg(not(target_os = "linux"))]
    fn show(&mut self, _frame: &Frame) -> Result<()> {
        Err(Error::Display("no panel on this platform".into()))
    }

    #[cfg(not(target_os = "linux"))]
    fn blank(&mut self) -> Result<()> {
        Err(Error::Display("no panel on this platform".into()))
    }
}
