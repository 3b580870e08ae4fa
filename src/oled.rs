//! # SSD1306 OLED Output
//!
//! Thin wrapper over the `ssd1306` driver crate for the real display:
//! open the I2C bus, push one rendered frame per tick, and drop the panel
//! contrast while night mode holds the screen. Compiled only with the
//! `hardware` feature, like the rest of the Pi-specific surface.

use crate::config::DisplayConfig;
use crate::renderer;
use crate::{ClockReading, ScreenDirective};
use anyhow::Context;
use linux_embedded_hal::I2cdev;
use log::info;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

type Display = Ssd1306<
    I2CInterface<I2cdev>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// An initialized 128x64 OLED panel.
pub struct Oled {
    display: Display,
    dimmed: bool,
}

impl Oled {
    /// Open the configured I2C bus and initialize the controller.
    pub fn open(config: &DisplayConfig) -> anyhow::Result<Self> {
        let i2c = I2cdev::new(&config.i2c_bus)
            .with_context(|| format!("open I2C bus {}", config.i2c_bus))?;
        let interface = I2CDisplayInterface::new_custom_address(i2c, config.i2c_addr);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display
            .init()
            .map_err(|e| anyhow::anyhow!("display init failed: {:?}", e))?;
        info!(
            "SSD1306 initialized on {} at 0x{:02X}",
            config.i2c_bus, config.i2c_addr
        );
        Ok(Oled {
            display,
            dimmed: false,
        })
    }

    /// Draw one directive and flush the frame.
    ///
    /// Contrast follows the directive class: `NightClock` dims the panel,
    /// anything else restores normal brightness.
    pub fn render(
        &mut self,
        directive: &ScreenDirective,
        clock: &ClockReading,
    ) -> anyhow::Result<()> {
        let want_dim = matches!(directive, ScreenDirective::NightClock);
        if want_dim != self.dimmed {
            let brightness = if want_dim {
                Brightness::DIMMEST
            } else {
                Brightness::NORMAL
            };
            self.display
                .set_brightness(brightness)
                .map_err(|e| anyhow::anyhow!("set brightness failed: {:?}", e))?;
            self.dimmed = want_dim;
        }

        self.display.clear_buffer();
        renderer::draw_screen(&mut self.display, directive, clock);
        self.display
            .flush()
            .map_err(|e| anyhow::anyhow!("display flush failed: {:?}", e))?;
        Ok(())
    }
}
