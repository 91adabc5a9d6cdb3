//! SSD1306 status panel.
//!
//! A 128x32 OLED on I2C (address 0x3C, SDA 42, SCL 41) that shows boot
//! progress, connection results, AP-mode details, and free-text messages
//! from the `/display` endpoint. The device is useless without status
//! feedback, so display-init failure at boot is treated as fatal by the
//! caller.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text};
use esp_idf_hal::i2c::I2cDriver;
use log::warn;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;

type Panel = Ssd1306<
    I2CInterface<I2cDriver<'static>>,
    DisplaySize128x32,
    BufferedGraphicsMode<DisplaySize128x32>,
>;

/// Panel width in pixels.
const WIDTH: i32 = 128;

/// Panel height in pixels.
const HEIGHT: i32 = 32;

/// The status display.
pub struct StatusDisplay {
    panel: Panel,
}

impl StatusDisplay {
    /// Initialize the panel over the given I2C bus.
    pub fn new(i2c: I2cDriver<'static>) -> Result<Self, DisplayInitError> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut panel = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel
            .init()
            .map_err(|e| DisplayInitError(format!("{:?}", e)))?;
        Ok(Self { panel })
    }

    /// Show up to three lines of text, top-aligned.
    pub fn show_lines(&mut self, lines: &[&str]) {
        self.panel.clear_buffer();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let text = lines.join("\n");
        let _ = Text::with_baseline(&text, Point::zero(), style, Baseline::Top)
            .draw(&mut self.panel);
        self.flush();
    }

    /// Show a single message centered on the panel.
    pub fn show_message(&mut self, msg: &str) {
        self.panel.clear_buffer();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let center = Point::new(WIDTH / 2, HEIGHT / 2);
        let _ = Text::with_alignment(msg, center, style, Alignment::Center).draw(&mut self.panel);
        self.flush();
    }

    /// Boot banner.
    pub fn show_boot(&mut self) {
        self.show_lines(&["Booting..."]);
    }

    /// Successful connection screen.
    pub fn show_connected(&mut self, ssid: &str, ip: &str) {
        let ip_line = format!("IP: {}", ip);
        self.show_lines(&["Connected:", ssid, &ip_line]);
    }

    /// Fallback AP screen.
    pub fn show_ap_mode(&mut self, ap_ip: &str) {
        self.show_lines(&["AP Mode Active", ap_ip]);
    }

    fn flush(&mut self) {
        if let Err(e) = self.panel.flush() {
            warn!("Display flush failed: {:?}", e);
        }
    }
}

/// Display initialization failure. Fatal at boot.
#[derive(Debug)]
pub struct DisplayInitError(String);

impl fmt::Display for DisplayInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "display init failed: {}", self.0)
    }
}

impl std::error::Error for DisplayInitError {}

/// Spawn the display task: forwards `/display` messages to the panel.
/// Exits when the sending side (the HTTP server) is gone.
pub fn spawn_display_task(
    rx: Receiver<String>,
    display: Arc<Mutex<StatusDisplay>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            if let Ok(mut d) = display.lock() {
                d.show_message(&msg);
            }
        }
    })
}
