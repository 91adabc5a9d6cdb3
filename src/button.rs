//! Boot-button long-press detection and factory reset.
//!
//! Holding the boot button (GPIO0) for five seconds clears the stored
//! credentials and restarts the device. The hold detection itself is a
//! small platform-independent state machine so the timing logic can be
//! tested on the host; the GPIO polling loop is ESP32 only.

use std::time::{Duration, Instant};

/// How long the button must be held to trigger a factory reset.
pub const HOLD_THRESHOLD: Duration = Duration::from_secs(5);

/// Poll interval for the button monitor loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Long-press state machine.
///
/// Feed it the current pressed state on every poll; it reports `true` once
/// when a press has been held past the threshold, then re-arms on release.
#[derive(Debug)]
pub struct HoldDetector {
    threshold: Duration,
    press_start: Option<Instant>,
    fired: bool,
}

impl HoldDetector {
    /// Create a detector with the given hold threshold.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            press_start: None,
            fired: false,
        }
    }

    /// Record one poll sample. Returns `true` exactly once per hold that
    /// reaches the threshold; the button must be released before the
    /// detector re-arms.
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        if !pressed {
            self.press_start = None;
            self.fired = false;
            return false;
        }
        if self.fired {
            return false;
        }
        match self.press_start {
            None => {
                self.press_start = Some(now);
                false
            }
            Some(start) if now.duration_since(start) >= self.threshold => {
                self.fired = true;
                true
            }
            Some(_) => false,
        }
    }
}

impl Default for HoldDetector {
    fn default() -> Self {
        Self::new(HOLD_THRESHOLD)
    }
}

/// GPIO polling loop for the boot button (ESP32 only). Never returns: on a
/// long press it clears stored provisioning state and restarts the chip.
#[cfg(feature = "esp32")]
pub fn monitor_factory_reset(
    pin: esp_idf_hal::gpio::Gpio0,
    mut nvs: esp_idf_svc::nvs::EspNvs<esp_idf_svc::nvs::NvsDefault>,
    display: std::sync::Arc<std::sync::Mutex<crate::display::StatusDisplay>>,
) -> ! {
    use esp_idf_hal::gpio::{PinDriver, Pull};
    use log::{error, info};

    // Boot button is active low, needs the internal pull-up.
    let button = match PinDriver::input(pin) {
        Ok(mut b) => {
            if let Err(e) = b.set_pull(Pull::Up) {
                error!("Failed to configure boot button pull-up: {:?}", e);
            }
            b
        }
        Err(e) => {
            // Without the button the device still works, it just cannot be
            // factory reset; park this thread.
            error!("Failed to configure boot button: {:?}", e);
            loop {
                std::thread::sleep(Duration::from_secs(60));
            }
        }
    };

    let mut detector = HoldDetector::default();
    loop {
        let pressed = button.is_low();
        if detector.update(pressed, Instant::now()) {
            info!("Boot button held {:?}, performing factory reset", HOLD_THRESHOLD);
            if let Err(e) = crate::wifi::storage::clear_credentials(&mut nvs) {
                error!("Factory reset failed to clear credentials: {:?}", e);
            }
            if let Ok(mut d) = display.lock() {
                d.show_message("Factory Reset");
            }
            std::thread::sleep(Duration::from_secs(2));
            unsafe { esp_idf_sys::esp_restart() };
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
