//! ESP32 WiFi provisioning firmware library.
//!
//! This library contains the platform-independent parts of the firmware
//! (the credential transport pipeline, the HTTP surface, and the timing
//! logic) so they can be tested on the host machine without ESP32
//! hardware. Everything touching ESP-IDF lives behind the `esp32` feature.

pub mod button;
pub mod pipeline;
pub mod provision;
pub mod server;
pub mod wifi;

#[cfg(feature = "esp32")]
pub mod display;

// Re-export commonly used items
pub use pipeline::{Credentials, PipelineError};
pub use provision::{handle_set_wifi, DeviceKey, Reply, SetupOutcome, DEFAULT_DEVICE_KEY};
pub use server::ProvisionServer;
pub use wifi::{ConnectionOutcome, RetryPolicy};
