//! WiFi radio, persistence, and the connection worker.
//!
//! # Components
//!
//! - [`status`] - connection outcome and retry policy (host-testable)
//! - [`connection`] - ESP-IDF radio wrapper (ESP32 only)
//! - [`access_point`] - fallback provisioning AP (ESP32 only)
//! - [`storage`] - NVS persistence for credentials + device key (ESP32 only)
//! - [`worker`] - channel-fed connection-attempt thread (ESP32 only)

mod status;

#[cfg(feature = "esp32")]
mod access_point;
#[cfg(feature = "esp32")]
mod connection;
#[cfg(feature = "esp32")]
pub mod storage;
#[cfg(feature = "esp32")]
pub mod worker;

pub use status::{ConnectionError, ConnectionOutcome, RetryPolicy};

#[cfg(feature = "esp32")]
pub use access_point::{AP_PASSWORD, AP_SSID};
#[cfg(feature = "esp32")]
pub use connection::{WifiError, WifiManager};
