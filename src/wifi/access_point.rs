//! Fallback access-point configuration.
//!
//! When no stored credentials exist, or connecting with them fails at boot,
//! the device brings up its own WPA2 network so a setup client can reach the
//! provisioning endpoint.

use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod};

/// SSID of the provisioning network.
pub const AP_SSID: &str = "ESP32-Setup";

/// Password of the provisioning network (WPA2 minimum length).
pub const AP_PASSWORD: &str = "12345678";

/// Maximum simultaneous setup clients.
const AP_MAX_CONNECTIONS: u16 = 4;

/// Build the access-point configuration for provisioning mode.
pub fn access_point_config() -> AccessPointConfiguration {
    // The constants fit the driver's heapless bounds, so the conversions
    // cannot fail.
    AccessPointConfiguration {
        ssid: AP_SSID.try_into().unwrap_or_default(),
        password: AP_PASSWORD.try_into().unwrap_or_default(),
        auth_method: AuthMethod::WPA2Personal,
        max_connections: AP_MAX_CONNECTIONS,
        ..Default::default()
    }
}
