//! NVS persistence for WiFi credentials and the device key.
//!
//! Credentials are stored as two separate string entries (`ssid`,
//! `password`) under the `wifi` namespace, matching the layout legacy
//! images already have in flash, so an updated firmware picks up previously
//! provisioned credentials. A third optional entry (`key`) holds a per-unit
//! AES key injected at manufacture; absent that, the compiled-in default
//! key is used.

use crate::pipeline::{Credentials, MAX_FIELD_LEN};
use crate::provision::{DeviceKey, DEFAULT_DEVICE_KEY};
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_sys::EspError;
use log::{info, warn};

/// NVS namespace for provisioning state.
const NVS_NAMESPACE: &str = "wifi";

/// NVS key for the stored SSID.
const SSID_KEY: &str = "ssid";

/// NVS key for the stored password.
const PASSWORD_KEY: &str = "password";

/// NVS key for an optional per-device AES key.
const DEVICE_KEY_KEY: &str = "key";

/// Take the default NVS partition.
///
/// Several components hold their own handle into the namespace (boot check,
/// connection worker, factory reset); they all open against clones of this
/// partition.
pub fn take_partition() -> Result<EspNvsPartition<NvsDefault>, EspError> {
    EspNvsPartition::<NvsDefault>::take()
}

/// Open a handle to the provisioning namespace.
pub fn open(partition: EspNvsPartition<NvsDefault>) -> Result<EspNvs<NvsDefault>, EspError> {
    EspNvs::new(partition, NVS_NAMESPACE, true)
}

/// Load stored credentials.
///
/// Returns `None` when either field is absent or unreadable; corruption is
/// logged and treated as "not provisioned".
pub fn load_credentials(nvs: &EspNvs<NvsDefault>) -> Option<Credentials> {
    let ssid = get_string(nvs, SSID_KEY)?;
    let password = get_string(nvs, PASSWORD_KEY)?;
    match Credentials::new(ssid, password) {
        Ok(creds) => Some(creds),
        Err(e) => {
            warn!("Stored credentials are invalid: {}", e);
            None
        }
    }
}

/// Persist credentials after a successful connection.
pub fn save_credentials(
    nvs: &mut EspNvs<NvsDefault>,
    creds: &Credentials,
) -> Result<(), EspError> {
    nvs.set_str(SSID_KEY, &creds.ssid)?;
    nvs.set_str(PASSWORD_KEY, &creds.password)?;
    info!("Credentials for '{}' saved to NVS", creds.ssid);
    Ok(())
}

/// Remove all stored provisioning state (factory reset).
pub fn clear_credentials(nvs: &mut EspNvs<NvsDefault>) -> Result<(), EspError> {
    nvs.remove(SSID_KEY)?;
    nvs.remove(PASSWORD_KEY)?;
    info!("Stored credentials cleared");
    Ok(())
}

/// Load the payload decryption key.
///
/// Prefers a per-device key provisioned in NVS; falls back to the
/// compiled-in default shared with legacy setup clients.
pub fn load_device_key(nvs: &EspNvs<NvsDefault>) -> DeviceKey {
    let mut buf = [0u8; DEFAULT_DEVICE_KEY.len() + 1];
    match nvs.get_raw(DEVICE_KEY_KEY, &mut buf) {
        Ok(Some(bytes)) if bytes.len() == DEFAULT_DEVICE_KEY.len() => {
            let mut key = [0u8; 16];
            key.copy_from_slice(bytes);
            info!("Using per-device payload key from NVS");
            key
        }
        Ok(Some(bytes)) => {
            warn!(
                "Stored device key has wrong length ({}), using default",
                bytes.len()
            );
            DEFAULT_DEVICE_KEY
        }
        Ok(None) => DEFAULT_DEVICE_KEY,
        Err(e) => {
            warn!("Failed to read device key from NVS: {:?}", e);
            DEFAULT_DEVICE_KEY
        }
    }
}

fn get_string(nvs: &EspNvs<NvsDefault>, key: &str) -> Option<String> {
    // MAX_FIELD_LEN bytes of content plus the NUL written by esp-idf.
    let mut buf = [0u8; MAX_FIELD_LEN + 1];
    match nvs.get_str(key, &mut buf) {
        Ok(Some(s)) => Some(s.trim_end_matches('\0').to_string()),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read '{}' from NVS: {:?}", key, e);
            None
        }
    }
}
