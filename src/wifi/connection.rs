//! ESP-IDF WiFi driver wrapper.
//!
//! Owns the radio for the lifetime of the firmware. Station attempts follow
//! the bounded polling schedule in [`RetryPolicy`] instead of the driver's
//! blocking wait, so an unreachable network costs ~10 s and not forever.

use super::access_point::access_point_config;
use super::status::{ConnectionError, RetryPolicy};
use crate::pipeline::Credentials;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use esp_idf_sys::EspError;
use log::{info, warn};
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

/// Settle delay after dropping an existing association, before the radio is
/// reconfigured for a fresh attempt.
const DISCONNECT_SETTLE: Duration = Duration::from_secs(1);

/// WiFi radio manager.
pub struct WifiManager<'a> {
    wifi: EspWifi<'a>,
}

impl<'a> WifiManager<'a> {
    /// Create a new WiFi manager.
    pub fn new(modem: Modem, sysloop: EspSystemEventLoop) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, None)?;
        Ok(Self { wifi })
    }

    /// Attempt to join the network described by `creds`.
    ///
    /// Drops any current association, reconfigures the radio as a station,
    /// then polls the driver per `policy` until associated with an address
    /// or the budget is spent. Returns the IP address on success.
    pub fn connect_station(
        &mut self,
        creds: &Credentials,
        policy: &RetryPolicy,
    ) -> Result<String, WifiError> {
        info!("Connecting to WiFi: {}", creds.ssid);

        // Radio may be associated or in AP mode from the fallback path.
        if let Err(e) = self.wifi.disconnect() {
            // Not being associated is the normal case here.
            log::debug!("Disconnect before reconfigure: {:?}", e);
        }
        thread::sleep(DISCONNECT_SETTLE);

        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&config)?;
        self.wifi.start()?;
        self.wifi.connect()?;

        // Bounded poll loop: the driver retries association internally, we
        // just watch for it to come up with an address.
        for attempt in 0..policy.max_attempts {
            if self.wifi.is_connected().unwrap_or(false) {
                if let Some(ip) = self.station_ip()? {
                    info!("Connected to WiFi after {} polls, IP: {}", attempt + 1, ip);
                    return Ok(ip.to_string());
                }
            }
            thread::sleep(policy.interval);
        }

        warn!(
            "WiFi association did not complete within {:?}",
            policy.total_wait()
        );
        Err(WifiError::Connection(ConnectionError::Timeout))
    }

    /// Switch the radio into the fallback access-point mode.
    ///
    /// Returns the AP's own IP address (the address setup clients talk to).
    pub fn start_access_point(&mut self) -> Result<String, WifiError> {
        info!("Starting AP mode");
        self.wifi
            .set_configuration(&Configuration::AccessPoint(access_point_config()))?;
        self.wifi.start()?;

        let ip = self.wifi.ap_netif().get_ip_info()?.ip;
        info!("AP mode active, IP: {}", ip);
        Ok(ip.to_string())
    }

    /// Drop the current association and stop the radio.
    pub fn disconnect(&mut self) -> Result<(), EspError> {
        info!("Disconnecting from WiFi");
        self.wifi.disconnect()?;
        self.wifi.stop()?;
        Ok(())
    }

    /// Check if currently associated.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Station IP, if DHCP has assigned one.
    fn station_ip(&self) -> Result<Option<Ipv4Addr>, EspError> {
        let ip = self.wifi.sta_netif().get_ip_info()?.ip;
        if ip == Ipv4Addr::UNSPECIFIED {
            Ok(None)
        } else {
            Ok(Some(ip))
        }
    }
}

/// Errors from WiFi radio operations.
#[derive(Debug)]
pub enum WifiError {
    /// SSID does not fit the driver's limits.
    InvalidSsid,
    /// Password does not fit the driver's limits.
    InvalidPassword,
    /// The connection attempt itself failed (currently only timeout).
    Connection(ConnectionError),
    /// ESP-IDF error.
    Esp(EspError),
}

impl From<EspError> for WifiError {
    fn from(e: EspError) -> Self {
        Self::Esp(e)
    }
}

impl std::fmt::Display for WifiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Connection(e) => write!(f, "{}", e),
            Self::Esp(e) => write!(f, "ESP error: {:?}", e),
        }
    }
}

impl std::error::Error for WifiError {}
