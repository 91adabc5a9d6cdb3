//! Connection-attempt worker.
//!
//! A dedicated thread that owns the radio and the NVS handle. The HTTP
//! server hands it recovered credentials over an mpsc channel; ownership of
//! each `Credentials` value transfers with the message and the value is
//! dropped (and zeroized) when the attempt finishes, success or not.
//!
//! The worker never reports back to the HTTP caller. Outcomes surface on
//! the local display and in the log. Stored credentials are only touched on
//! success; a failed attempt leaves the previous provisioning intact.

use super::connection::{WifiError, WifiManager};
use super::status::{ConnectionError, ConnectionOutcome, RetryPolicy};
use super::storage;
use crate::display::StatusDisplay;
use crate::pipeline::Credentials;
use esp_idf_svc::nvs::{EspNvs, NvsDefault};
use log::{error, info, warn};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;

/// Spawn the connection worker.
///
/// Consumes the receiving end of the credentials channel; the worker exits
/// when every sender is gone.
pub fn spawn(
    rx: Receiver<Credentials>,
    mut wifi: WifiManager<'static>,
    mut nvs: EspNvs<NvsDefault>,
    display: Arc<Mutex<StatusDisplay>>,
    policy: RetryPolicy,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(creds) = rx.recv() {
            let outcome = attempt(&mut wifi, &creds, &policy);
            match outcome {
                ConnectionOutcome::Connected { ref ip } => {
                    if let Err(e) = storage::save_credentials(&mut nvs, &creds) {
                        error!("Failed to persist credentials: {:?}", e);
                    }
                    if let Ok(mut d) = display.lock() {
                        d.show_connected(&creds.ssid, ip);
                    }
                }
                ConnectionOutcome::TimedOut => {
                    warn!("WiFi connection attempt timed out");
                }
                ConnectionOutcome::Failed => {
                    warn!("WiFi connection attempt failed");
                }
            }
            info!("Connection attempt for '{}': {}", creds.ssid, outcome);
            // creds dropped here; zeroized by the Credentials drop impl
        }
        info!("Connection worker exiting, channel closed");
    })
}

fn attempt(
    wifi: &mut WifiManager<'static>,
    creds: &Credentials,
    policy: &RetryPolicy,
) -> ConnectionOutcome {
    match wifi.connect_station(creds, policy) {
        Ok(ip) => ConnectionOutcome::Connected { ip },
        Err(WifiError::Connection(ConnectionError::Timeout)) => ConnectionOutcome::TimedOut,
        Err(e) => {
            warn!("Connection attempt error: {}", e);
            ConnectionOutcome::Failed
        }
    }
}
