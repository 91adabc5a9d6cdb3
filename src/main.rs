//! WiFi provisioning firmware binary.

#[cfg(feature = "esp32")]
fn main() {
    use esp32_wifi_setup::display::{spawn_display_task, StatusDisplay};
    use esp32_wifi_setup::server::DEFAULT_PORT;
    use esp32_wifi_setup::wifi::{storage, worker, RetryPolicy, WifiManager};
    use esp32_wifi_setup::{button, ProvisionServer};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::units::FromValueType;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use log::{error, info, warn};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== WiFi provisioning firmware starting ===");

    /// Boot cannot continue; park the main thread so the log stays visible.
    fn halt(msg: &str) -> ! {
        error!("{}", msg);
        loop {
            std::thread::sleep(std::time::Duration::from_secs(60));
        }
    }

    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => halt(&format!("Failed to take peripherals: {:?}", e)),
    };
    let sysloop = match EspSystemEventLoop::take() {
        Ok(s) => s,
        Err(e) => halt(&format!("Failed to take system event loop: {:?}", e)),
    };

    // Display first: the device is unusable without status feedback, so an
    // init failure here is fatal.
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = match I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio42,
        peripherals.pins.gpio41,
        &i2c_config,
    ) {
        Ok(d) => d,
        Err(e) => halt(&format!("Failed to initialize I2C bus: {:?}", e)),
    };
    let display = match StatusDisplay::new(i2c) {
        Ok(mut d) => {
            d.show_boot();
            Arc::new(Mutex::new(d))
        }
        Err(e) => halt(&format!("{}", e)),
    };

    let partition = match storage::take_partition() {
        Ok(p) => p,
        Err(e) => halt(&format!("Failed to take NVS partition: {:?}", e)),
    };
    let nvs_boot = match storage::open(partition.clone()) {
        Ok(n) => n,
        Err(e) => halt(&format!("Failed to open NVS namespace: {:?}", e)),
    };

    let mut wifi = match WifiManager::new(peripherals.modem, sysloop) {
        Ok(w) => w,
        Err(e) => halt(&format!("Failed to initialize WiFi: {:?}", e)),
    };

    let policy = RetryPolicy::default();
    let key = storage::load_device_key(&nvs_boot);

    // Stored credentials first; fall back to AP mode for provisioning.
    let mut provisioned = false;
    if let Some(creds) = storage::load_credentials(&nvs_boot) {
        info!("Stored credentials found, connecting to '{}'", creds.ssid);
        match wifi.connect_station(&creds, &policy) {
            Ok(ip) => {
                if let Ok(mut d) = display.lock() {
                    d.show_connected(&creds.ssid, &ip);
                }
                provisioned = true;
            }
            Err(e) => warn!("Stored credentials did not connect: {}", e),
        }
    } else {
        info!("No stored credentials");
    }
    if !provisioned {
        match wifi.start_access_point() {
            Ok(ap_ip) => {
                if let Ok(mut d) = display.lock() {
                    d.show_ap_mode(&ap_ip);
                }
            }
            Err(e) => halt(&format!("Failed to start AP mode: {}", e)),
        }
    }

    // HTTP surface and the two background tasks it feeds.
    let (creds_tx, creds_rx) = mpsc::channel();
    let (display_tx, display_rx) = mpsc::channel();

    let _server = match ProvisionServer::start(DEFAULT_PORT, key, creds_tx, display_tx) {
        Ok(s) => s,
        Err(e) => halt(&format!("Failed to start provisioning server: {}", e)),
    };

    let nvs_worker = match storage::open(partition.clone()) {
        Ok(n) => n,
        Err(e) => halt(&format!("Failed to open NVS for worker: {:?}", e)),
    };
    let _worker = worker::spawn(creds_rx, wifi, nvs_worker, display.clone(), policy);
    let _display_task = spawn_display_task(display_rx, display.clone());

    // Main thread becomes the factory-reset monitor; never returns.
    let nvs_button = match storage::open(partition) {
        Ok(n) => n,
        Err(e) => halt(&format!("Failed to open NVS for reset monitor: {:?}", e)),
    };
    button::monitor_factory_reset(peripherals.pins.gpio0, nvs_button, display);
}

#[cfg(not(feature = "esp32"))]
fn main() {
    use esp32_wifi_setup::{ProvisionServer, DEFAULT_DEVICE_KEY};
    use std::sync::mpsc;

    env_logger::init();

    // Host mode: run the provisioning surface on a local port so setup
    // clients can be exercised without hardware. Recovered credentials are
    // logged instead of driving a radio.
    let (creds_tx, creds_rx) = mpsc::channel();
    let (display_tx, display_rx) = mpsc::channel();

    let port = 8080;
    let _server = match ProvisionServer::start(port, DEFAULT_DEVICE_KEY, creds_tx, display_tx) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start server on port {}: {}", port, e);
            std::process::exit(1);
        }
    };

    println!("Provisioning server running on http://127.0.0.1:{}/", port);
    println!("POST /set_wifi with {{\"data\": \"<base64 payload>\"}} to test the pipeline.");

    std::thread::spawn(move || {
        while let Ok(msg) = display_rx.recv() {
            println!("[display] {}", msg);
        }
    });

    while let Ok(creds) = creds_rx.recv() {
        println!("[wifi] would connect to '{}'", creds.ssid);
    }
}
