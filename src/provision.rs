//! Provisioning orchestrator for the HTTP boundary.
//!
//! Takes the raw `POST /set_wifi` body, validates the JSON envelope, runs the
//! credential pipeline, and decides the HTTP reply. The reply is produced
//! before the connection attempt is dispatched: association can take seconds
//! or never succeed, and the setup client must not block on it. The server
//! therefore sends the reply first, then forwards the recovered credentials
//! to the connection worker over its channel.
//!
//! Per-request state machine: `Receiving -> Validating -> Dispatched` on
//! success, `Receiving -> Rejected` on any validation failure. Rejection is
//! terminal for the request and persists nothing.

use crate::pipeline::{recover_credentials, Credentials, KEY_LEN};
use log::{info, warn};
use serde::Deserialize;

/// JSON envelope of a setup request.
#[derive(Debug, Deserialize)]
struct SetupRequest {
    /// Base64 of `IV(16) || AES-128-CBC ciphertext`.
    data: String,
}

/// Device decryption key.
pub type DeviceKey = [u8; KEY_LEN];

/// Compiled-in default key, shared with legacy provisioning clients.
///
/// A shared per-image key is a known weakness: anyone with a device image can
/// decrypt any provisioning payload. Devices may override it with a per-unit
/// key stored in NVS (see `wifi::storage::load_device_key`); the wire format
/// is unchanged either way.
pub const DEFAULT_DEVICE_KEY: DeviceKey = *b"thisismypassword";

/// Acknowledgment sent when the pipeline accepted the payload.
pub const ACK_TEXT: &str = "WiFi Credentials Processing...";

/// Reply for a body that is not valid JSON.
pub const ERR_INVALID_JSON: &str = "Invalid JSON";

/// Reply for a JSON body without a string `data` field.
pub const ERR_MISSING_DATA: &str = "Missing 'data' parameter";

/// Reply for any pipeline stage failure.
pub const ERR_DECRYPT_FAILED: &str = "Decryption Failed";

/// An HTTP reply: status code plus plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub text: String,
}

impl Reply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            text: text.into(),
        }
    }

    pub fn bad_request(text: impl Into<String>) -> Self {
        Self {
            status: 400,
            text: text.into(),
        }
    }
}

/// Result of handling one setup request.
///
/// `credentials` is `Some` only on the success path; the caller must send the
/// HTTP reply before handing them to the connection worker.
#[derive(Debug)]
pub struct SetupOutcome {
    pub reply: Reply,
    pub credentials: Option<Credentials>,
}

impl SetupOutcome {
    fn rejected(reply: Reply) -> Self {
        Self {
            reply,
            credentials: None,
        }
    }
}

/// Handle a `POST /set_wifi` body.
///
/// Validation failures reject the request with a client error and abort the
/// pipeline; nothing is persisted on rejection.
pub fn handle_set_wifi(body: &str, key: &DeviceKey) -> SetupOutcome {
    info!("Received WiFi setup request");

    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Setup body is not valid JSON: {}", e);
            return SetupOutcome::rejected(Reply::bad_request(ERR_INVALID_JSON));
        }
    };

    let request: SetupRequest = match serde_json::from_value(json) {
        Ok(r) => r,
        Err(e) => {
            warn!("Setup body has no string 'data' field: {}", e);
            return SetupOutcome::rejected(Reply::bad_request(ERR_MISSING_DATA));
        }
    };

    let credentials = match recover_credentials(&request.data, key) {
        Ok(c) => c,
        Err(e) => {
            warn!("Credential pipeline rejected payload: {}", e);
            return SetupOutcome::rejected(Reply::bad_request(ERR_DECRYPT_FAILED));
        }
    };

    info!("Recovered credentials for SSID '{}'", credentials.ssid);
    SetupOutcome {
        reply: Reply::ok(ACK_TEXT),
        credentials: Some(credentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use crate::pipeline::BLOCK_LEN;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    fn client_payload(plaintext: &str, key: &DeviceKey) -> String {
        let iv = *b"abcdefghijklmnop";
        let mut buf = plaintext.as_bytes().to_vec();
        let pad = BLOCK_LEN - (buf.len() % BLOCK_LEN);
        buf.extend(std::iter::repeat(pad as u8).take(pad));
        let n = buf.len();
        Aes128CbcEnc::new(key.into(), &iv.into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, n)
            .unwrap();
        let mut blob = iv.to_vec();
        blob.extend_from_slice(&buf);
        STANDARD.encode(blob)
    }

    #[test]
    fn test_setup_success() {
        let payload = client_payload("HomeNet|Sup3rSecret", &DEFAULT_DEVICE_KEY);
        let body = format!(r#"{{"data":"{}"}}"#, payload);
        let outcome = handle_set_wifi(&body, &DEFAULT_DEVICE_KEY);

        assert_eq!(outcome.reply, Reply::ok(ACK_TEXT));
        let creds = outcome.credentials.expect("success path carries credentials");
        assert_eq!(creds.ssid, "HomeNet");
        assert_eq!(creds.password, "Sup3rSecret");
    }

    #[test]
    fn test_setup_invalid_json() {
        let outcome = handle_set_wifi("not json at all", &DEFAULT_DEVICE_KEY);
        assert_eq!(outcome.reply, Reply::bad_request(ERR_INVALID_JSON));
        assert!(outcome.credentials.is_none());
    }

    #[test]
    fn test_setup_missing_data_field() {
        let outcome = handle_set_wifi(r#"{"other":"x"}"#, &DEFAULT_DEVICE_KEY);
        assert_eq!(outcome.reply, Reply::bad_request(ERR_MISSING_DATA));
        assert!(outcome.credentials.is_none());
    }

    #[test]
    fn test_setup_non_string_data_field() {
        let outcome = handle_set_wifi(r#"{"data":42}"#, &DEFAULT_DEVICE_KEY);
        assert_eq!(outcome.reply, Reply::bad_request(ERR_MISSING_DATA));
        assert!(outcome.credentials.is_none());
    }

    #[test]
    fn test_setup_pipeline_failure() {
        let outcome = handle_set_wifi(r#"{"data":"!!!not-base64!!!"}"#, &DEFAULT_DEVICE_KEY);
        assert_eq!(outcome.reply, Reply::bad_request(ERR_DECRYPT_FAILED));
        assert!(outcome.credentials.is_none());
    }

    #[test]
    fn test_setup_short_blob_rejected() {
        let body = format!(r#"{{"data":"{}"}}"#, STANDARD.encode([0u8; 10]));
        let outcome = handle_set_wifi(&body, &DEFAULT_DEVICE_KEY);
        assert_eq!(outcome.reply, Reply::bad_request(ERR_DECRYPT_FAILED));
    }
}
