//! Credential parsing and the owned credential type.
//!
//! The decrypted plaintext carries both fields in one line,
//! `<ssid>|<password>`, split at the first `|` (the SSID side never contains
//! one). Each side is sanitized to printable ASCII after splitting, so CBC
//! padding and stray control bytes never reach the WiFi driver.

use super::sanitize::clean;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum length of either credential field in bytes.
pub const MAX_FIELD_LEN: usize = 63;

/// A parsed pair of WiFi credentials.
///
/// Owned by exactly one consumer at a time: the parser creates it, the
/// connection worker receives it by value and drops it when the attempt
/// finishes. Memory is zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Network SSID (1-63 printable ASCII bytes).
    pub ssid: String,
    /// Network password (0-63 printable ASCII bytes).
    pub password: String,
}

impl Credentials {
    /// Build credentials from already-clean fields, enforcing length bounds.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ParseError> {
        let ssid = ssid.into();
        let password = password.into();
        if ssid.is_empty() || ssid.len() > MAX_FIELD_LEN || password.len() > MAX_FIELD_LEN {
            return Err(ParseError::BadFormat);
        }
        Ok(Self { ssid, password })
    }
}

// Keep the password out of logs; only the SSID is ever printed.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parse a decrypted plaintext of the form `<ssid>|<password>`.
///
/// Fails when no separator is present or either raw side exceeds
/// [`MAX_FIELD_LEN`] bytes. Sanitization happens after the split, on each
/// side independently.
pub fn parse(plaintext: &[u8]) -> Result<Credentials, ParseError> {
    let sep = plaintext
        .iter()
        .position(|&b| b == b'|')
        .ok_or(ParseError::BadFormat)?;

    let (ssid_raw, rest) = plaintext.split_at(sep);
    let password_raw = &rest[1..];

    if ssid_raw.len() > MAX_FIELD_LEN || password_raw.len() > MAX_FIELD_LEN {
        return Err(ParseError::BadFormat);
    }

    Credentials::new(clean(ssid_raw), clean(password_raw))
}

/// Errors from credential parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Missing separator, empty SSID, or an oversized field.
    BadFormat,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadFormat => write!(f, "credentials are not in <ssid>|<password> form"),
        }
    }
}

impl std::error::Error for ParseError {}
