//! Credential transport pipeline.
//!
//! Turns the encrypted payload from the setup client into an owned
//! [`Credentials`] value, in three stages:
//!
//! 1. [`codec`] - base64 decode with a hard size ceiling
//! 2. [`cipher`] - AES-128-CBC decryption (embedded IV)
//! 3. [`credentials`] - sanitize and split into `ssid`/`password`
//!
//! Every stage is pure and host-testable; any stage failure aborts the
//! pipeline with no partial state.

mod cipher;
mod codec;
mod credentials;
mod sanitize;

pub use cipher::{decrypt, CryptoError, BLOCK_LEN, KEY_LEN, MAX_PLAINTEXT_LEN};
pub use codec::{decode, DecodeError, MAX_DECODED_LEN};
pub use credentials::{parse, Credentials, ParseError, MAX_FIELD_LEN};
pub use sanitize::clean;

use std::fmt;

/// Run the full pipeline: base64 payload in, owned credentials out.
pub fn recover_credentials(
    payload_b64: &str,
    key: &[u8; KEY_LEN],
) -> Result<Credentials, PipelineError> {
    let decoded = decode(payload_b64)?;
    let plaintext = decrypt(&decoded, key)?;
    let creds = parse(&plaintext)?;
    Ok(creds)
}

/// A failure in any pipeline stage. Terminal for the request that carried
/// the payload; surfaced to the HTTP caller as a client error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Transport decoding failed.
    Decode(DecodeError),
    /// Decryption failed.
    Crypto(CryptoError),
    /// The plaintext did not parse as credentials.
    Parse(ParseError),
}

impl From<DecodeError> for PipelineError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<CryptoError> for PipelineError {
    fn from(e: CryptoError) -> Self {
        Self::Crypto(e)
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {}", e),
            Self::Crypto(e) => write!(f, "decrypt: {}", e),
            Self::Parse(e) => write!(f, "parse: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Crypto(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    const KEY: [u8; KEY_LEN] = *b"thisismypassword";
    const IV: [u8; BLOCK_LEN] = *b"fedcba9876543210";

    /// Produce the payload a provisioning client would send: pad the
    /// plaintext up to a block boundary, encrypt, prepend the IV, base64.
    fn client_payload(plaintext: &str) -> String {
        let mut buf = plaintext.as_bytes().to_vec();
        let pad = BLOCK_LEN - (buf.len() % BLOCK_LEN);
        buf.extend(std::iter::repeat(pad as u8).take(pad));
        let n = buf.len();
        Aes128CbcEnc::new(&KEY.into(), &IV.into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, n)
            .unwrap();
        let mut blob = IV.to_vec();
        blob.extend_from_slice(&buf);
        STANDARD.encode(blob)
    }

    #[test]
    fn test_end_to_end_recovery() {
        let payload = client_payload("HomeNet|Sup3rSecret");
        let creds = recover_credentials(&payload, &KEY).unwrap();
        assert_eq!(creds.ssid, "HomeNet");
        assert_eq!(creds.password, "Sup3rSecret");
    }

    #[test]
    fn test_block_aligned_plaintext_no_padding_needed() {
        // 16 chars force a full extra pad block: exercises the two-block path
        let payload = client_payload("Net|123456789012");
        let creds = recover_credentials(&payload, &KEY).unwrap();
        assert_eq!(creds.ssid, "Net");
        assert_eq!(creds.password, "123456789012");
    }

    #[test]
    fn test_bad_base64_is_decode_error() {
        let err = recover_credentials("!!!", &KEY).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(DecodeError::Malformed)));
    }

    #[test]
    fn test_short_blob_is_crypto_error() {
        let payload = STANDARD.encode([0u8; 10]);
        let err = recover_credentials(&payload, &KEY).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Crypto(CryptoError::TooShort { len: 10 })
        ));
    }

    #[test]
    fn test_oversize_blob_is_decode_error() {
        let payload = STANDARD.encode([0u8; MAX_DECODED_LEN + 16]);
        let err = recover_credentials(&payload, &KEY).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Decode(DecodeError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_iv_only_blob_rejected() {
        let payload = STANDARD.encode([0u8; BLOCK_LEN]);
        let err = recover_credentials(&payload, &KEY).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Crypto(CryptoError::Misaligned { len: 0 })
        ));
    }

    #[test]
    fn test_wrong_key_never_recovers_credentials() {
        // Without a MAC, a wrong key yields garbage plaintext. The parser
        // may or may not find a '|' in it, but it can never reproduce the
        // real credentials.
        let payload = client_payload("HomeNet|Sup3rSecret");
        let other_key = *b"0000000000000000";
        if let Ok(creds) = recover_credentials(&payload, &other_key) {
            assert_ne!(creds.ssid, "HomeNet");
        }
    }
}
