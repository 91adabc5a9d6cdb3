//! Base64 transport decoding for the encrypted credential payload.
//!
//! The setup client sends `base64(IV || ciphertext)` in the request body. The
//! decoded blob is small by construction (two 63-byte credential fields fit in
//! three AES blocks plus the IV), so the decoder enforces a hard 64-byte
//! ceiling to bound memory for anything a client might send.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Hard ceiling on the decoded payload size, sized to the worst-case
/// credential blob (16-byte IV + 48 bytes of ciphertext).
pub const MAX_DECODED_LEN: usize = 64;

/// Decode a base64 payload, rejecting anything that is not strict base64 or
/// that decodes to more than [`MAX_DECODED_LEN`] bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let bytes = STANDARD.decode(text).map_err(|_| DecodeError::Malformed)?;
    if bytes.len() > MAX_DECODED_LEN {
        return Err(DecodeError::TooLarge {
            len: bytes.len(),
            max: MAX_DECODED_LEN,
        });
    }
    Ok(bytes)
}

/// Errors from transport decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input is not valid base64 (bad alphabet or padding).
    Malformed,
    /// Decoded payload exceeds the supported maximum size.
    TooLarge { len: usize, max: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "payload is not valid base64"),
            Self::TooLarge { len, max } => {
                write!(f, "decoded payload too large: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid() {
        assert_eq!(decode("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_rejects_bad_alphabet() {
        assert_eq!(decode("not base64!!"), Err(DecodeError::Malformed));
        assert_eq!(decode("aGVs bG8="), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_decode_rejects_bad_padding() {
        assert_eq!(decode("aGVsbG8"), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_decode_at_ceiling() {
        let input = STANDARD.encode([0xAB; MAX_DECODED_LEN]);
        assert_eq!(decode(&input).unwrap().len(), MAX_DECODED_LEN);
    }

    #[test]
    fn test_decode_over_ceiling() {
        let input = STANDARD.encode([0xAB; MAX_DECODED_LEN + 1]);
        assert!(matches!(decode(&input), Err(DecodeError::TooLarge { .. })));
    }
}
