//! Printable-ASCII sanitizer for recovered credential text.
//!
//! Decrypted credential fields may carry control bytes: CBC padding from the
//! provisioning client, stray CR/LF, or garbage from a wrong key. This module
//! strips everything outside the printable ASCII range so the fields are safe
//! to log, display, and hand to the WiFi driver.

/// First printable ASCII byte (space).
const PRINTABLE_MIN: u8 = 0x20;

/// Last printable ASCII byte (`~`).
const PRINTABLE_MAX: u8 = 0x7E;

/// Remove every byte outside `[0x20, 0x7E]`, preserving the relative order
/// of the remaining bytes.
///
/// Total function with no failure mode, and idempotent: cleaning already
/// clean text returns it unchanged.
pub fn clean(bytes: &[u8]) -> String {
    let kept: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|b| (PRINTABLE_MIN..=PRINTABLE_MAX).contains(b))
        .collect();

    // All kept bytes are ASCII, so this cannot fail.
    String::from_utf8(kept).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_passthrough() {
        assert_eq!(clean(b"HomeNet"), "HomeNet");
        assert_eq!(clean(b"with spaces and ~tildes~"), "with spaces and ~tildes~");
    }

    #[test]
    fn test_clean_strips_control_bytes() {
        assert_eq!(clean(b"Home\rNet\n"), "HomeNet");
        assert_eq!(clean(b"\x08back\x08space"), "backspace");
        assert_eq!(clean(b"\x00\x01\x02abc"), "abc");
    }

    #[test]
    fn test_clean_strips_high_bytes() {
        assert_eq!(clean(b"caf\xC3\xA9"), "caf");
        assert_eq!(clean(&[0x7F, b'x', 0xFF]), "x");
    }

    #[test]
    fn test_clean_strips_cbc_padding() {
        // PKCS#7 pad bytes are all <= 0x10, below the printable range
        let mut padded = b"secret123".to_vec();
        padded.extend_from_slice(&[0x07; 7]);
        assert_eq!(clean(&padded), "secret123");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean(b""), "");
        assert_eq!(clean(&[0x00, 0x1F, 0x7F]), "");
    }

    #[test]
    fn test_clean_idempotent() {
        let noisy = b"\x01My\x00-SSID\x7f\r\n";
        let once = clean(noisy);
        let twice = clean(once.as_bytes());
        assert_eq!(once, twice);
        assert_eq!(once, "My-SSID");
    }

    #[test]
    fn test_clean_output_is_subsequence() {
        let input = b"a\x00b\x01c d\x7fe";
        let cleaned = clean(input);
        let mut rest = &input[..];
        for ch in cleaned.bytes() {
            let pos = rest.iter().position(|&b| b == ch).expect("subsequence");
            rest = &rest[pos + 1..];
        }
    }

    #[test]
    fn test_clean_output_printable_only() {
        let input: Vec<u8> = (0u8..=255).collect();
        for b in clean(&input).bytes() {
            assert!((0x20..=0x7E).contains(&b));
        }
    }
}
