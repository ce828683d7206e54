//! Repeating-key byte mask applied to whole frames.
//!
//! This is obfuscation, not encryption: every byte is XORed with the key byte
//! at the same index modulo the key length. Applying the mask twice with the
//! same key restores the input, so the receive path uses the same function.
//!
//! [`obfuscate_text`] and [`reveal_text`] are the text-channel form: masked
//! UTF-8 bytes carried as standard base64.

use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{error, warn};

/// Mask `data` with `key`. An empty key leaves the data unchanged and is
/// logged as an error.
pub fn obfuscate(data: &[u8], key: &str) -> Vec<u8> {
    match try_obfuscate(data, key) {
        Ok(out) => out,
        Err(e) => {
            error!(error = %e, len = data.len(), "Sending frame without obfuscation");
            data.to_vec()
        }
    }
}

/// Mask `data` with `key`, reporting an empty key as an error
pub fn try_obfuscate(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let mut out = data.to_vec();
    obfuscate_in_place(&mut out, key)?;
    Ok(out)
}

/// Mask `data` in place
pub fn obfuscate_in_place(data: &mut [u8], key: &str) -> Result<()> {
    let key = key.as_bytes();
    if key.is_empty() {
        global_metrics().cipher_key_missing();
        return Err(ProtocolError::EmptyCipherKey);
    }

    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
    Ok(())
}

/// Mask the UTF-8 bytes of `text` and return them as standard base64,
/// for channels that only carry text
pub fn obfuscate_text(text: &str, key: &str) -> String {
    STANDARD.encode(obfuscate(text.as_bytes(), key))
}

/// Reverse [`obfuscate_text`]. Bytes that are not valid UTF-8 after
/// unmasking are replaced and logged.
pub fn reveal_text(encoded: &str, key: &str) -> Result<String> {
    let masked = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))?;
    let bytes = obfuscate(&masked, key);
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(error = %e, "Revealed text is not valid UTF-8");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_is_involutive() {
        let data = b"\x01hello\xFE\xFE\xFE\xFE world".to_vec();
        let masked = obfuscate(&data, "k3y");
        assert_ne!(masked, data);
        assert_eq!(obfuscate(&masked, "k3y"), data);
    }

    #[test]
    fn test_key_repeats() {
        let masked = obfuscate(&[0, 0, 0, 0, 0], "ab");
        assert_eq!(masked, vec![b'a', b'b', b'a', b'b', b'a']);
    }

    #[test]
    fn test_empty_key_passes_through() {
        let data = vec![1, 2, 3];
        assert_eq!(obfuscate(&data, ""), data);
        assert!(matches!(
            try_obfuscate(&data, ""),
            Err(ProtocolError::EmptyCipherKey)
        ));
    }

    #[test]
    fn test_empty_data() {
        assert!(obfuscate(&[], "key").is_empty());
    }

    #[test]
    fn test_text_round_trip() {
        let encoded = obfuscate_text("Nova joined", "k3y");
        assert_ne!(encoded, STANDARD.encode("Nova joined"));
        assert_eq!(reveal_text(&encoded, "k3y").unwrap(), "Nova joined");
        assert_eq!(reveal_text(&obfuscate_text("", "k3y"), "k3y").unwrap(), "");
    }

    #[test]
    fn test_text_known_value() {
        // 'A' ^ 'b' = 0x23, 'B' ^ 'b' = 0x20
        assert_eq!(obfuscate_text("AB", "b"), STANDARD.encode([0x23, 0x20]));
    }

    #[test]
    fn test_text_empty_key_passes_through() {
        let encoded = obfuscate_text("plain", "");
        assert_eq!(encoded, "cGxhaW4=");
        assert_eq!(reveal_text(&encoded, "").unwrap(), "plain");
    }

    #[test]
    fn test_reveal_rejects_bad_base64() {
        assert!(matches!(
            reveal_text("not base64!", "k"),
            Err(ProtocolError::InvalidBase64(_))
        ));
    }
}
