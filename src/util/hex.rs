//! Hex encoding/decoding for the CLI's `--hex`/`--print-hex` flags.

use thiserror::Error;

/// Errors that can occur during hex operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encodes bytes to a lowercase hex string.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decodes a hex string to bytes.
///
/// Strips whitespace and an optional leading `0x`/`0X` prefix before
/// decoding, matching the CLI's `--hex` argument handling.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let trimmed: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(&trimmed);

    if stripped.is_empty() {
        return Err(HexError::EmptyString);
    }
    if stripped.len() % 2 != 0 {
        return Err(HexError::OddLength(stripped.len()));
    }

    hex::decode(stripped).map_err(|e| HexError::DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = vec![0x13, 0xd9, 0x42, 0xdd];
        let encoded = encode_hex(&data);
        assert_eq!(decode_hex(&encoded).unwrap(), data);
    }

    #[test]
    fn decodes_0x_prefix_and_whitespace() {
        let expected = vec![0x68, 0x31, 0x31, 0x68];
        assert_eq!(decode_hex("0x 68 31 31 68").unwrap(), expected);
        assert_eq!(decode_hex("68313168").unwrap(), expected);
    }

    #[test]
    fn rejects_odd_length_and_empty() {
        assert!(decode_hex("").is_err());
        assert!(decode_hex("1").is_err());
    }
}
