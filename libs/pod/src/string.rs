//! Length-prefixed strings used for names inside POD sub-formats.
//!
//! One length byte is followed by that many characters. Each character is
//! XORed with the complement of its index within the string, so the key
//! starts at `0xFF` and decreases by one per byte. There is no terminator.

use crate::cursor::ByteCursor;
use crate::error::PodError;
use crate::Result;

/// Longest string the one-byte length prefix can describe
pub const MAX_POD_STRING_LEN: usize = u8::MAX as usize;

/// Substituted for bytes outside 7-bit ASCII
const REPLACEMENT_CHAR: char = '?';

fn key(index: usize) -> u8 {
    !(index as u8)
}

/// Read a POD string from the cursor.
pub fn read_pod_string(cursor: &mut ByteCursor<'_>) -> Result<String> {
    let length = usize::from(cursor.read_u8()?);
    let raw = cursor.read_bytes(length)?;
    Ok(raw
        .iter()
        .enumerate()
        .map(|(index, &byte)| {
            let plain = byte ^ key(index);
            if plain.is_ascii() {
                char::from(plain)
            } else {
                REPLACEMENT_CHAR
            }
        })
        .collect())
}

/// Encode `value` as a POD string, length prefix included.
pub fn encode_pod_string(value: &str) -> Result<Vec<u8>> {
    if !value.is_ascii() {
        return Err(PodError::UnsupportedLayout {
            field: "pod string",
            expected: String::from("7-bit ASCII"),
            found: format!("{value:?}"),
        });
    }
    let length = u8::try_from(value.len()).map_err(|_| PodError::UnsupportedLayout {
        field: "pod string length",
        expected: format!("at most {MAX_POD_STRING_LEN}"),
        found: value.len().to_string(),
    })?;

    let mut out = Vec::with_capacity(value.len() + 1);
    out.push(length);
    out.extend(
        value
            .bytes()
            .enumerate()
            .map(|(index, byte)| byte ^ key(index)),
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_bytes() {
        // "Start" keyed with 0xFF, 0xFE, 0xFD, 0xFC, 0xFB
        let raw = [5u8, b'S' ^ 0xFF, b't' ^ 0xFE, b'a' ^ 0xFD, b'r' ^ 0xFC, b't' ^ 0xFB];
        let mut cursor = ByteCursor::new(&raw);
        assert_eq!(read_pod_string(&mut cursor).expect("decode failed"), "Start");
        assert!(cursor.is_empty());
    }

    #[test]
    fn empty_string_is_a_single_zero_byte() {
        assert_eq!(encode_pod_string("").expect("encode failed"), vec![0]);
        let mut cursor = ByteCursor::new(&[0u8, 0xAA]);
        assert_eq!(read_pod_string(&mut cursor).expect("decode failed"), "");
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn short_input_is_unexpected_end() {
        let mut cursor = ByteCursor::new(&[4u8, 0x00, 0x00]);
        match read_pod_string(&mut cursor) {
            Err(PodError::UnexpectedEndOfData { needed, remaining }) => {
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected UnexpectedEndOfData, got {other:?}"),
        }
    }

    #[test]
    fn high_bytes_become_replacement_chars() {
        let raw = [2u8, 0x80 ^ 0xFF, b'A' ^ 0xFE];
        let mut cursor = ByteCursor::new(&raw);
        assert_eq!(read_pod_string(&mut cursor).expect("decode failed"), "?A");
    }

    #[test]
    fn encode_rejects_long_and_non_ascii() {
        let long = "x".repeat(MAX_POD_STRING_LEN + 1);
        assert!(matches!(
            encode_pod_string(&long),
            Err(PodError::UnsupportedLayout { .. })
        ));
        assert!(encode_pod_string(&"y".repeat(MAX_POD_STRING_LEN)).is_ok());
        assert!(matches!(
            encode_pod_string("Grünwald"),
            Err(PodError::UnsupportedLayout { .. })
        ));
    }
}
