//! Modified UTF-8 as stored in `CONSTANT_Utf8` entries.
//!
//! NUL is written as `C0 80` and supplementary characters as a surrogate pair,
//! each half encoded as its own three-byte sequence.

use crate::error::{Error, Result};

/// Decode a modified UTF-8 byte run into a string.
///
/// Unpaired surrogates become U+FFFD.
pub(crate) fn decode(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut offset = 0;
    while offset < bytes.len() {
        let lead = bytes[offset];
        match lead {
            0x00 => return Err(Error::malformed(format!("raw NUL in utf8 at byte {offset}"))),
            0x01..=0x7f => {
                units.push(u16::from(lead));
                offset += 1;
            }
            0xc0..=0xdf => {
                let second = continuation(bytes, offset, 1)?;
                units.push((u16::from(lead & 0x1f) << 6) | u16::from(second));
                offset += 2;
            }
            0xe0..=0xef => {
                let second = continuation(bytes, offset, 1)?;
                let third = continuation(bytes, offset, 2)?;
                units.push(
                    (u16::from(lead & 0x0f) << 12)
                        | (u16::from(second) << 6)
                        | u16::from(third),
                );
                offset += 3;
            }
            _ => {
                return Err(Error::malformed(format!(
                    "invalid utf8 lead byte 0x{lead:02x} at byte {offset}"
                )));
            }
        }
    }
    Ok(char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect())
}

fn continuation(bytes: &[u8], offset: usize, position: usize) -> Result<u8> {
    match bytes.get(offset + position) {
        Some(byte) if byte & 0xc0 == 0x80 => Ok(byte & 0x3f),
        Some(byte) => Err(Error::malformed(format!(
            "invalid utf8 continuation byte 0x{byte:02x} at byte {}",
            offset + position
        ))),
        None => Err(Error::malformed(format!(
            "truncated utf8 sequence at byte {offset}"
        ))),
    }
}

/// Encode a string as modified UTF-8.
#[cfg(test)]
pub(crate) fn encode(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => bytes.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                bytes.push(0xc0 | (unit >> 6) as u8);
                bytes.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                bytes.push(0xe0 | (unit >> 12) as u8);
                bytes.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                bytes.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    bytes
}
