//! Creating owned bit streams from candidate material.

use super::{byte_count, check_capacity, BitBuffer, BitStream, OwnedBytes, StreamError};
use crate::BYTE_SIZE;

impl BitBuffer {
    /// A zeroed stream of `bit_length` bits.
    pub fn new(bit_length: usize) -> Self {
        let bytes = vec![0; byte_count(bit_length)].into_boxed_slice();
        BitStream::from_parts(OwnedBytes(bytes), bit_length)
    }

    /// Copies the first `bit_length` bits out of `bytes`. Fails if `bytes` is too short.
    pub fn from_bytes(bytes: &[u8], bit_length: usize) -> Result<Self, StreamError> {
        check_capacity(bytes.len(), bit_length)?;
        let bytes = bytes[..byte_count(bit_length)].into();
        Ok(BitStream::from_parts(OwnedBytes(bytes), bit_length))
    }

    /// Decodes a string of hexadecimal digits, two digits per byte, the first digit of each pair
    /// being the high nibble. Case is ignored.
    ///
    /// Fails with [StreamError::DataFormat] on an odd count of digits or any non-hex character.
    pub fn from_hex_str(hex: &str) -> Result<Self, StreamError> {
        if let Some((idx, c)) = hex.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(StreamError::DataFormat(format!(
                "'{c}' at byte {idx} is not a hex digit"
            )));
        }
        // only ASCII is left, so bytes and characters are the same
        if hex.len() % 2 != 0 {
            return Err(StreamError::DataFormat(format!(
                "a hex string needs an even count of digits, got {}",
                hex.len()
            )));
        }

        let digit = |c: u8| char::from(c).to_digit(16).unwrap_or_default();
        let bytes = hex
            .as_bytes()
            .chunks_exact(2)
            .map(|pair| (digit(pair[0]) << 4 | digit(pair[1])) as u8)
            .collect::<Box<[u8]>>();

        let bit_length = bytes.len() * BYTE_SIZE;
        Ok(BitStream::from_parts(OwnedBytes(bytes), bit_length))
    }

    /// Decodes a string consisting only of the characters `'0'` and `'1'`, one bit per character.
    pub fn from_ascii_str(value: &str) -> Result<Self, StreamError> {
        if let Some(c) = value.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(StreamError::DataFormat(format!(
                "'{c}' is neither '0' nor '1'"
            )));
        }

        Ok(Self::from_ascii_str_lossy(value))
    }

    /// Decodes the characters `'0'` and `'1'` of a string, skipping every other character.
    pub fn from_ascii_str_lossy(value: &str) -> Self {
        Self::from_ascii_str_lossy_with_max_length(value, usize::MAX)
    }

    /// Like [Self::from_ascii_str_lossy], but stops after `max_length` bits.
    pub fn from_ascii_str_lossy_with_max_length(value: &str, max_length: usize) -> Self {
        let bits = value
            .bytes()
            .filter_map(|c| match c {
                b'0' => Some(false),
                b'1' => Some(true),
                _ => None,
            })
            .take(max_length);

        Self::from_bits(bits)
    }

    /// Packs the given bits, the first bit becomes bit 0.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut bytes = Vec::new();
        let mut bit_length = 0;

        for bit in bits {
            let offset = bit_length % BYTE_SIZE;
            if offset == 0 {
                bytes.push(0);
            }
            if bit {
                if let Some(last) = bytes.last_mut() {
                    *last |= 1 << offset;
                }
            }
            bit_length += 1;
        }

        BitStream::from_parts(OwnedBytes(bytes.into_boxed_slice()), bit_length)
    }
}

impl From<&[bool]> for BitBuffer {
    fn from(value: &[bool]) -> Self {
        Self::from_bits(value.iter().copied())
    }
}

/// All bytes become part of the stream.
impl From<Vec<u8>> for BitBuffer {
    fn from(value: Vec<u8>) -> Self {
        let bit_length = value.len() * BYTE_SIZE;
        BitStream::from_parts(OwnedBytes(value.into_boxed_slice()), bit_length)
    }
}
