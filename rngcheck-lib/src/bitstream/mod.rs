//! A bit addressable stream over a contiguous byte region.
//!
//! Bit `i` lives in byte `i / 8` at bit position `i % 8`, with position 0 being the least
//! significant bit of the byte. Multi-byte units (short, word, long) are read and written
//! big-endian: the first byte of a unit is its most significant byte.
//!
//! Ownership of the storage is part of the type:
//!
//! * [BitBuffer] owns its bytes and zeroes them on drop,
//! * [BitView] borrows its bytes read-only, e.g. a sub-range of another stream,
//! * [BitViewMut] borrows its bytes mutably.
//!
//! Each stream has a true length (the capacity, in bits) and an optional fictitious shorter length,
//! see [BitStream::reduce_length]. Every access is checked against the *effective* length.

mod decode;
mod iter;

pub use iter::Bits;

use crate::BYTE_SIZE;
use std::sync::atomic::{compiler_fence, Ordering};
use strum::Display;
use thiserror::Error;

/// The granularity of a bit stream access.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    Bit,
    Byte,
    /// 16 bits
    Short,
    /// 32 bits
    Word,
    /// 64 bits
    Long,
}

impl Unit {
    /// The size of the unit in bits.
    pub const fn bits(self) -> usize {
        match self {
            Unit::Bit => 1,
            Unit::Byte => BYTE_SIZE,
            Unit::Short => 2 * BYTE_SIZE,
            Unit::Word => 4 * BYTE_SIZE,
            Unit::Long => 8 * BYTE_SIZE,
        }
    }
}

/// Errors of the bit stream operations. These are programmer or configuration errors and are
/// the only errors surfaced directly to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// An index (or range) exceeds the effective length of the stream.
    #[error("Index {index} is out of range, the stream holds {len} {unit}(s).")]
    IndexOutOfRange { index: usize, len: usize, unit: Unit },
    /// Two lengths that have to agree do not.
    #[error("Length mismatch: expected {expected} bytes, got {got}.")]
    LengthMismatch { expected: usize, got: usize },
    /// Input that should be decoded is malformed.
    #[error("Invalid input data: {0}")]
    DataFormat(String),
    /// A bit value other than 0 or 1.
    #[error("{0} is not a bit value, only 0 and 1 are allowed.")]
    InvalidBit(u8),
    /// A sub-stream has to start at a byte boundary.
    #[error("Bit offset {0} is not byte aligned.")]
    Unaligned(usize),
}

/// Owned byte storage. The bytes are overwritten with zeroes when the storage is dropped.
#[derive(Clone, Debug, Default)]
pub struct OwnedBytes(Box<[u8]>);

impl AsRef<[u8]> for OwnedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for OwnedBytes {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl Drop for OwnedBytes {
    fn drop(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = 0;
        }
        // keep the stores from being elided as dead
        compiler_fence(Ordering::SeqCst);
    }
}

/// A bit stream with storage `S`, see the [module docs](crate::bitstream).
#[derive(Clone, Debug)]
pub struct BitStream<S> {
    storage: S,
    bit_length: usize,
    /// 0 means: not reduced
    reduced_bit_length: usize,
    position: usize,
}

/// A stream owning its storage.
pub type BitBuffer = BitStream<OwnedBytes>;
/// A read-only stream borrowing its storage.
pub type BitView<'a> = BitStream<&'a [u8]>;
/// A writable stream borrowing its storage.
pub type BitViewMut<'a> = BitStream<&'a mut [u8]>;

/// Bytes needed to hold the given count of bits.
pub(crate) const fn byte_count(bits: usize) -> usize {
    bits.div_ceil(BYTE_SIZE)
}

/// Checks that `bytes` can hold `bit_length` bits.
fn check_capacity(bytes: usize, bit_length: usize) -> Result<(), StreamError> {
    let needed = byte_count(bit_length);
    if bytes < needed {
        Err(StreamError::LengthMismatch {
            expected: needed,
            got: bytes,
        })
    } else {
        Ok(())
    }
}

impl<'a> BitView<'a> {
    /// A read-only stream over the first `bit_length` bits of `bytes`.
    pub fn new(bytes: &'a [u8], bit_length: usize) -> Result<Self, StreamError> {
        check_capacity(bytes.len(), bit_length)?;
        Ok(Self::from_parts(&bytes[..byte_count(bit_length)], bit_length))
    }
}

impl<'a> BitViewMut<'a> {
    /// A writable stream over the first `bit_length` bits of `bytes`.
    pub fn new(bytes: &'a mut [u8], bit_length: usize) -> Result<Self, StreamError> {
        check_capacity(bytes.len(), bit_length)?;
        let len = byte_count(bit_length);
        Ok(Self::from_parts(&mut bytes[..len], bit_length))
    }
}

impl<S> BitStream<S> {
    fn from_parts(storage: S, bit_length: usize) -> Self {
        Self {
            storage,
            bit_length,
            reduced_bit_length: 0,
            position: 0,
        }
    }

    /// The true length of the stream in bits.
    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// The fictitious length set by [Self::reduce_length], or 0 if the stream is not reduced.
    pub fn reduced_bit_length(&self) -> usize {
        self.reduced_bit_length
    }

    /// The length every access is checked against: the reduced length if set, else the true length.
    pub fn effective_length(&self) -> usize {
        if self.reduced_bit_length != 0 {
            self.reduced_bit_length
        } else {
            self.bit_length
        }
    }

    /// Same as [Self::effective_length].
    pub fn len(&self) -> usize {
        self.effective_length()
    }

    pub fn is_empty(&self) -> bool {
        self.effective_length() == 0
    }

    pub fn is_reduced(&self) -> bool {
        self.reduced_bit_length != 0
    }

    /// Undoes every [Self::reduce_length].
    pub fn restore_length(&mut self) {
        self.reduced_bit_length = 0;
    }

    /// Shrinks the effective length by `delta` units without touching the storage.
    /// Reductions accumulate. Fails if the effective length would reach zero.
    pub fn reduce_length(&mut self, unit: Unit, delta: usize) -> Result<(), StreamError> {
        let effective = self.effective_length();
        let bits = delta
            .checked_mul(unit.bits())
            .filter(|&bits| bits < effective)
            .ok_or(StreamError::IndexOutOfRange {
                index: delta,
                len: effective / unit.bits(),
                unit,
            })?;

        self.reduced_bit_length = effective - bits;
        Ok(())
    }

    /// The cursor of the forward / reverse accessors.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor. The position is only checked on the next access.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// The count of complete units inside the effective length.
    pub fn unit_len(&self, unit: Unit) -> usize {
        self.effective_length() / unit.bits()
    }

    pub fn byte_len(&self) -> usize {
        self.unit_len(Unit::Byte)
    }

    pub fn short_len(&self) -> usize {
        self.unit_len(Unit::Short)
    }

    pub fn word_len(&self) -> usize {
        self.unit_len(Unit::Word)
    }

    pub fn long_len(&self) -> usize {
        self.unit_len(Unit::Long)
    }

    fn check_index(&self, index: usize, unit: Unit) -> Result<(), StreamError> {
        let len = self.unit_len(unit);
        if index < len {
            Ok(())
        } else {
            Err(StreamError::IndexOutOfRange { index, len, unit })
        }
    }

    /// Computes the bit range `(start_bit, bit_count)` of a sub-stream.
    fn sub_range(
        &self,
        unit: Unit,
        start: usize,
        length: Option<usize>,
    ) -> Result<(usize, usize), StreamError> {
        let unit_count = self.unit_len(unit);
        let out_of_range = || StreamError::IndexOutOfRange {
            index: start,
            len: unit_count,
            unit,
        };

        // both bounds are checked before multiplying, so the products cannot overflow
        let bit_count = match length {
            None if start >= unit_count => return Err(out_of_range()),
            None => self.effective_length() - start * unit.bits(),
            Some(length) => {
                let end = start.checked_add(length).ok_or_else(out_of_range)?;
                if end > unit_count {
                    return Err(out_of_range());
                }
                length * unit.bits()
            }
        };
        let start_bit = start * unit.bits();

        if start_bit % BYTE_SIZE != 0 {
            return Err(StreamError::Unaligned(start_bit));
        }

        Ok((start_bit, bit_count))
    }
}

impl<S: AsRef<[u8]>> BitStream<S> {
    /// The complete backing storage, including bytes beyond the effective length.
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_ref()
    }

    /// Unchecked (against the effective length) bit access for the tests.
    #[inline]
    pub(crate) fn get(&self, index: usize) -> bool {
        (self.storage.as_ref()[index / BYTE_SIZE] >> (index % BYTE_SIZE)) & 1 == 1
    }

    /// The bit at `index` as 0 or 1.
    pub fn bit(&self, index: usize) -> Result<u8, StreamError> {
        self.check_index(index, Unit::Bit)?;
        Ok(self.get(index) as u8)
    }

    /// Reads the bit at the cursor, then advances the cursor.
    pub fn next_bit(&mut self) -> Result<u8, StreamError> {
        let bit = self.bit(self.position)?;
        self.position += 1;
        Ok(bit)
    }

    /// Reads the bit at the cursor, then moves the cursor back. Moving back from 0 leaves the
    /// cursor at `usize::MAX`, so the next access fails.
    pub fn prev_bit(&mut self) -> Result<u8, StreamError> {
        let bit = self.bit(self.position)?;
        self.position = self.position.wrapping_sub(1);
        Ok(bit)
    }

    fn read_unit<const N: usize>(&self, index: usize, unit: Unit) -> Result<[u8; N], StreamError> {
        self.check_index(index, unit)?;
        let start = index * N;
        let mut value = [0; N];
        value.copy_from_slice(&self.storage.as_ref()[start..start + N]);
        Ok(value)
    }

    pub fn byte(&self, index: usize) -> Result<u8, StreamError> {
        self.check_index(index, Unit::Byte)?;
        Ok(self.storage.as_ref()[index])
    }

    pub fn short(&self, index: usize) -> Result<u16, StreamError> {
        self.read_unit(index, Unit::Short).map(u16::from_be_bytes)
    }

    pub fn word(&self, index: usize) -> Result<u32, StreamError> {
        self.read_unit(index, Unit::Word).map(u32::from_be_bytes)
    }

    pub fn long(&self, index: usize) -> Result<u64, StreamError> {
        self.read_unit(index, Unit::Long).map(u64::from_be_bytes)
    }

    /// A read-only stream over the same storage, with the same lengths and the cursor at 0.
    pub fn view(&self) -> BitView<'_> {
        BitStream {
            storage: self.storage.as_ref(),
            bit_length: self.bit_length,
            reduced_bit_length: self.reduced_bit_length,
            position: 0,
        }
    }

    /// A read-only sub-stream starting at unit `start`.
    ///
    /// Without `length` the sub-stream covers the rest of the effective length and `start` must
    /// be a valid unit index. With `length` it covers `length` units, which must all lie inside
    /// the effective length.
    pub fn subview(
        &self,
        unit: Unit,
        start: usize,
        length: Option<usize>,
    ) -> Result<BitView<'_>, StreamError> {
        let (start_bit, bit_count) = self.sub_range(unit, start, length)?;
        let first = start_bit / BYTE_SIZE;
        let bytes = &self.storage.as_ref()[first..first + byte_count(bit_count)];
        Ok(BitStream::from_parts(bytes, bit_count))
    }

    /// Iterates over the bits of the effective length.
    pub fn iter(&self) -> Bits<'_> {
        Bits::new(self.storage.as_ref(), self.effective_length())
    }

    /// The count of `1` bits inside the effective length.
    pub fn count_ones(&self) -> usize {
        let len = self.effective_length();
        let bytes = self.storage.as_ref();
        let full = len / BYTE_SIZE;
        let rest = len % BYTE_SIZE;

        let mut count = bytes[..full]
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum::<usize>();
        if rest != 0 {
            let mask = (1_u8 << rest) - 1;
            count += (bytes[full] & mask).count_ones() as usize;
        }
        count
    }

    /// Copies the complete storage into `other`. Both streams must have the same byte length.
    pub fn copy_into<T>(&self, other: &mut BitStream<T>) -> Result<(), StreamError>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        let source = self.storage.as_ref();
        let target = other.storage.as_mut();
        if source.len() != target.len() {
            return Err(StreamError::LengthMismatch {
                expected: target.len(),
                got: source.len(),
            });
        }
        target.copy_from_slice(source);
        Ok(())
    }

    /// An owned copy of the effective bits.
    pub fn to_buffer(&self) -> BitBuffer {
        let len = self.effective_length();
        let bytes = &self.storage.as_ref()[..byte_count(len)];
        BitStream::from_parts(OwnedBytes(bytes.into()), len)
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> BitStream<S> {
    #[inline]
    fn put(&mut self, index: usize, value: bool) {
        let byte = &mut self.storage.as_mut()[index / BYTE_SIZE];
        let mask = 1 << (index % BYTE_SIZE);
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Sets the bit at `index` to `value` (0 or 1).
    pub fn set_bit(&mut self, index: usize, value: u8) -> Result<(), StreamError> {
        let value = bit_value(value)?;
        self.check_index(index, Unit::Bit)?;
        self.put(index, value);
        Ok(())
    }

    /// Writes the bit at the cursor, then advances the cursor.
    pub fn write_next_bit(&mut self, value: u8) -> Result<(), StreamError> {
        self.set_bit(self.position, value)?;
        self.position += 1;
        Ok(())
    }

    /// Writes the bit at the cursor, then moves the cursor back.
    pub fn write_prev_bit(&mut self, value: u8) -> Result<(), StreamError> {
        self.set_bit(self.position, value)?;
        self.position = self.position.wrapping_sub(1);
        Ok(())
    }

    fn write_unit<const N: usize>(
        &mut self,
        index: usize,
        unit: Unit,
        value: [u8; N],
    ) -> Result<(), StreamError> {
        self.check_index(index, unit)?;
        let start = index * N;
        self.storage.as_mut()[start..start + N].copy_from_slice(&value);
        Ok(())
    }

    pub fn set_byte(&mut self, index: usize, value: u8) -> Result<(), StreamError> {
        self.write_unit(index, Unit::Byte, [value])
    }

    pub fn set_short(&mut self, index: usize, value: u16) -> Result<(), StreamError> {
        self.write_unit(index, Unit::Short, value.to_be_bytes())
    }

    pub fn set_word(&mut self, index: usize, value: u32) -> Result<(), StreamError> {
        self.write_unit(index, Unit::Word, value.to_be_bytes())
    }

    pub fn set_long(&mut self, index: usize, value: u64) -> Result<(), StreamError> {
        self.write_unit(index, Unit::Long, value.to_be_bytes())
    }

    /// Repeats `pattern` over the whole storage, ignoring the effective length.
    fn fill_pattern(&mut self, pattern: &[u8]) {
        self.storage
            .as_mut()
            .iter_mut()
            .zip(pattern.iter().cycle())
            .for_each(|(byte, value)| *byte = *value);
    }

    /// Sets every bit of the storage to `value` (0 or 1).
    pub fn fill_bits(&mut self, value: u8) -> Result<(), StreamError> {
        let byte = if bit_value(value)? { u8::MAX } else { 0 };
        self.fill_pattern(&[byte]);
        Ok(())
    }

    pub fn fill_bytes(&mut self, value: u8) {
        self.fill_pattern(&[value]);
    }

    pub fn fill_shorts(&mut self, value: u16) {
        self.fill_pattern(&value.to_be_bytes());
    }

    pub fn fill_words(&mut self, value: u32) {
        self.fill_pattern(&value.to_be_bytes());
    }

    /// A writable stream over the same storage, with the same lengths and the cursor at 0.
    pub fn view_mut(&mut self) -> BitViewMut<'_> {
        BitStream {
            bit_length: self.bit_length,
            reduced_bit_length: self.reduced_bit_length,
            position: 0,
            storage: self.storage.as_mut(),
        }
    }

    /// A writable sub-stream, see [Self::subview] for the range rules.
    pub fn subview_mut(
        &mut self,
        unit: Unit,
        start: usize,
        length: Option<usize>,
    ) -> Result<BitViewMut<'_>, StreamError> {
        let (start_bit, bit_count) = self.sub_range(unit, start, length)?;
        let first = start_bit / BYTE_SIZE;
        let bytes = &mut self.storage.as_mut()[first..first + byte_count(bit_count)];
        Ok(BitStream::from_parts(bytes, bit_count))
    }
}

/// Two streams are equal if their effective lengths match and all bits inside it are equal.
/// Storage beyond the effective length is ignored.
impl<S: AsRef<[u8]>, T: AsRef<[u8]>> PartialEq<BitStream<T>> for BitStream<S> {
    fn eq(&self, other: &BitStream<T>) -> bool {
        let len = self.effective_length();
        if len != other.effective_length() {
            return false;
        }

        let (left, right) = (self.as_bytes(), other.as_bytes());
        let full = len / BYTE_SIZE;
        if left[..full] != right[..full] {
            return false;
        }

        let rest = len % BYTE_SIZE;
        if rest == 0 {
            return true;
        }
        let mask = (1_u8 << rest) - 1;
        (left[full] ^ right[full]) & mask == 0
    }
}

impl<S: AsRef<[u8]>> Eq for BitStream<S> {}

impl<'a, S: AsRef<[u8]>> IntoIterator for &'a BitStream<S> {
    type Item = bool;
    type IntoIter = Bits<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn bit_value(value: u8) -> Result<bool, StreamError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StreamError::InvalidBit(other)),
    }
}
