use crate::BYTE_SIZE;
use std::iter::FusedIterator;

/// Iterator over the bits of a [BitStream](super::BitStream), see
/// [BitStream::iter](super::BitStream::iter).
#[derive(Clone, Debug)]
pub struct Bits<'a> {
    bytes: &'a [u8],
    front: usize,
    back: usize,
}

impl<'a> Bits<'a> {
    pub(super) fn new(bytes: &'a [u8], bit_length: usize) -> Self {
        Self {
            bytes,
            front: 0,
            back: bit_length,
        }
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        (self.bytes[index / BYTE_SIZE] >> (index % BYTE_SIZE)) & 1 == 1
    }
}

impl Iterator for Bits<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let bit = self.bit(self.front);
            self.front += 1;
            Some(bit)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Bits<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(self.bit(self.back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Bits<'_> {}

impl FusedIterator for Bits<'_> {}
