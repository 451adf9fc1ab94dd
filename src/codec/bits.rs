//! # Bit and Nibble Packing
//!
//! Two STDF field families pack sub-byte values:
//!
//! - `D*n`: a u16 bit count followed by the bits, first bit in the low-order
//!   position of the first byte. Unused bits in the final byte are zero.
//! - `N*n`: nibble arrays with no inline count (the count comes from an
//!   earlier field), first nibble in the low-order half of the first byte.
//!
//! [`BitArray`] is the in-memory form of a `D*n` value. Nibble arrays decode
//! to plain `Vec<u8>` with one value per element; the packing helpers here do
//! the byte-level work for both the reader and the writer.

use eyre::{ensure, Result};
use smallvec::SmallVec;

use crate::config::MAX_DN_BITS;

/// A variable-length bit field decoded from a `D*n` value.
///
/// Bit order matches the wire format: bit `i` lives in byte `i / 8` at bit
/// position `i % 8`. Most fields of this shape are short pin maps, so the
/// storage is inline up to 64 bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitArray {
    bit_count: usize,
    bytes: SmallVec<[u8; 8]>,
}

impl BitArray {
    /// Builds a bit array from its wire representation. The byte slice must
    /// be exactly the packed length for `bit_count` bits.
    pub fn from_raw(bit_count: usize, bytes: &[u8]) -> Result<Self> {
        ensure!(
            bit_count <= MAX_DN_BITS,
            "bit count {bit_count} exceeds D*n maximum of {MAX_DN_BITS}"
        );
        ensure!(
            bytes.len() == bit_count.div_ceil(8),
            "bit array of {bit_count} bits needs {} bytes, got {}",
            bit_count.div_ceil(8),
            bytes.len()
        );
        Ok(Self {
            bit_count,
            bytes: SmallVec::from_slice(bytes),
        })
    }

    /// Builds a bit array from individual bit values.
    pub fn from_bits(bits: &[bool]) -> Result<Self> {
        ensure!(
            bits.len() <= MAX_DN_BITS,
            "bit count {} exceeds D*n maximum of {MAX_DN_BITS}",
            bits.len()
        );
        let mut bytes = SmallVec::from_elem(0u8, bits.len().div_ceil(8));
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                bytes[i / 8] |= 1 << (i % 8);
            }
        }
        Ok(Self {
            bit_count: bits.len(),
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bit_count
    }

    pub fn is_empty(&self) -> bool {
        self.bit_count == 0
    }

    /// Reads bit `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.bit_count {
            return None;
        }
        Some(self.bytes[index / 8] & (1 << (index % 8)) != 0)
    }

    /// The packed wire bytes, `len().div_ceil(8)` of them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Packs nibble values into wire bytes, two per byte, first value in the
/// low-order half. Each value must fit in four bits.
pub fn pack_nibbles(values: &[u8]) -> Result<Vec<u8>> {
    let mut packed = vec![0u8; values.len().div_ceil(2)];
    for (i, &value) in values.iter().enumerate() {
        ensure!(value <= 0xF, "nibble value {value} at index {i} exceeds 0xF");
        packed[i / 2] |= if i % 2 == 0 { value } else { value << 4 };
    }
    Ok(packed)
}

/// Unpacks `count` nibble values from wire bytes.
pub fn unpack_nibbles(bytes: &[u8], count: usize) -> Result<Vec<u8>> {
    ensure!(
        bytes.len() >= count.div_ceil(2),
        "{count} nibbles need {} bytes, got {}",
        count.div_ceil(2),
        bytes.len()
    );
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let byte = bytes[i / 2];
        values.push(if i % 2 == 0 { byte & 0xF } else { byte >> 4 });
    }
    Ok(values)
}
