//! # Primitive Encoder
//!
//! [`ByteWriter`] is the mirror of [`ByteReader`](super::reader::ByteReader):
//! it builds one record body in a growable buffer using the stream byte
//! order. The record framing (length prefix, type, subtype) is added by the
//! file writer after the body is complete, because the length is not known
//! until then.
//!
//! ## Strictness
//!
//! Where the reader is forgiving, the writer fails loudly:
//!
//! - strings must be Latin-1 representable (code points through U+00FF)
//! - `C*n` payloads and `B*n` arrays are limited to 255 bytes by their
//!   one-byte length prefix
//! - `C*f` values must be exactly the declared width; padding is the
//!   caller's decision, not a silent default
//!
//! Nothing in this module checks the 65535-byte record body limit; that is
//! enforced once per record when the frame is assembled.

use eyre::{ensure, Result};

use super::bits::{pack_nibbles, BitArray};
use super::endian::Endianness;
use crate::config::{MAX_BN_LENGTH, MAX_CN_LENGTH};

/// Encodes primitives into a record body.
#[derive(Debug)]
pub struct ByteWriter {
    buf: Vec<u8>,
    endian: Endianness,
}

macro_rules! scalar_writes {
    ($(($name:ident, $ty:ty)),+ $(,)?) => {
        $(
            pub fn $name(&mut self, value: $ty) {
                match self.endian {
                    Endianness::Big => self.buf.extend_from_slice(&value.to_be_bytes()),
                    Endianness::Little => self.buf.extend_from_slice(&value.to_le_bytes()),
                }
            }
        )+
    };
}

macro_rules! array_writes {
    ($(($name:ident, $elem:ident, $ty:ty)),+ $(,)?) => {
        $(
            /// Writes the elements back to back with no length prefix; the
            /// count travels in an earlier field of the record.
            pub fn $name(&mut self, values: &[$ty]) {
                for &value in values {
                    self.$elem(value);
                }
            }
        )+
    };
}

impl ByteWriter {
    pub fn new(endian: Endianness) -> Self {
        Self {
            buf: Vec::new(),
            endian,
        }
    }

    pub fn with_capacity(endian: Endianness, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            endian,
        }
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    scalar_writes!(
        (write_u16, u16),
        (write_u32, u32),
        (write_u64, u64),
        (write_i16, i16),
        (write_i32, i32),
        (write_i64, i64),
        (write_f32, f32),
        (write_f64, f64),
    );

    /// Writes a U*4 timestamp: seconds since the Unix epoch.
    pub fn write_datetime(&mut self, value: u32) {
        self.write_u32(value);
    }

    pub fn write_c1(&mut self, value: char) -> Result<()> {
        self.buf.push(latin1_byte(value)?);
        Ok(())
    }

    /// Writes a C*n string: u8 length prefix, then the Latin-1 bytes.
    pub fn write_cn(&mut self, value: &str) -> Result<()> {
        let bytes = latin1_bytes(value)?;
        ensure!(
            bytes.len() <= MAX_CN_LENGTH,
            "C*n string of {} bytes exceeds the {MAX_CN_LENGTH}-byte limit",
            bytes.len()
        );
        self.buf.push(bytes.len() as u8);
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    /// Writes a C*f fixed-width string. The value must be exactly `width`
    /// bytes once encoded.
    pub fn write_cf(&mut self, value: &str, width: usize) -> Result<()> {
        let bytes = latin1_bytes(value)?;
        ensure!(
            bytes.len() == width,
            "fixed-width string must be exactly {width} bytes, got {}",
            bytes.len()
        );
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    /// Writes a B*n byte array: u8 length prefix, then the raw bytes.
    pub fn write_bn(&mut self, value: &[u8]) -> Result<()> {
        ensure!(
            value.len() <= MAX_BN_LENGTH,
            "B*n array of {} bytes exceeds the {MAX_BN_LENGTH}-byte limit",
            value.len()
        );
        self.buf.push(value.len() as u8);
        self.buf.extend_from_slice(value);
        Ok(())
    }

    /// Writes a D*n bit array: u16 bit count, then the packed bits. The
    /// count limit is enforced when the [`BitArray`] is built.
    pub fn write_dn(&mut self, value: &BitArray) {
        self.write_u16(value.len() as u16);
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Writes packed nibble values, two per byte, low-order first.
    pub fn write_nibble_array(&mut self, values: &[u8]) -> Result<()> {
        let packed = pack_nibbles(values)?;
        self.buf.extend_from_slice(&packed);
        Ok(())
    }

    array_writes!(
        (write_u8_array, write_u8, u8),
        (write_i8_array, write_i8, i8),
        (write_u16_array, write_u16, u16),
        (write_i16_array, write_i16, i16),
        (write_u32_array, write_u32, u32),
        (write_i32_array, write_i32, i32),
        (write_f32_array, write_f32, f32),
        (write_f64_array, write_f64, f64),
    );
}

fn latin1_byte(c: char) -> Result<u8> {
    let code = c as u32;
    ensure!(
        code <= 0xFF,
        "character {c:?} is not Latin-1 representable and cannot be written"
    );
    Ok(code as u8)
}

fn latin1_bytes(s: &str) -> Result<Vec<u8>> {
    s.chars().map(latin1_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::reader::ByteReader;

    #[test]
    fn scalars_encode_in_both_byte_orders() {
        let mut big = ByteWriter::new(Endianness::Big);
        big.write_u16(0x0102);
        assert_eq!(big.as_bytes(), &[0x01, 0x02]);

        let mut little = ByteWriter::new(Endianness::Little);
        little.write_u16(0x0102);
        little.write_u32(0xAABBCCDD);
        assert_eq!(little.as_bytes(), &[0x02, 0x01, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn written_scalars_read_back() {
        let mut w = ByteWriter::new(Endianness::Big);
        w.write_i16(-300);
        w.write_f32(2.5);
        w.write_f64(-0.125);
        w.write_u64(u64::MAX - 1);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes, Endianness::Big);
        assert_eq!(r.read_i16().unwrap(), -300);
        assert_eq!(r.read_f32().unwrap(), 2.5);
        assert_eq!(r.read_f64().unwrap(), -0.125);
        assert_eq!(r.read_u64().unwrap(), u64::MAX - 1);
    }

    #[test]
    fn cn_string_gets_length_prefix() {
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_cn("lot").unwrap();
        assert_eq!(w.as_bytes(), &[3, b'l', b'o', b't']);
    }

    #[test]
    fn latin1_high_bytes_round_trip() {
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_cn("\u{B5}m").unwrap();
        assert_eq!(w.as_bytes(), &[2, 0xB5, b'm']);
    }

    #[test]
    fn non_latin1_characters_are_rejected() {
        let mut w = ByteWriter::new(Endianness::Little);
        let err = w.write_cn("温度").unwrap_err();
        assert!(err.to_string().contains("not Latin-1 representable"));
        assert!(w.write_c1('\u{2603}').is_err());
    }

    #[test]
    fn oversized_cn_string_is_rejected() {
        let mut w = ByteWriter::new(Endianness::Little);
        let err = w.write_cn(&"x".repeat(256)).unwrap_err();
        assert!(err.to_string().contains("exceeds the 255-byte limit"));
    }

    #[test]
    fn fixed_width_string_must_match_exactly() {
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_cf("AB ", 3).unwrap();
        assert_eq!(w.as_bytes(), b"AB ");
        assert!(w.write_cf("AB", 3).is_err());
        assert!(w.write_cf("ABCD", 3).is_err());
    }

    #[test]
    fn bn_bytes_get_length_prefix() {
        let mut w = ByteWriter::new(Endianness::Big);
        w.write_bn(&[0xDE, 0xAD]).unwrap();
        assert_eq!(w.as_bytes(), &[2, 0xDE, 0xAD]);
        assert!(w.write_bn(&[0u8; 256]).is_err());
    }

    #[test]
    fn dn_bits_write_count_in_stream_order() {
        let bits = BitArray::from_raw(9, &[0xFF, 0x01]).unwrap();
        let mut w = ByteWriter::new(Endianness::Big);
        w.write_dn(&bits);
        assert_eq!(w.as_bytes(), &[0x00, 0x09, 0xFF, 0x01]);
    }

    #[test]
    fn nibble_array_packs_low_order_first() {
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_nibble_array(&[0x1, 0x2, 0x3]).unwrap();
        assert_eq!(w.as_bytes(), &[0x21, 0x03]);
    }

    #[test]
    fn arrays_write_without_length_prefix() {
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u16_array(&[1, 2]);
        w.write_f32_array(&[1.0]);
        assert_eq!(w.len(), 8);
        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes, Endianness::Little);
        assert_eq!(r.read_u16_array(2, false).unwrap(), vec![1, 2]);
        assert_eq!(r.read_f32_array(1, false).unwrap(), vec![1.0]);
    }
}
