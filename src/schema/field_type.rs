//! # Field Type Codes
//!
//! [`FieldType`] names the STDF primitive a field decodes as, using the
//! standard's own type mnemonics. The digit is a byte count except in the
//! variable-length families (`Cn`, `Bn`, `Dn`) and the nibble type `N1`.

use crate::records::FieldValue;

/// The on-wire type of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// One-byte unsigned integer.
    U1,
    /// Two-byte unsigned integer.
    U2,
    /// Four-byte unsigned integer. Also used for epoch-second timestamps.
    U4,
    /// Eight-byte unsigned integer.
    U8,
    /// One-byte signed integer.
    I1,
    /// Two-byte signed integer.
    I2,
    /// Four-byte signed integer.
    I4,
    /// Eight-byte signed integer.
    I8,
    /// Four-byte IEEE 754 float.
    R4,
    /// Eight-byte IEEE 754 float.
    R8,
    /// One byte of flag bits.
    B1,
    /// One Latin-1 character.
    C1,
    /// Variable-length string, u8 length prefix.
    Cn,
    /// Variable-length byte array, u8 length prefix.
    Bn,
    /// Variable-length bit array, u16 bit-count prefix.
    Dn,
    /// One nibble. Only meaningful inside nibble arrays, where values pack
    /// two per byte.
    N1,
}

impl FieldType {
    /// Encoded size in bytes, or `None` for the variable-length types and
    /// the sub-byte nibble type.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldType::U1 | FieldType::I1 | FieldType::B1 | FieldType::C1 => Some(1),
            FieldType::U2 | FieldType::I2 => Some(2),
            FieldType::U4 | FieldType::I4 | FieldType::R4 => Some(4),
            FieldType::U8 | FieldType::I8 | FieldType::R8 => Some(8),
            FieldType::Cn | FieldType::Bn | FieldType::Dn | FieldType::N1 => None,
        }
    }

    /// Whether counted arrays of this element type are supported. The set
    /// matches the array shapes V4 records actually use.
    pub fn supports_array(self) -> bool {
        matches!(
            self,
            FieldType::U1 | FieldType::U2 | FieldType::U4 | FieldType::I2 | FieldType::R4 | FieldType::R8
        )
    }

    /// Whether an unsigned value of this type can serve as an array length.
    pub fn is_count(self) -> bool {
        matches!(self, FieldType::U1 | FieldType::U2 | FieldType::U4)
    }

    /// Whether `value` is the in-memory shape this scalar type decodes to.
    pub fn matches_scalar(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::U1, FieldValue::U8(_))
                | (FieldType::U2, FieldValue::U16(_))
                | (FieldType::U4, FieldValue::U32(_))
                | (FieldType::U8, FieldValue::U64(_))
                | (FieldType::I1, FieldValue::I8(_))
                | (FieldType::I2, FieldValue::I16(_))
                | (FieldType::I4, FieldValue::I32(_))
                | (FieldType::I8, FieldValue::I64(_))
                | (FieldType::R4, FieldValue::F32(_))
                | (FieldType::R8, FieldValue::F64(_))
                | (FieldType::B1, FieldValue::U8(_))
                | (FieldType::C1, FieldValue::Char(_))
                | (FieldType::Cn, FieldValue::Str(_))
                | (FieldType::Bn, FieldValue::Bytes(_))
                | (FieldType::Dn, FieldValue::Bits(_))
        )
    }

    /// Whether `value` is the in-memory shape an array of this element type
    /// decodes to. Nibble arrays decode to u8 arrays.
    pub fn matches_array(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::U1, FieldValue::U8s(_))
                | (FieldType::N1, FieldValue::U8s(_))
                | (FieldType::U2, FieldValue::U16s(_))
                | (FieldType::U4, FieldValue::U32s(_))
                | (FieldType::I2, FieldValue::I16s(_))
                | (FieldType::R4, FieldValue::F32s(_))
                | (FieldType::R8, FieldValue::F64s(_))
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::U1 => "U*1",
            FieldType::U2 => "U*2",
            FieldType::U4 => "U*4",
            FieldType::U8 => "U*8",
            FieldType::I1 => "I*1",
            FieldType::I2 => "I*2",
            FieldType::I4 => "I*4",
            FieldType::I8 => "I*8",
            FieldType::R4 => "R*4",
            FieldType::R8 => "R*8",
            FieldType::B1 => "B*1",
            FieldType::C1 => "C*1",
            FieldType::Cn => "C*n",
            FieldType::Bn => "B*n",
            FieldType::Dn => "D*n",
            FieldType::N1 => "N*1",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
