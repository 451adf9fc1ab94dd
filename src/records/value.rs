//! # Dynamic Field Values
//!
//! [`FieldValue`] is the tagged value that flows between the conversion
//! interpreter and the typed record structs. Field reads produce one, field
//! assignment stores it through [`RecordFields`](super::RecordFields), and
//! the write path pulls them back out.
//!
//! The accessors are strict: a value only converts to the exact Rust type it
//! was decoded as. The single widening exception is [`FieldValue::as_count`],
//! which accepts any unsigned scalar because array-length fields come in
//! several widths but all feed `usize` element counts.

use eyre::{bail, Result};

use crate::codec::BitArray;

/// A decoded field value of any STDF primitive type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Derived flag-bit properties only; never read from or written to the wire.
    Bool(bool),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    Bits(BitArray),
    U8s(Vec<u8>),
    U16s(Vec<u16>),
    U32s(Vec<u32>),
    I16s(Vec<i16>),
    F32s(Vec<f32>),
    F64s(Vec<f64>),
}

macro_rules! scalar_accessors {
    ($(($name:ident, $variant:ident, $ty:ty)),+ $(,)?) => {
        $(
            pub fn $name(&self) -> Result<$ty> {
                match self {
                    FieldValue::$variant(v) => Ok(*v),
                    other => bail!(
                        "expected {} value, got {}",
                        stringify!($ty),
                        other.type_name()
                    ),
                }
            }
        )+
    };
}

macro_rules! slice_accessors {
    ($(($name:ident, $variant:ident, $ty:ty)),+ $(,)?) => {
        $(
            pub fn $name(&self) -> Result<&[$ty]> {
                match self {
                    FieldValue::$variant(v) => Ok(v),
                    other => bail!(
                        "expected {} array value, got {}",
                        stringify!($ty),
                        other.type_name()
                    ),
                }
            }
        )+
    };
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::U8(_) => "u8",
            FieldValue::U16(_) => "u16",
            FieldValue::U32(_) => "u32",
            FieldValue::U64(_) => "u64",
            FieldValue::I8(_) => "i8",
            FieldValue::I16(_) => "i16",
            FieldValue::I32(_) => "i32",
            FieldValue::I64(_) => "i64",
            FieldValue::F32(_) => "f32",
            FieldValue::F64(_) => "f64",
            FieldValue::Bool(_) => "bool",
            FieldValue::Char(_) => "char",
            FieldValue::Str(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Bits(_) => "bits",
            FieldValue::U8s(_) => "u8 array",
            FieldValue::U16s(_) => "u16 array",
            FieldValue::U32s(_) => "u32 array",
            FieldValue::I16s(_) => "i16 array",
            FieldValue::F32s(_) => "f32 array",
            FieldValue::F64s(_) => "f64 array",
        }
    }

    scalar_accessors!(
        (as_u8, U8, u8),
        (as_u16, U16, u16),
        (as_u32, U32, u32),
        (as_u64, U64, u64),
        (as_i8, I8, i8),
        (as_i16, I16, i16),
        (as_i32, I32, i32),
        (as_i64, I64, i64),
        (as_f32, F32, f32),
        (as_f64, F64, f64),
        (as_bool, Bool, bool),
        (as_char, Char, char),
    );

    /// Interprets any unsigned scalar as an element count.
    pub fn as_count(&self) -> Result<usize> {
        match self {
            FieldValue::U8(v) => Ok(*v as usize),
            FieldValue::U16(v) => Ok(*v as usize),
            FieldValue::U32(v) => Ok(*v as usize),
            other => bail!("expected an unsigned count, got {}", other.type_name()),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            FieldValue::Str(s) => Ok(s),
            other => bail!("expected string value, got {}", other.type_name()),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Ok(b),
            other => bail!("expected bytes value, got {}", other.type_name()),
        }
    }

    pub fn as_bits(&self) -> Result<&BitArray> {
        match self {
            FieldValue::Bits(b) => Ok(b),
            other => bail!("expected bit array value, got {}", other.type_name()),
        }
    }

    slice_accessors!(
        (as_u8s, U8s, u8),
        (as_u16s, U16s, u16),
        (as_u32s, U32s, u32),
        (as_i16s, I16s, i16),
        (as_f32s, F32s, f32),
        (as_f64s, F64s, f64),
    );

    /// Element count for array-shaped values, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            FieldValue::U8s(v) => Some(v.len()),
            FieldValue::U16s(v) => Some(v.len()),
            FieldValue::U32s(v) => Some(v.len()),
            FieldValue::I16s(v) => Some(v.len()),
            FieldValue::F32s(v) => Some(v.len()),
            FieldValue::F64s(v) => Some(v.len()),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn list<T: std::fmt::Display>(f: &mut std::fmt::Formatter<'_>, v: &[T]) -> std::fmt::Result {
            write!(f, "[")?;
            for (i, item) in v.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            write!(f, "]")
        }

        match self {
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::U16(v) => write!(f, "{v}"),
            FieldValue::U32(v) => write!(f, "{v}"),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::I8(v) => write!(f, "{v}"),
            FieldValue::I16(v) => write!(f, "{v}"),
            FieldValue::I32(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::F32(v) => write!(f, "{v}"),
            FieldValue::F64(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Char(v) => write!(f, "{v:?}"),
            FieldValue::Str(v) => write!(f, "{v:?}"),
            FieldValue::Bytes(v) => {
                write!(f, "0x")?;
                for byte in v {
                    write!(f, "{byte:02X}")?;
                }
                Ok(())
            }
            FieldValue::Bits(v) => write!(f, "{} bits", v.len()),
            FieldValue::U8s(v) => list(f, v),
            FieldValue::U16s(v) => list(f, v),
            FieldValue::U32s(v) => list(f, v),
            FieldValue::I16s(v) => list(f, v),
            FieldValue::F32s(v) => list(f, v),
            FieldValue::F64s(v) => list(f, v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_require_the_exact_variant() {
        assert_eq!(FieldValue::U16(7).as_u16().unwrap(), 7);
        let err = FieldValue::U16(7).as_u8().unwrap_err();
        assert!(err.to_string().contains("expected u8"));
        assert!(err.to_string().contains("got u16"));
    }

    #[test]
    fn count_accepts_any_unsigned_width() {
        assert_eq!(FieldValue::U8(3).as_count().unwrap(), 3);
        assert_eq!(FieldValue::U16(300).as_count().unwrap(), 300);
        assert_eq!(FieldValue::U32(70_000).as_count().unwrap(), 70_000);
        assert!(FieldValue::I16(3).as_count().is_err());
    }

    #[test]
    fn array_len_only_for_arrays() {
        assert_eq!(FieldValue::U16s(vec![1, 2]).array_len(), Some(2));
        assert_eq!(FieldValue::U16(2).array_len(), None);
    }

    #[test]
    fn display_formats_bytes_as_hex() {
        assert_eq!(FieldValue::Bytes(vec![0xDE, 0xAD]).to_string(), "0xDEAD");
        assert_eq!(FieldValue::F32s(vec![1.5, 2.0]).to_string(), "[1.5, 2]");
        assert_eq!(FieldValue::Str("ab".into()).to_string(), "\"ab\"");
    }
}
