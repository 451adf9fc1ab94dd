//! # Field Descriptors
//!
//! A [`FieldDescriptor`] is one row of a record's layout table: where the
//! field sits in the body, what type it decodes as, how its presence is
//! determined, and which record property it lands in.
//!
//! ## Presence Variants
//!
//! | Kind          | Presence rule                                           |
//! |---------------|---------------------------------------------------------|
//! | `Plain`       | Always read; a sentinel `missing_value` means absent    |
//! | `Flagged`     | Bytes always read; a mask bit in an earlier flag byte   |
//! |               | set means the value is invalid and stays absent         |
//! | `Array`       | Element count comes from an earlier field; count zero   |
//! |               | means absent                                            |
//! | `NibbleArray` | As `Array`, two values per byte                         |
//! | `FixedString` | A `C*f` string of fixed width                           |
//! | `Dependency`  | No wire bytes; derived from a mask bit of an earlier    |
//! |               | field's value                                           |
//!
//! Flagged fields still occupy their bytes when invalid; the flag governs
//! interpretation, not layout. The writer mirrors this: an absent flagged
//! value forces the mask bits on and writes the pad value from
//! `missing_value`.

use super::field_type::FieldType;
use crate::records::FieldValue;

/// How a field's presence and shape are determined.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Plain,
    Flagged { flag_index: usize, flag_mask: u8 },
    Array { length_index: usize },
    NibbleArray { length_index: usize },
    FixedString { width: usize },
    Dependency { source_index: usize, mask: u8 },
}

/// One field of a record layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub index: usize,
    pub field_type: FieldType,
    pub kind: FieldKind,
    /// Property name on the record struct, or `None` for fields that exist
    /// only on the wire, such as array-length counts.
    pub property: Option<&'static str>,
    /// For `Plain`, the sentinel that encodes absence. For `Flagged`, the
    /// pad written when the value is invalid. Mandatory fields have none.
    pub missing_value: Option<FieldValue>,
}

impl FieldDescriptor {
    fn new(index: usize, field_type: FieldType, kind: FieldKind) -> Self {
        Self {
            index,
            field_type,
            kind,
            property: None,
            missing_value: None,
        }
    }

    pub fn plain(index: usize, field_type: FieldType) -> Self {
        Self::new(index, field_type, FieldKind::Plain)
    }

    pub fn flagged(index: usize, field_type: FieldType, flag_index: usize, flag_mask: u8) -> Self {
        Self::new(
            index,
            field_type,
            FieldKind::Flagged {
                flag_index,
                flag_mask,
            },
        )
    }

    pub fn array(index: usize, elem_type: FieldType, length_index: usize) -> Self {
        Self::new(index, elem_type, FieldKind::Array { length_index })
    }

    pub fn nibble_array(index: usize, length_index: usize) -> Self {
        Self::new(index, FieldType::N1, FieldKind::NibbleArray { length_index })
    }

    pub fn fixed_string(index: usize, width: usize) -> Self {
        Self::new(index, FieldType::Cn, FieldKind::FixedString { width })
    }

    pub fn dependency(index: usize, source_index: usize, mask: u8) -> Self {
        Self::new(
            index,
            FieldType::B1,
            FieldKind::Dependency { source_index, mask },
        )
    }

    pub fn with_property(mut self, name: &'static str) -> Self {
        self.property = Some(name);
        self
    }

    pub fn with_missing(mut self, value: FieldValue) -> Self {
        self.missing_value = Some(value);
        self
    }

    /// The earlier field this one cannot be decoded without, if any.
    pub fn source_index(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Plain | FieldKind::FixedString { .. } => None,
            FieldKind::Flagged { flag_index, .. } => Some(flag_index),
            FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } => {
                Some(length_index)
            }
            FieldKind::Dependency { source_index, .. } => Some(source_index),
        }
    }

    /// Whether the field occupies bytes in the record body.
    pub fn on_wire(&self) -> bool {
        !matches!(self.kind, FieldKind::Dependency { .. })
    }
}
