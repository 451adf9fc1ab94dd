//! # Declarative Record Layouts
//!
//! This module describes record bodies as data instead of code. Each record
//! kind has a [`RecordSchema`]: an ordered table of [`FieldDescriptor`]s
//! covering the field's wire type, its presence rule, and the property it
//! populates. The conversion compiler consumes these tables; nothing else
//! in the crate hard-codes a field offset.
//!
//! ## Why Tables?
//!
//! STDF records are positional with three interlocking presence mechanisms:
//! trailing truncation, sentinel values, and validity flag bits, plus array
//! lengths carried by earlier fields. Encoding those rules per field in a
//! table keeps each record's quirks reviewable in one screen and lets the
//! same lowering logic serve all kinds, including caller-registered custom
//! ones.
//!
//! ## Module Structure
//!
//! - `field_type`: the STDF primitive type codes
//! - `descriptor`: per-field layout rows and presence variants
//! - `record_schema`: the validated table plus requirement analysis

pub mod descriptor;
pub mod field_type;
pub mod record_schema;

pub use descriptor::{FieldDescriptor, FieldKind};
pub use field_type::FieldType;
pub use record_schema::{MakeRecord, RecordSchema};
