//! # Plan Nodes
//!
//! [`CodeNode`] is the instruction set conversion plans are built from. A
//! read plan decodes one record kind from body bytes; a write plan encodes
//! it back. Plans are compiled from a layout table once, cached, and then
//! walked per record, so the nodes carry field indices and masks rather
//! than live state.
//!
//! ## Node Families
//!
//! | Family     | Nodes                                                    |
//! |------------|----------------------------------------------------------|
//! | Structure  | `Block`, `TryFinally`, `FieldAssignment`                 |
//! | Setup      | `EnsureTypeCompatible`, `InitRecord`, `InitReader`,      |
//! |            | `InitWriter`                                             |
//! | Reading    | `ReadType`, `ReadFixedString`, `SkipRaw`, `SkipType`     |
//! | Guards     | `SkipAssignIfFlagSet`, `SkipAssignIfMissingValue`,       |
//! |            | `SkipArrayIfLengthZero`                                  |
//! | Assignment | `AssignToProperty`, `AssignDependency`                   |
//! | Writing    | `WriteField`, `WriteFlaggedField`                        |
//! | Results    | `ReturnRecord`, `ReturnRawRecord`                        |

use crate::records::{FieldValue, RecordType};
use crate::schema::FieldType;

/// One instruction of a conversion plan.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeNode {
    /// Ordered sequence. An assignment exit stops the remaining children.
    Block(Vec<CodeNode>),
    /// Fails the plan when the raw record's type pair is not the planned
    /// one.
    EnsureTypeCompatible { record_type: RecordType },
    /// Allocates the empty record the assignments fill.
    InitRecord,
    /// Positions a cursor at the start of the record body.
    InitReader,
    /// Runs `body`, then `cleanup` no matter how `body` ended. An early
    /// assignment exit stops propagating here.
    TryFinally {
        body: Box<CodeNode>,
        cleanup: Box<CodeNode>,
    },
    /// Decodes one field: an optional read leg, guard conditions that can
    /// suppress the assignment, and an optional assignment leg. Fields
    /// without a read leg consume no bytes.
    FieldAssignment(FieldAssignment),
    /// Advances the cursor over a fixed number of bytes.
    SkipRaw { bytes: usize },
    /// Advances the cursor over one value without decoding it. Counted
    /// shapes take their element count from an earlier field.
    SkipType {
        field_type: FieldType,
        length_from: Option<usize>,
    },
    /// Decodes one value. `tolerate_short` lets a counted shape come up
    /// short at the end of a truncated body instead of failing.
    ReadType {
        field_type: FieldType,
        length_from: Option<usize>,
        tolerate_short: bool,
    },
    /// Decodes a fixed-width string.
    ReadFixedString { width: usize },
    /// Guard: suppress the assignment when the named flag byte has any of
    /// the mask bits set.
    SkipAssignIfFlagSet { flag_index: usize, mask: u8 },
    /// Guard: suppress the assignment when the decoded value equals the
    /// missing-value sentinel.
    SkipAssignIfMissingValue { missing: FieldValue },
    /// Guard: suppress the assignment when the decoded array has no
    /// elements.
    SkipArrayIfLengthZero,
    /// Stores the decoded value into the record property.
    AssignToProperty { property: &'static str },
    /// Derives a boolean property from one mask bit of an earlier field's
    /// decoded value.
    AssignDependency {
        source_index: usize,
        mask: u8,
        property: &'static str,
    },
    /// Yields the filled record.
    ReturnRecord,
    /// Allocates the body writer.
    InitWriter,
    /// Encodes one field, substituting its sentinel when the property is
    /// unset.
    WriteField { field_index: usize },
    /// Encodes one flag-guarded field, writing its pad value when the
    /// property is unset.
    WriteFlaggedField { field_index: usize },
    /// Yields the encoded body bytes.
    ReturnRawRecord,
}

/// The three legs of one field's decode step.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub field_index: usize,
    /// `None` for derived fields that consume no bytes.
    pub read: Option<Box<CodeNode>>,
    pub conditions: Vec<CodeNode>,
    /// `None` for wire-only fields such as counts and flag bytes.
    pub assign: Option<Box<CodeNode>>,
}

impl FieldAssignment {
    pub fn new(field_index: usize) -> Self {
        Self {
            field_index,
            read: None,
            conditions: Vec::new(),
            assign: None,
        }
    }

    pub fn with_read(mut self, read: CodeNode) -> Self {
        self.read = Some(Box::new(read));
        self
    }

    pub fn with_condition(mut self, condition: CodeNode) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_assign(mut self, assign: CodeNode) -> Self {
        self.assign = Some(Box::new(assign));
        self
    }
}
