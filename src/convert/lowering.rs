//! # Plan Compilation
//!
//! Lowers a [`RecordSchema`] into the read and write plans the
//! interpreters run. All layout reasoning happens here, once per kind:
//!
//! - **Pruning.** A field restriction marks the properties a caller wants;
//!   everything else lowers to a skip instead of a decode. Count fields
//!   stay decoded when a skipped counted field still needs them to know
//!   how far to advance.
//! - **Skip coalescing.** Runs of skipped fixed-size fields collapse into
//!   one raw skip of their summed width.
//! - **Trailing-skip dropping.** Nothing after the last wanted field is
//!   worth visiting at all; those skips are not emitted.
//! - **Derived fields.** Flag-bit properties lower to assignments after
//!   the decode loop, so they are populated whenever their source byte was
//!   decoded, even when a truncated body cut the loop short.

use crate::ir::{CodeNode, FieldAssignment};
use crate::schema::{FieldDescriptor, FieldKind, RecordSchema};

/// Compiles the decode plan for `schema`, reading only the fields marked
/// in `required` (plus whatever they structurally depend on).
pub(crate) fn lower_read_plan(schema: &RecordSchema, required: &[bool]) -> CodeNode {
    let fields = schema.fields();

    // the last wire field anything wants; later fields are never visited
    let last_wanted = fields
        .iter()
        .rev()
        .find(|field| field.on_wire() && required[field.index])
        .map(|field| field.index);

    // counts must be decoded even when their array is merely skipped over
    let mut decode = required.to_vec();
    if let Some(last) = last_wanted {
        for field in &fields[..=last] {
            if let FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } =
                field.kind
            {
                decode[length_index] = true;
            }
        }
    }

    let mut body = Vec::new();
    let mut pending_skip = 0usize;
    if let Some(last) = last_wanted {
        for field in &fields[..=last] {
            if !field.on_wire() {
                continue;
            }
            if decode[field.index] {
                if pending_skip > 0 {
                    body.push(CodeNode::SkipRaw {
                        bytes: pending_skip,
                    });
                    pending_skip = 0;
                }
                body.push(lower_decode(field, required[field.index]));
            } else if let Some(bytes) = fixed_width(field) {
                pending_skip += bytes;
            } else {
                if pending_skip > 0 {
                    body.push(CodeNode::SkipRaw {
                        bytes: pending_skip,
                    });
                    pending_skip = 0;
                }
                body.push(lower_skip(field));
            }
        }
    }

    let mut nodes = vec![
        CodeNode::EnsureTypeCompatible {
            record_type: schema.record_type(),
        },
        CodeNode::InitRecord,
        CodeNode::InitReader,
        CodeNode::TryFinally {
            body: Box::new(CodeNode::Block(body)),
            cleanup: Box::new(CodeNode::Block(Vec::new())),
        },
    ];

    for field in fields {
        let FieldKind::Dependency { source_index, mask } = field.kind else {
            continue;
        };
        // table validation guarantees dependency fields name a property
        let Some(property) = field.property else {
            continue;
        };
        if required[field.index] {
            nodes.push(CodeNode::FieldAssignment(
                FieldAssignment::new(field.index).with_assign(CodeNode::AssignDependency {
                    source_index,
                    mask,
                    property,
                }),
            ));
        }
    }

    nodes.push(CodeNode::ReturnRecord);
    CodeNode::Block(nodes)
}

/// Compiles the encode plan for `schema`. Write plans are never pruned;
/// the emitter decides at run time where the record ends.
pub(crate) fn lower_write_plan(schema: &RecordSchema) -> CodeNode {
    let mut nodes = vec![CodeNode::InitWriter];
    for field in schema.fields() {
        if !field.on_wire() {
            continue;
        }
        nodes.push(match field.kind {
            FieldKind::Flagged { .. } => CodeNode::WriteFlaggedField {
                field_index: field.index,
            },
            _ => CodeNode::WriteField {
                field_index: field.index,
            },
        });
    }
    nodes.push(CodeNode::ReturnRawRecord);
    CodeNode::Block(nodes)
}

fn lower_decode(field: &FieldDescriptor, wanted: bool) -> CodeNode {
    let mut assignment = FieldAssignment::new(field.index);

    assignment = assignment.with_read(match field.kind {
        FieldKind::Plain | FieldKind::Flagged { .. } => CodeNode::ReadType {
            field_type: field.field_type,
            length_from: None,
            tolerate_short: false,
        },
        FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } => {
            CodeNode::ReadType {
                field_type: field.field_type,
                length_from: Some(length_index),
                tolerate_short: true,
            }
        }
        FieldKind::FixedString { width } => CodeNode::ReadFixedString { width },
        // derived fields are lowered outside the decode loop
        FieldKind::Dependency { .. } => unreachable!("dependency fields are not on the wire"),
    });

    // a decode without an assignment feeds later fields (counts, flags)
    let property = match field.property {
        Some(property) if wanted => property,
        _ => return CodeNode::FieldAssignment(assignment),
    };

    match field.kind {
        FieldKind::Flagged {
            flag_index,
            flag_mask,
        } => {
            assignment = assignment.with_condition(CodeNode::SkipAssignIfFlagSet {
                flag_index,
                mask: flag_mask,
            });
        }
        FieldKind::Array { .. } | FieldKind::NibbleArray { .. } => {
            assignment = assignment.with_condition(CodeNode::SkipArrayIfLengthZero);
        }
        _ => {
            if let Some(missing) = &field.missing_value {
                assignment = assignment.with_condition(CodeNode::SkipAssignIfMissingValue {
                    missing: missing.clone(),
                });
            }
        }
    }

    CodeNode::FieldAssignment(assignment.with_assign(CodeNode::AssignToProperty { property }))
}

fn lower_skip(field: &FieldDescriptor) -> CodeNode {
    let length_from = match field.kind {
        FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } => {
            Some(length_index)
        }
        _ => None,
    };
    CodeNode::FieldAssignment(FieldAssignment::new(field.index).with_read(CodeNode::SkipType {
        field_type: field.field_type,
        length_from,
    }))
}

/// Width of a field whose skip can be merged into a raw byte skip.
fn fixed_width(field: &FieldDescriptor) -> Option<usize> {
    match field.kind {
        FieldKind::Plain | FieldKind::Flagged { .. } => field.field_type.fixed_size(),
        FieldKind::FixedString { width } => Some(width),
        _ => None,
    }
}
