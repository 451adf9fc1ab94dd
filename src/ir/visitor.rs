//! # Plan Traversal
//!
//! [`CodeNodeVisitor`] is the walk interface over [`CodeNode`] trees. Every
//! method has a default: containers walk their children through the
//! `walk_*` free functions, leaves do nothing and continue. A backend
//! overrides only the nodes it gives meaning to, so the interpreter, the
//! emitter, and the printer share one traversal.
//!
//! Control flow is the [`Flow`] value every visit returns.
//! [`Flow::ExitAssignments`] unwinds the enclosing blocks until a
//! `TryFinally` absorbs it; that is how a truncated body stops decoding
//! mid-table while the record still gets returned.

use eyre::Result;

use super::node::{CodeNode, FieldAssignment};
use crate::records::{FieldValue, RecordType};
use crate::schema::FieldType;

/// Outcome of visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking.
    Continue,
    /// Stop the enclosing assignment sequence; absorbed by `TryFinally`.
    ExitAssignments,
}

#[allow(unused_variables)]
pub trait CodeNodeVisitor: Sized {
    fn visit(&mut self, node: &CodeNode) -> Result<Flow> {
        walk(self, node)
    }

    fn visit_block(&mut self, nodes: &[CodeNode]) -> Result<Flow> {
        walk_block(self, nodes)
    }

    fn visit_try_finally(&mut self, body: &CodeNode, cleanup: &CodeNode) -> Result<Flow> {
        walk_try_finally(self, body, cleanup)
    }

    fn visit_field_assignment(&mut self, assignment: &FieldAssignment) -> Result<Flow> {
        walk_field_assignment(self, assignment)
    }

    fn visit_ensure_type_compatible(&mut self, record_type: RecordType) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_init_record(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_init_reader(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_skip_raw(&mut self, bytes: usize) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_skip_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
    ) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_read_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
        tolerate_short: bool,
    ) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_read_fixed_string(&mut self, width: usize) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_flag_set(&mut self, flag_index: usize, mask: u8) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_missing_value(&mut self, missing: &FieldValue) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_skip_array_if_length_zero(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_assign_to_property(&mut self, property: &'static str) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_assign_dependency(
        &mut self,
        source_index: usize,
        mask: u8,
        property: &'static str,
    ) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_return_record(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_init_writer(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_write_field(&mut self, field_index: usize) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_write_flagged_field(&mut self, field_index: usize) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    fn visit_return_raw_record(&mut self) -> Result<Flow> {
        Ok(Flow::Continue)
    }
}

/// Dispatches one node to its visit method.
pub fn walk<V: CodeNodeVisitor>(visitor: &mut V, node: &CodeNode) -> Result<Flow> {
    match node {
        CodeNode::Block(nodes) => visitor.visit_block(nodes),
        CodeNode::EnsureTypeCompatible { record_type } => {
            visitor.visit_ensure_type_compatible(*record_type)
        }
        CodeNode::InitRecord => visitor.visit_init_record(),
        CodeNode::InitReader => visitor.visit_init_reader(),
        CodeNode::TryFinally { body, cleanup } => visitor.visit_try_finally(body, cleanup),
        CodeNode::FieldAssignment(assignment) => visitor.visit_field_assignment(assignment),
        CodeNode::SkipRaw { bytes } => visitor.visit_skip_raw(*bytes),
        CodeNode::SkipType {
            field_type,
            length_from,
        } => visitor.visit_skip_type(*field_type, *length_from),
        CodeNode::ReadType {
            field_type,
            length_from,
            tolerate_short,
        } => visitor.visit_read_type(*field_type, *length_from, *tolerate_short),
        CodeNode::ReadFixedString { width } => visitor.visit_read_fixed_string(*width),
        CodeNode::SkipAssignIfFlagSet { flag_index, mask } => {
            visitor.visit_skip_assign_if_flag_set(*flag_index, *mask)
        }
        CodeNode::SkipAssignIfMissingValue { missing } => {
            visitor.visit_skip_assign_if_missing_value(missing)
        }
        CodeNode::SkipArrayIfLengthZero => visitor.visit_skip_array_if_length_zero(),
        CodeNode::AssignToProperty { property } => visitor.visit_assign_to_property(property),
        CodeNode::AssignDependency {
            source_index,
            mask,
            property,
        } => visitor.visit_assign_dependency(*source_index, *mask, property),
        CodeNode::ReturnRecord => visitor.visit_return_record(),
        CodeNode::InitWriter => visitor.visit_init_writer(),
        CodeNode::WriteField { field_index } => visitor.visit_write_field(*field_index),
        CodeNode::WriteFlaggedField { field_index } => {
            visitor.visit_write_flagged_field(*field_index)
        }
        CodeNode::ReturnRawRecord => visitor.visit_return_raw_record(),
    }
}

/// Walks children in order, stopping on an assignment exit.
pub fn walk_block<V: CodeNodeVisitor>(visitor: &mut V, nodes: &[CodeNode]) -> Result<Flow> {
    for node in nodes {
        if visitor.visit(node)? == Flow::ExitAssignments {
            return Ok(Flow::ExitAssignments);
        }
    }
    Ok(Flow::Continue)
}

/// Walks `body`, then `cleanup` regardless of how `body` ended. A body
/// error wins over a cleanup error; an assignment exit ends here.
pub fn walk_try_finally<V: CodeNodeVisitor>(
    visitor: &mut V,
    body: &CodeNode,
    cleanup: &CodeNode,
) -> Result<Flow> {
    let body_flow = visitor.visit(body);
    let cleanup_flow = visitor.visit(cleanup);
    body_flow?;
    cleanup_flow?;
    Ok(Flow::Continue)
}

/// Walks an assignment's legs in read, conditions, assign order.
pub fn walk_field_assignment<V: CodeNodeVisitor>(
    visitor: &mut V,
    assignment: &FieldAssignment,
) -> Result<Flow> {
    if let Some(read) = &assignment.read {
        if visitor.visit(read)? == Flow::ExitAssignments {
            return Ok(Flow::ExitAssignments);
        }
    }
    for condition in &assignment.conditions {
        if visitor.visit(condition)? == Flow::ExitAssignments {
            return Ok(Flow::ExitAssignments);
        }
    }
    if let Some(assign) = &assignment.assign {
        if visitor.visit(assign)? == Flow::ExitAssignments {
            return Ok(Flow::ExitAssignments);
        }
    }
    Ok(Flow::Continue)
}
