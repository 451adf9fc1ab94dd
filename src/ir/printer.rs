//! One-line-per-node plan rendering, used by plan-construction logging and
//! by tests that pin down plan shapes.

use eyre::Result;

use super::node::{CodeNode, FieldAssignment};
use super::visitor::{walk_field_assignment, CodeNodeVisitor, Flow};
use crate::records::{FieldValue, RecordType};
use crate::schema::FieldType;

/// Renders a plan as indented text, two spaces per level.
pub struct IrPrinter {
    lines: Vec<String>,
    depth: usize,
}

impl IrPrinter {
    /// Renders `plan` to its text form.
    pub fn print(plan: &CodeNode) -> String {
        let mut printer = IrPrinter {
            lines: Vec::new(),
            depth: 0,
        };
        // rendering never fails; the Result is the visitor contract
        printer
            .visit(plan)
            .unwrap_or_else(|_| unreachable!("printing a plan cannot fail"));
        printer.lines.join("\n")
    }

    fn line(&mut self, text: impl Into<String>) {
        let mut rendered = "  ".repeat(self.depth);
        rendered.push_str(&text.into());
        self.lines.push(rendered);
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }
}

impl CodeNodeVisitor for IrPrinter {
    fn visit_block(&mut self, nodes: &[CodeNode]) -> Result<Flow> {
        self.line("block");
        self.nested(|printer| {
            for node in nodes {
                printer.visit(node)?;
            }
            Ok(Flow::Continue)
        })
    }

    fn visit_try_finally(&mut self, body: &CodeNode, cleanup: &CodeNode) -> Result<Flow> {
        self.line("try");
        self.nested(|printer| printer.visit(body))?;
        self.line("finally");
        self.nested(|printer| printer.visit(cleanup))?;
        Ok(Flow::Continue)
    }

    fn visit_field_assignment(&mut self, assignment: &FieldAssignment) -> Result<Flow> {
        self.line(format!("field {}", assignment.field_index));
        self.nested(|printer| walk_field_assignment(printer, assignment))
    }

    fn visit_ensure_type_compatible(&mut self, record_type: RecordType) -> Result<Flow> {
        self.line(format!("ensure-type {record_type}"));
        Ok(Flow::Continue)
    }

    fn visit_init_record(&mut self) -> Result<Flow> {
        self.line("init-record");
        Ok(Flow::Continue)
    }

    fn visit_init_reader(&mut self) -> Result<Flow> {
        self.line("init-reader");
        Ok(Flow::Continue)
    }

    fn visit_skip_raw(&mut self, bytes: usize) -> Result<Flow> {
        self.line(format!("skip {bytes} bytes"));
        Ok(Flow::Continue)
    }

    fn visit_skip_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
    ) -> Result<Flow> {
        match length_from {
            Some(index) => self.line(format!("skip {field_type} x field {index}")),
            None => self.line(format!("skip {field_type}")),
        }
        Ok(Flow::Continue)
    }

    fn visit_read_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
        tolerate_short: bool,
    ) -> Result<Flow> {
        let mut text = match length_from {
            Some(index) => format!("read {field_type} x field {index}"),
            None => format!("read {field_type}"),
        };
        if tolerate_short {
            text.push_str(" (tolerant)");
        }
        self.line(text);
        Ok(Flow::Continue)
    }

    fn visit_read_fixed_string(&mut self, width: usize) -> Result<Flow> {
        self.line(format!("read C*f width {width}"));
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_flag_set(&mut self, flag_index: usize, mask: u8) -> Result<Flow> {
        self.line(format!("unless field {flag_index} & {mask:#04x}"));
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_missing_value(&mut self, missing: &FieldValue) -> Result<Flow> {
        self.line(format!("unless value {missing}"));
        Ok(Flow::Continue)
    }

    fn visit_skip_array_if_length_zero(&mut self) -> Result<Flow> {
        self.line("unless empty");
        Ok(Flow::Continue)
    }

    fn visit_assign_to_property(&mut self, property: &'static str) -> Result<Flow> {
        self.line(format!("assign {property}"));
        Ok(Flow::Continue)
    }

    fn visit_assign_dependency(
        &mut self,
        source_index: usize,
        mask: u8,
        property: &'static str,
    ) -> Result<Flow> {
        self.line(format!(
            "derive {property} from field {source_index} & {mask:#04x}"
        ));
        Ok(Flow::Continue)
    }

    fn visit_return_record(&mut self) -> Result<Flow> {
        self.line("return record");
        Ok(Flow::Continue)
    }

    fn visit_init_writer(&mut self) -> Result<Flow> {
        self.line("init-writer");
        Ok(Flow::Continue)
    }

    fn visit_write_field(&mut self, field_index: usize) -> Result<Flow> {
        self.line(format!("write field {field_index}"));
        Ok(Flow::Continue)
    }

    fn visit_write_flagged_field(&mut self, field_index: usize) -> Result<Flow> {
        self.line(format!("write flagged field {field_index}"));
        Ok(Flow::Continue)
    }

    fn visit_return_raw_record(&mut self) -> Result<Flow> {
        self.line("return body");
        Ok(Flow::Continue)
    }
}
