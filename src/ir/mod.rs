//! # Conversion Plan IR
//!
//! The conversion layer does not decode records with per-kind Rust code.
//! It compiles each layout table into a small instruction tree once, then
//! interprets that tree per record. The split keeps the per-record hot
//! path free of layout decisions: pruning, guard placement, and skip
//! coalescing all happen at compile time.
//!
//! ```text
//!   RecordSchema --lowering--> CodeNode tree --interpret--> Record
//!                                   |
//!                                   +--print--> plan text (logging, tests)
//! ```
//!
//! - [`node`]: the instruction set
//! - [`visitor`]: the shared traversal with [`Flow`] control
//! - [`printer`]: plan rendering

mod node;
mod printer;
mod visitor;

pub use node::{CodeNode, FieldAssignment};
pub use printer::IrPrinter;
pub use visitor::{
    walk, walk_block, walk_field_assignment, walk_try_finally, CodeNodeVisitor, Flow,
};
