//! # Schema-Driven Conversion
//!
//! Turns raw record bodies into typed records and back. The pipeline has
//! three stages, split one per module:
//!
//! ```text
//! RecordSchema ──lowering──▶ CodeNode plan ──execute──▶ typed Record
//!                                   │
//!                                   └───────emit──────▶ body bytes
//! ```
//!
//! - `lowering` compiles a layout table into a read or write plan,
//!   applying property restrictions and skip coalescing
//! - `execute` interprets a read plan over one body, handling truncation,
//!   sentinels, and flag-guarded fields
//! - `emit` interprets a write plan over one typed record, deriving the
//!   counts and flag bytes no caller sets by hand
//! - `factory` is the registry that caches one compiled plan per kind and
//!   dispatches the GDR's custom codec
//!
//! The plans themselves are [`crate::ir`] trees; keeping compilation apart
//! from interpretation means the layout logic runs once per kind while the
//! per-record loop stays a flat visitor walk.

mod emit;
mod execute;
mod factory;
pub(crate) mod lowering;

pub use factory::{ConvertFn, Converter, ConverterFactory, UnconvertFn, Unconverter};
