//! # stdfkit - STDF V4 Reader and Writer
//!
//! stdfkit parses and produces STDF (Standard Test Data Format) files, the
//! binary record stream semiconductor test equipment emits. The crate
//! prioritizes:
//!
//! - **Dirty-file tolerance**: truncated records, unknown kinds, and corrupt
//!   runs are reported in-band and parsing continues where possible
//! - **Schema-driven conversion**: record layouts are declarative tables,
//!   compiled once into conversion plans and interpreted per record
//! - **Byte fidelity**: Latin-1 text and sentinel conventions round-trip
//!   exactly, so read-modify-write pipelines preserve their input
//!
//! ## Quick Start
//!
//! ```ignore
//! use stdfkit::{RecordData, StdfFile};
//!
//! let mut file = StdfFile::open("lot.stdf")?;
//! for record in file.records() {
//!     let record = record?;
//!     if let RecordData::Ptr(ptr) = &record.data {
//!         println!("test {:?} result {:?}", ptr.test_num, ptr.result);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! stdfkit uses a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Public API (StdfFile / StdfWriter)  │
//! ├─────────────────────────────────────┤
//! │ Filter Pipeline (order/summary/cache)│
//! ├─────────────────────────────────────┤
//! │   Record Pump  │  Seek & Resync     │
//! ├────────────────┼────────────────────┤
//! │  Conversion (compiled plans + IR)    │
//! ├─────────────────────────────────────┤
//! │  Layout Tables │ Typed Records      │
//! ├────────────────┼────────────────────┤
//! │ Primitive Codec (ByteReader/Writer)  │
//! ├─────────────────────────────────────┤
//! │ Stream Sources (file/gzip/mmap/mem)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Record Model
//!
//! Every parsed element is a [`Record`]: a stream offset plus a
//! [`RecordData`] variant. Data records (MIR, PTR, PRR, ...) are structs of
//! `Option` fields, because nearly every STDF field can be absent — by
//! trailing truncation, by sentinel value, or by validity flag. Marker
//! variants (start/end of stream, format errors, corrupt runs) report
//! stream-level events in-band so one consumer loop sees everything.
//!
//! ## Module Overview
//!
//! - [`codec`]: primitive field types, byte order, bit arrays
//! - [`records`]: typed record structs, V4 layout tables, markers
//! - [`schema`]: declarative field descriptors and layout validation
//! - [`ir`]: the conversion-plan tree and its visitor
//! - [`convert`]: plan compilation, the interpreters, the registry
//! - [`reader`]: streaming parser with seek-based error recovery
//! - [`filters`]: record-stream transforms (ordering, summaries, caching)
//! - [`writer`]: record-stream serialization back to STDF bytes

#[macro_use]
mod macros;

pub mod codec;
pub mod config;
pub mod convert;
pub mod filters;
pub mod ir;
pub mod reader;
pub mod records;
pub mod schema;
pub mod writer;

#[doc(hidden)]
pub use macros::macros_support;

pub use convert::ConverterFactory;
pub use reader::{Records, StdfFile, StdfFileBuilder};
pub use records::{Record, RecordData, RecordType};
pub use writer::{StdfDirectoryWriter, StdfWriter};
