//! # Endian-Aware Primitive Codec
//!
//! This module is the lowest layer of the crate: it encodes and decodes the
//! STDF primitive types within a single record body, in the byte order the
//! file's FAR record declares. Nothing here knows about record schemas or
//! field semantics; it is pure byte work.
//!
//! ## Layering
//!
//! ```text
//! reader / writer          frame records, pick the stream apart
//!       │
//! convert (interpreter)    walk a field plan, decide presence/absence
//!       │
//! codec (this module)      one primitive at a time, one byte order
//! ```
//!
//! ## Module Structure
//!
//! - `endian`: CPU_TYPE mapping and the [`Endianness`] selector
//! - `reader`: [`ByteReader`], forgiving decode of one record body
//! - `writer`: [`ByteWriter`], strict encode of one record body
//! - `bits`: [`BitArray`] plus nibble packing shared by both sides

pub mod bits;
pub mod endian;
pub mod reader;
pub mod writer;

pub use bits::{pack_nibbles, unpack_nibbles, BitArray};
pub use endian::Endianness;
pub use reader::ByteReader;
pub use writer::ByteWriter;
