//! # Raw Record Carrier
//!
//! [`UnknownRecord`] is a framed-but-unparsed record: the type pair, the
//! byte order it was read under, and the exact body bytes. It is both the
//! input to conversion and the passthrough form for kinds nobody registered
//! a schema for, which is what makes unknown-kind streams copyable without
//! data loss.

use crate::codec::{ByteReader, Endianness};
use crate::records::RecordType;

/// A record body that has been framed but not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecord {
    record_type: RecordType,
    offset: u64,
    endian: Endianness,
    content: Vec<u8>,
}

impl UnknownRecord {
    pub fn new(record_type: RecordType, offset: u64, endian: Endianness, content: Vec<u8>) -> Self {
        Self {
            record_type,
            offset,
            endian,
            content,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Stream offset of the record header, not the body.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// A decoder positioned at the start of the body, in the byte order the
    /// record was read under.
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.content, self.endian)
    }
}
