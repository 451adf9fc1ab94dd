//! # Stream Marker Records
//!
//! The reader reports stream-level events in-band, as records interleaved
//! with the parsed data. This keeps the consumer model uniform: a pipeline
//! filter that wants to react to the start of a file, a corrupt region, or
//! an ordering violation just matches on the record kind like any other.
//!
//! Markers never correspond to wire bytes. The writer skips them, and the
//! fail-fast boundary at the public iterator can convert the error-shaped
//! ones into `Err` values for callers that prefer early termination.

use crate::codec::Endianness;
use crate::records::RecordType;

/// First record of every parsed stream. Reports the detected byte order, or
/// `None` when the file was too short or malformed to sniff one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOfStream {
    pub endian: Option<Endianness>,
}

/// Last record of every parsed stream, emitted exactly once even after
/// unrecoverable errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfStream;

/// A structural problem with the stream itself: a bad FAR, a truncated
/// header or body, an I/O failure. `recoverable` tells the consumer whether
/// parsing continued past the problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub message: String,
    pub recoverable: bool,
}

/// A run of bytes that could not be framed as records. Emitted during
/// resynchronization with the skipped bytes attached, so a copy pipeline can
/// preserve them and a repair tool can inspect them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptData {
    pub bytes: Vec<u8>,
    pub recoverable: bool,
}

/// A record that violates the V4 file-structure grammar, reported by the
/// order-validation filter. The offending record is still delivered; this
/// marker precedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderError {
    pub record_type: RecordType,
    pub message: String,
}
