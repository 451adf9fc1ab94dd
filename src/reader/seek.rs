//! # Resynchronization
//!
//! When the pump loses the record framing it rewinds to its watermark and
//! scans forward for the next believable record boundary. The scan is
//! pluggable: each [`SeekAlgorithm`] inspects a window that starts at the
//! rewind point and grows one chunk at a time, answering either
//! [`SeekScan::NeedMore`] or [`SeekScan::Resync`]. Bytes before the resync
//! point are the corrupt residue and surface as one corrupt-data record.
//!
//! ```text
//!  watermark                      resync point
//!     │                               │
//!     ▼                               ▼
//!     ┌───────────────────────────────┬──────────────┬─────
//!     │ corrupt residue (one record)  │ next record  │ ...
//!     └───────────────────────────────┴──────────────┴─────
//!     ◀────────── scan window, grows right ──────────▶
//! ```

use std::sync::Arc;

use crate::codec::Endianness;
use crate::config::REC_HEADER_SIZE;
use crate::convert::ConverterFactory;
use crate::records::RecordHeader;

/// Verdict from scanning the resynchronization window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekScan {
    /// No boundary found yet; grow the window and scan again.
    NeedMore,
    /// A record boundary sits `at` bytes into the window. Everything
    /// before it is corrupt residue.
    Resync { at: usize },
}

/// A strategy for finding the next record boundary in corrupt data.
///
/// `exhausted` is set once the stream has no more bytes to offer, which
/// lets an algorithm accept a candidate that reaches exactly to the end
/// of the window instead of waiting for confirmation that cannot come.
pub trait SeekAlgorithm: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Scans the window for a plausible record boundary.
    fn scan(&self, window: &[u8], endian: Endianness, exhausted: bool) -> SeekScan;
}

/// Finds boundaries by scanning for a registered header whose declared
/// length lands on another registered header.
///
/// Four header bytes are cheap to forge by accident, so a lone candidate
/// does not count: the record it frames must be followed by a second
/// registered header, or reach exactly to the end of an exhausted stream.
/// Unregistered type pairs inside the garbage are skipped the same way
/// the header that triggered the seek was.
pub struct HeaderSeeker {
    factory: Arc<ConverterFactory>,
}

impl HeaderSeeker {
    pub fn new(factory: Arc<ConverterFactory>) -> Self {
        Self { factory }
    }

    /// Frame end for the header at `pos`, when its type pair is registered
    /// and the window holds all four header bytes.
    fn candidate_end(&self, window: &[u8], pos: usize, endian: Endianness) -> Option<usize> {
        let bytes = window.get(pos..pos + REC_HEADER_SIZE)?;
        let header = RecordHeader::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]], endian);
        if !self.factory.is_registered(header.record_type) {
            return None;
        }
        Some(pos + REC_HEADER_SIZE + header.length as usize)
    }
}

impl SeekAlgorithm for HeaderSeeker {
    fn name(&self) -> &'static str {
        "header-seeker"
    }

    fn scan(&self, window: &[u8], endian: Endianness, exhausted: bool) -> SeekScan {
        if window.len() < REC_HEADER_SIZE {
            return SeekScan::NeedMore;
        }
        for at in 0..=window.len() - REC_HEADER_SIZE {
            let Some(end) = self.candidate_end(window, at, endian) else {
                continue;
            };
            if end > window.len() {
                if exhausted {
                    // The frame provably runs past the end of the stream.
                    continue;
                }
                return SeekScan::NeedMore;
            }
            if exhausted {
                // A frame that fits is the best remaining evidence; any
                // trailing junk becomes the next corrupt run.
                return SeekScan::Resync { at };
            }
            if end + REC_HEADER_SIZE > window.len() {
                return SeekScan::NeedMore;
            }
            if self.candidate_end(window, end, endian).is_some() {
                return SeekScan::Resync { at };
            }
        }
        SeekScan::NeedMore
    }
}
