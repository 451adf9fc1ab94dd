//! # STDF Format Constants
//!
//! This module centralizes the wire-format constants shared by the codec, the
//! streaming reader, and the writer. Constants that depend on each other are
//! co-located to prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! REC_HEADER_SIZE (4 bytes: REC_LEN u16 + REC_TYP u8 + REC_SUB u8)
//!       │
//!       ├─> FAR_RECORD_SIZE (derived: REC_HEADER_SIZE + FAR_BODY_SIZE)
//!       │     The reader sniffs exactly this many bytes before it knows
//!       │     the byte order of the rest of the file.
//!       │
//!       └─> MAX_RECORD_BODY (65535, the REC_LEN field is a u16)
//!
//! SEEK_CHUNK_SIZE (4096)
//!       │
//!       └─> MAX_SEEK_WINDOW (must be >=)
//!             Resynchronization grows its scan window one chunk at a time.
//!             When the window would exceed MAX_SEEK_WINDOW the run is
//!             declared unrecoverable instead of buffering without bound.
//! ```
//!
//! ## Critical Invariants
//!
//! These invariants are enforced by compile-time assertions:
//!
//! 1. `FAR_RECORD_SIZE == REC_HEADER_SIZE + FAR_BODY_SIZE` (derived correctly)
//! 2. `SEEK_CHUNK_SIZE <= MAX_SEEK_WINDOW` (seek makes progress before giving up)
//! 3. A maximal `D*n` field fits in a maximal record body
//!
//! ## Usage
//!
//! Import constants from this module rather than defining them locally:
//!
//! ```ignore
//! use crate::config::{REC_HEADER_SIZE, MAX_RECORD_BODY};
//! ```

// ============================================================================
// RECORD FRAMING
// These define the physical unit of the file: [REC_LEN][REC_TYP][REC_SUB][body]
// ============================================================================

/// Size of the record header in bytes.
/// Every record begins with a little- or big-endian u16 body length followed
/// by the one-byte type and subtype codes.
pub const REC_HEADER_SIZE: usize = 4;

/// Size of the FAR (File Attributes Record) body in bytes: CPU_TYPE + STDF_VER.
pub const FAR_BODY_SIZE: usize = 2;

/// Size of a complete FAR record on the wire.
/// The first record of every STDF file must be exactly this long; the reader
/// sniffs these bytes to establish the byte order of everything that follows.
pub const FAR_RECORD_SIZE: usize = REC_HEADER_SIZE + FAR_BODY_SIZE;

/// Body length the FAR header must declare.
pub const EXPECTED_FAR_LENGTH: u16 = FAR_BODY_SIZE as u16;

/// Maximum record body length. REC_LEN is a u16, so this is not configurable.
pub const MAX_RECORD_BODY: usize = u16::MAX as usize;

const _: () = assert!(
    FAR_RECORD_SIZE == REC_HEADER_SIZE + FAR_BODY_SIZE,
    "FAR_RECORD_SIZE derivation mismatch"
);

// ============================================================================
// CPU TYPE CODES
// CPU_TYPE is the first body byte of the FAR and selects the byte order
// ============================================================================

/// CPU_TYPE code for DEC VAX processors. Big-endian.
pub const CPU_TYPE_VAX: u8 = 0;

/// CPU_TYPE code for Sun 680xx-series processors. Big-endian.
pub const CPU_TYPE_SUN: u8 = 1;

/// CPU_TYPE code written for little-endian files. Any value above
/// [`CPU_TYPE_SUN`] means little-endian on read.
pub const CPU_TYPE_X86: u8 = 2;

/// STDF_VER value for version 4 of the format, the only version this crate
/// has schemas for. Other versions still parse structurally.
pub const STDF_VERSION_V4: u8 = 4;

// ============================================================================
// VARIABLE-LENGTH FIELD LIMITS
// These are fixed by the width of each field's on-wire length prefix
// ============================================================================

/// Maximum byte length of a `C*n` string. The length prefix is a u8.
pub const MAX_CN_LENGTH: usize = u8::MAX as usize;

/// Maximum byte length of a `B*n` byte array. The length prefix is a u8.
pub const MAX_BN_LENGTH: usize = u8::MAX as usize;

/// Maximum bit count of a `D*n` bit array. The length prefix is a u16
/// counting bits, not bytes.
pub const MAX_DN_BITS: usize = u16::MAX as usize;

const _: () = assert!(
    MAX_DN_BITS.div_ceil(8) + 2 <= MAX_RECORD_BODY,
    "a maximal D*n field must fit in a record body"
);

// ============================================================================
// STREAMING READER CONFIGURATION
// ============================================================================

/// Buffer size for file-backed stream sources.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Leading bytes of every gzip member, used to sniff compressed inputs
/// regardless of file extension.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Chunk size used to grow the scan window during resynchronization.
pub const SEEK_CHUNK_SIZE: usize = 4096;

/// Upper bound on the resynchronization scan window. When a corrupt run
/// exceeds this without any seek algorithm finding a record boundary, the
/// remainder of the stream is reported as unrecoverable.
pub const MAX_SEEK_WINDOW: usize = 16 * 1024 * 1024;

const _: () = assert!(
    SEEK_CHUNK_SIZE <= MAX_SEEK_WINDOW,
    "SEEK_CHUNK_SIZE must be <= MAX_SEEK_WINDOW or seek can never scan a full chunk"
);

// ============================================================================
// SUMMARY CONVENTIONS
// Head number 255 marks a record that aggregates across all test heads
// ============================================================================

/// HEAD_NUM value that marks a bin, part-count, or test-synopsis record as a
/// whole-file aggregate rather than a per-head report.
pub const HEAD_ALL_SITES: u8 = 255;

/// SITE_NUM written on synthesized aggregate records. A head-255 record
/// covers every site, so the site field carries no information.
pub const SUMMARY_SITE_NUM: u8 = 0;
