//! Fuzz testing for the streaming record reader.
//!
//! This fuzz target feeds arbitrary byte streams through the full reader
//! stack, with and without recovery, to ensure corrupt input never panics
//! and every stream still terminates with an end-of-stream marker when the
//! reader is tolerant.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use stdfkit::reader::MemorySource;
use stdfkit::{RecordData, StdfFile};

#[derive(Debug, Arbitrary)]
struct ReaderInput {
    recovery: bool,
    prepend_far: bool,
    bytes: Vec<u8>,
}

fuzz_target!(|input: ReaderInput| {
    let mut bytes = Vec::with_capacity(input.bytes.len() + 6);
    if input.prepend_far {
        // valid little-endian FAR so fuzzing reaches the record loop
        bytes.extend_from_slice(&[2, 0, 0, 10, 2, 4]);
    }
    bytes.extend_from_slice(&input.bytes);
    let total_len = bytes.len() as u64;

    let file = StdfFile::builder()
        .tolerant(true)
        .recovery(input.recovery)
        .from_source(Box::new(MemorySource::new("fuzz", bytes)));
    let Ok(mut file) = file else { return };

    let mut saw_start = false;
    let mut saw_end = false;
    for record in file.records() {
        let record = record.expect("tolerant reader must not fail the iterator");
        assert!(!saw_end, "no record may follow the end-of-stream marker");
        assert!(record.offset <= total_len);
        match &record.data {
            RecordData::StartOfStream(_) => {
                assert!(!saw_start, "exactly one start marker per stream");
                saw_start = true;
            }
            RecordData::EndOfStream(_) => saw_end = true,
            RecordData::CorruptData(corrupt) => {
                // recovered runs always carry the skipped bytes; an
                // unrecoverable run at exact end-of-stream may be empty
                if corrupt.recoverable {
                    assert!(!corrupt.bytes.is_empty());
                }
                assert!(corrupt.bytes.len() as u64 <= total_len);
            }
            _ => {}
        }
    }
    assert!(saw_start, "every stream plays a start marker");
    assert!(saw_end, "every tolerant stream reaches its end marker");
});
