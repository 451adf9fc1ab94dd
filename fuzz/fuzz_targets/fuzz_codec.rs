//! Fuzz testing for the primitive codec.
//!
//! This fuzz target drives arbitrary read sequences over arbitrary record
//! bodies to ensure the ByteReader handles malformed input gracefully
//! without panicking or reading out of bounds.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use stdfkit::codec::{ByteReader, Endianness};

#[derive(Debug, Arbitrary)]
struct CodecInput {
    big_endian: bool,
    operations: Vec<ReadOperation>,
    body: Vec<u8>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum ReadOperation {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
    DateTime,
    C1,
    Cn,
    Cf(u8),
    Bn,
    Dn,
    U16Array(u8, bool),
    F32Array(u8, bool),
    NibbleArray(u8, bool),
    Skip(u8),
    SkipCounted,
    SkipBits,
}

fuzz_target!(|input: CodecInput| {
    let endian = if input.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let mut reader = ByteReader::new(&input.body, endian);

    for op in input.operations {
        let before = reader.position();
        match op {
            ReadOperation::U8 => {
                let _ = reader.read_u8();
            }
            ReadOperation::U16 => {
                let _ = reader.read_u16();
            }
            ReadOperation::U32 => {
                let _ = reader.read_u32();
            }
            ReadOperation::I8 => {
                let _ = reader.read_i8();
            }
            ReadOperation::I16 => {
                let _ = reader.read_i16();
            }
            ReadOperation::I32 => {
                let _ = reader.read_i32();
            }
            ReadOperation::F32 => {
                let _ = reader.read_f32();
            }
            ReadOperation::F64 => {
                let _ = reader.read_f64();
            }
            ReadOperation::DateTime => {
                let _ = reader.read_datetime();
            }
            ReadOperation::C1 => {
                let _ = reader.read_c1();
            }
            ReadOperation::Cn => {
                let _ = reader.read_cn();
            }
            ReadOperation::Cf(len) => {
                let _ = reader.read_cf(len as usize);
            }
            ReadOperation::Bn => {
                let _ = reader.read_bn();
            }
            ReadOperation::Dn => {
                let _ = reader.read_dn();
            }
            ReadOperation::U16Array(count, tolerate) => {
                if let Ok(values) = reader.read_u16_array(count as usize, tolerate) {
                    assert!(values.len() <= count as usize);
                }
            }
            ReadOperation::F32Array(count, tolerate) => {
                if let Ok(values) = reader.read_f32_array(count as usize, tolerate) {
                    assert!(values.len() <= count as usize);
                }
            }
            ReadOperation::NibbleArray(count, tolerate) => {
                if let Ok(values) = reader.read_nibble_array(count as usize, tolerate) {
                    assert!(values.len() <= count as usize);
                    assert!(values.iter().all(|&n| n <= 0x0F));
                }
            }
            ReadOperation::Skip(n) => {
                let _ = reader.skip(n as usize);
            }
            ReadOperation::SkipCounted => reader.skip_counted(),
            ReadOperation::SkipBits => reader.skip_bits(),
        }
        assert!(reader.position() >= before);
        assert!(reader.position() <= input.body.len());
    }
});
