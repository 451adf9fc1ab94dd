//! # Generic and Text Records
//!
//! DTR carries free-form text. GDR carries self-describing data: a field
//! count followed by `[type code][datum]` pairs, with pad bytes (code 0)
//! inserted so multi-byte data lands on even offsets within the body.
//!
//! GDR is the one V4 record a static layout table cannot express, since the
//! shape of field `n` is only known after reading field `n - 1`. It is
//! handled by the custom conversion functions in this module instead, which
//! the registry installs alongside the table-driven kinds.
//!
//! Pad bytes are an encoding artifact, not data: reads skip them without
//! counting them toward `FLD_CNT`, and writes regenerate them from scratch.
//! A GDR that decodes and re-encodes may therefore shrink or grow by pad
//! bytes while carrying identical fields.

use eyre::{bail, ensure, Result};

use crate::codec::{BitArray, ByteWriter, Endianness};
use crate::records::{RecordData, RecordType, UnknownRecord};
use crate::schema::RecordSchema;
use crate::stdf_record;

stdf_record! {
    /// Free-form text embedded in the record stream, such as operator
    /// remarks or tester console output.
    pub struct Dtr {
        text_dat: str,
    }
}

pub(crate) fn dtr_schema() -> Result<RecordSchema> {
    use crate::schema::{FieldDescriptor, FieldType};
    RecordSchema::new(
        RecordType::DTR,
        "Dtr",
        || RecordData::Dtr(Dtr::default()),
        vec![FieldDescriptor::plain(0, FieldType::Cn).with_property("text_dat")],
    )
}

/// One self-describing GDR datum.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericData {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Bits(BitArray),
    /// A single nibble, stored in the low half of its byte.
    Nibble(u8),
}

impl GenericData {
    /// The wire type code preceding the datum.
    pub fn type_code(&self) -> u8 {
        match self {
            GenericData::U8(_) => 1,
            GenericData::U16(_) => 2,
            GenericData::U32(_) => 3,
            GenericData::I8(_) => 4,
            GenericData::I16(_) => 5,
            GenericData::I32(_) => 6,
            GenericData::F32(_) => 7,
            GenericData::F64(_) => 8,
            GenericData::Text(_) => 10,
            GenericData::Bytes(_) => 11,
            GenericData::Bits(_) => 12,
            GenericData::Nibble(_) => 13,
        }
    }

    /// Whether the datum must start on an even byte offset, forcing a pad
    /// byte before its type code when it would not.
    fn needs_even_offset(&self) -> bool {
        matches!(
            self,
            GenericData::U16(_)
                | GenericData::U32(_)
                | GenericData::I16(_)
                | GenericData::I32(_)
                | GenericData::F32(_)
                | GenericData::F64(_)
                | GenericData::Bits(_)
        )
    }
}

impl std::fmt::Display for GenericData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenericData::U8(v) => write!(f, "{v}"),
            GenericData::U16(v) => write!(f, "{v}"),
            GenericData::U32(v) => write!(f, "{v}"),
            GenericData::I8(v) => write!(f, "{v}"),
            GenericData::I16(v) => write!(f, "{v}"),
            GenericData::I32(v) => write!(f, "{v}"),
            GenericData::F32(v) => write!(f, "{v}"),
            GenericData::F64(v) => write!(f, "{v}"),
            GenericData::Text(v) => write!(f, "{v:?}"),
            GenericData::Bytes(v) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            GenericData::Bits(v) => write!(f, "{} bits", v.len()),
            GenericData::Nibble(v) => write!(f, "{v:#x}"),
        }
    }
}

/// Self-describing generic data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gdr {
    pub gen_data: Vec<GenericData>,
}

/// Decodes a raw GDR body into typed data fields.
pub(crate) fn convert_gdr(raw: &UnknownRecord) -> Result<RecordData> {
    let mut reader = raw.reader();
    let fld_cnt = reader.read_u16()? as usize;
    let mut gen_data = Vec::with_capacity(fld_cnt);
    while gen_data.len() < fld_cnt {
        let code = reader.read_u8()?;
        let datum = match code {
            // pad byte: alignment filler, not counted in FLD_CNT
            0 => continue,
            1 => GenericData::U8(reader.read_u8()?),
            2 => GenericData::U16(reader.read_u16()?),
            3 => GenericData::U32(reader.read_u32()?),
            4 => GenericData::I8(reader.read_i8()?),
            5 => GenericData::I16(reader.read_i16()?),
            6 => GenericData::I32(reader.read_i32()?),
            7 => GenericData::F32(reader.read_f32()?),
            8 => GenericData::F64(reader.read_f64()?),
            10 => GenericData::Text(reader.read_cn()?),
            11 => GenericData::Bytes(reader.read_bn()?),
            12 => GenericData::Bits(reader.read_dn()?),
            13 => GenericData::Nibble(reader.read_u8()? & 0x0F),
            other => bail!(
                "generic data field {} has unknown type code {other}",
                gen_data.len()
            ),
        };
        gen_data.push(datum);
    }
    Ok(RecordData::Gdr(Gdr { gen_data }))
}

/// Encodes typed generic data back into a GDR body, regenerating pad bytes
/// so every multi-byte datum starts on an even offset.
pub(crate) fn unconvert_gdr(record: &RecordData, endian: Endianness) -> Result<Vec<u8>> {
    let RecordData::Gdr(gdr) = record else {
        bail!(
            "generic data encoder received a {} record",
            record.kind_name()
        );
    };
    ensure!(
        gdr.gen_data.len() <= u16::MAX as usize,
        "generic data record holds {} fields; the count prefix caps at {}",
        gdr.gen_data.len(),
        u16::MAX
    );

    let mut writer = ByteWriter::new(endian);
    writer.write_u16(gdr.gen_data.len() as u16);
    for datum in &gdr.gen_data {
        // datum starts one byte after its type code
        if datum.needs_even_offset() && writer.len() % 2 == 0 {
            writer.write_u8(0);
        }
        writer.write_u8(datum.type_code());
        match datum {
            GenericData::U8(v) => writer.write_u8(*v),
            GenericData::U16(v) => writer.write_u16(*v),
            GenericData::U32(v) => writer.write_u32(*v),
            GenericData::I8(v) => writer.write_i8(*v),
            GenericData::I16(v) => writer.write_i16(*v),
            GenericData::I32(v) => writer.write_i32(*v),
            GenericData::F32(v) => writer.write_f32(*v),
            GenericData::F64(v) => writer.write_f64(*v),
            GenericData::Text(v) => writer.write_cn(v)?,
            GenericData::Bytes(v) => writer.write_bn(v)?,
            GenericData::Bits(v) => writer.write_dn(v),
            GenericData::Nibble(v) => writer.write_u8(*v & 0x0F),
        }
    }
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &[u8]) -> Result<Gdr> {
        let raw = UnknownRecord::new(RecordType::GDR, 0, Endianness::Little, body.to_vec());
        match convert_gdr(&raw)? {
            RecordData::Gdr(gdr) => Ok(gdr),
            other => panic!("expected a Gdr, got {}", other.kind_name()),
        }
    }

    #[test]
    fn decodes_mixed_fields_and_skips_pads() {
        // count 3, then: pad, U*2, C*n "ok", N*1
        let body = [
            0x03, 0x00, // FLD_CNT
            0x00, // pad so the U*2 datum starts even
            0x02, 0x34, 0x12, // U*2 0x1234
            0x0a, 0x02, b'o', b'k', // C*n "ok"
            0x0d, 0x07, // N*1 7
        ];
        let gdr = decode(&body).unwrap();
        assert_eq!(
            gdr.gen_data,
            vec![
                GenericData::U16(0x1234),
                GenericData::Text("ok".into()),
                GenericData::Nibble(7),
            ]
        );
    }

    #[test]
    fn unknown_type_code_is_an_error() {
        let body = [0x01, 0x00, 0x09, 0x00];
        let err = decode(&body).unwrap_err();
        assert!(err.to_string().contains("unknown type code 9"));
    }

    #[test]
    fn encode_inserts_alignment_pads() {
        let record = RecordData::Gdr(Gdr {
            gen_data: vec![GenericData::U8(5), GenericData::U16(0x0102)],
        });
        let body = unconvert_gdr(&record, Endianness::Little).unwrap();
        // U*8 code+datum land at 2..4; the U*2 then needs a pad so its
        // datum starts at offset 6
        assert_eq!(body, vec![0x02, 0x00, 0x01, 0x05, 0x00, 0x02, 0x02, 0x01]);
        assert_eq!(decode(&body).unwrap().gen_data.len(), 2);
    }

    #[test]
    fn roundtrips_every_type_code() {
        let gdr = Gdr {
            gen_data: vec![
                GenericData::U8(1),
                GenericData::U16(2),
                GenericData::U32(3),
                GenericData::I8(-1),
                GenericData::I16(-2),
                GenericData::I32(-3),
                GenericData::F32(1.5),
                GenericData::F64(-2.5),
                GenericData::Text("mixed".into()),
                GenericData::Bytes(vec![0xde, 0xad]),
                GenericData::Bits(BitArray::from_bits(&[true, false, true]).unwrap()),
                GenericData::Nibble(0xF),
            ],
        };
        let body = unconvert_gdr(&RecordData::Gdr(gdr.clone()), Endianness::Big).unwrap();
        let raw = UnknownRecord::new(RecordType::GDR, 0, Endianness::Big, body);
        assert_eq!(convert_gdr(&raw).unwrap(), RecordData::Gdr(gdr));
    }

    #[test]
    fn rejects_wrong_record_kind() {
        let record = RecordData::Dtr(Dtr::default());
        let err = unconvert_gdr(&record, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("received a DTR record"));
    }
}
