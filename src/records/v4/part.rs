//! # Part-Level Records
//!
//! PIR (Part Information) opens one device under test on a head/site pair;
//! PRR (Part Results) closes it with binning, coordinates, and the packed
//! `part_flg` byte.
//!
//! PRR additionally exposes four derived booleans (`supersedes_part_id`,
//! `supersedes_coords`, `abnormal_end`, `failed`) unpacked from `part_flg`
//! bits. They occupy no wire bytes and are never written back; `part_flg`
//! itself remains the byte of record.

use eyre::Result;

use crate::records::{FieldValue, RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::optional_text;

stdf_record! {
    /// Marks the start of testing for one part.
    pub struct Pir {
        head_num: u8,
        site_num: u8,
    }
}

pub(crate) fn pir_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PIR,
        "Pir",
        || RecordData::Pir(Pir::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
        ],
    )
}

stdf_record! {
    /// Results for one tested part.
    pub struct Prr {
        head_num: u8,
        site_num: u8,
        /// Raw part flags; bits 0-3 are also unpacked below.
        part_flg: u8,
        num_test: u16,
        hard_bin: u16,
        soft_bin: u16,
        x_coord: i16,
        y_coord: i16,
        /// Elapsed test time in milliseconds.
        test_t: u32,
        part_id: str,
        part_txt: str,
        part_fix: bytes,
        /// `part_flg` bit 0: a later PRR with the same `part_id` supersedes
        /// this one.
        supersedes_part_id: bool,
        /// `part_flg` bit 1: a later PRR at the same coordinates supersedes
        /// this one.
        supersedes_coords: bool,
        /// `part_flg` bit 2: testing ended abnormally.
        abnormal_end: bool,
        /// `part_flg` bit 3: the part failed.
        failed: bool,
    }
}

pub(crate) fn prr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PRR,
        "Prr",
        || RecordData::Prr(Prr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(2, FieldType::B1).with_property("part_flg"),
            FieldDescriptor::plain(3, FieldType::U2).with_property("num_test"),
            FieldDescriptor::plain(4, FieldType::U2).with_property("hard_bin"),
            FieldDescriptor::plain(5, FieldType::U2)
                .with_property("soft_bin")
                .with_missing(FieldValue::U16(u16::MAX)),
            FieldDescriptor::plain(6, FieldType::I2)
                .with_property("x_coord")
                .with_missing(FieldValue::I16(i16::MIN)),
            FieldDescriptor::plain(7, FieldType::I2)
                .with_property("y_coord")
                .with_missing(FieldValue::I16(i16::MIN)),
            FieldDescriptor::plain(8, FieldType::U4)
                .with_property("test_t")
                .with_missing(FieldValue::U32(0)),
            optional_text(9, "part_id"),
            optional_text(10, "part_txt"),
            FieldDescriptor::plain(11, FieldType::Bn)
                .with_property("part_fix")
                .with_missing(FieldValue::Bytes(Vec::new())),
            FieldDescriptor::dependency(12, 2, 0x01).with_property("supersedes_part_id"),
            FieldDescriptor::dependency(13, 2, 0x02).with_property("supersedes_coords"),
            FieldDescriptor::dependency(14, 2, 0x04).with_property("abnormal_end"),
            FieldDescriptor::dependency(15, 2, 0x08).with_property("failed"),
        ],
    )
}
