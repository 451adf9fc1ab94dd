//! # Wafer-Level Records
//!
//! WIR (Wafer Information), WRR (Wafer Results), and WCR (Wafer
//! Configuration). A WIR/WRR pair brackets the parts of one wafer; the
//! WCR describes wafer geometry once per file.

use eyre::Result;

use crate::records::{FieldValue, RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::{optional_code, optional_text};

stdf_record! {
    /// Opens one wafer's worth of parts.
    pub struct Wir {
        head_num: u8,
        site_grp: u8,
        /// First-part start time, epoch seconds.
        start_t: u32,
        wafer_id: str,
    }
}

pub(crate) fn wir_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::WIR,
        "Wir",
        || RecordData::Wir(Wir::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1)
                .with_property("site_grp")
                .with_missing(FieldValue::U8(255)),
            FieldDescriptor::plain(2, FieldType::U4).with_property("start_t"),
            optional_text(3, "wafer_id"),
        ],
    )
}

stdf_record! {
    /// Closes the wafer the matching WIR opened, with its part counts.
    pub struct Wrr {
        head_num: u8,
        site_grp: u8,
        /// Last-part finish time, epoch seconds.
        finish_t: u32,
        part_cnt: u32,
        rtst_cnt: u32,
        abrt_cnt: u32,
        good_cnt: u32,
        func_cnt: u32,
        wafer_id: str,
        /// Fab wafer ID, before any relabeling.
        fabwf_id: str,
        frame_id: str,
        mask_id: str,
        usr_desc: str,
        exc_desc: str,
    }
}

pub(crate) fn wrr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::WRR,
        "Wrr",
        || RecordData::Wrr(Wrr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1)
                .with_property("site_grp")
                .with_missing(FieldValue::U8(255)),
            FieldDescriptor::plain(2, FieldType::U4).with_property("finish_t"),
            FieldDescriptor::plain(3, FieldType::U4).with_property("part_cnt"),
            FieldDescriptor::plain(4, FieldType::U4)
                .with_property("rtst_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(5, FieldType::U4)
                .with_property("abrt_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(6, FieldType::U4)
                .with_property("good_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(7, FieldType::U4)
                .with_property("func_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            optional_text(8, "wafer_id"),
            optional_text(9, "fabwf_id"),
            optional_text(10, "frame_id"),
            optional_text(11, "mask_id"),
            optional_text(12, "usr_desc"),
            optional_text(13, "exc_desc"),
        ],
    )
}

stdf_record! {
    /// Wafer geometry: size, die dimensions, flat orientation, and the
    /// coordinate system the PRR die coordinates use.
    pub struct Wcr {
        wafr_siz: f32,
        die_ht: f32,
        die_wid: f32,
        /// 0 unknown, 1 inches, 2 cm, 3 mm, 4 mils.
        wf_units: u8,
        wf_flat: char,
        center_x: i16,
        center_y: i16,
        pos_x: char,
        pos_y: char,
    }
}

pub(crate) fn wcr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::WCR,
        "Wcr",
        || RecordData::Wcr(Wcr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::R4)
                .with_property("wafr_siz")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::plain(1, FieldType::R4)
                .with_property("die_ht")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::plain(2, FieldType::R4)
                .with_property("die_wid")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::plain(3, FieldType::U1)
                .with_property("wf_units")
                .with_missing(FieldValue::U8(0)),
            optional_code(4, "wf_flat"),
            FieldDescriptor::plain(5, FieldType::I2)
                .with_property("center_x")
                .with_missing(FieldValue::I16(i16::MIN)),
            FieldDescriptor::plain(6, FieldType::I2)
                .with_property("center_y")
                .with_missing(FieldValue::I16(i16::MIN)),
            optional_code(7, "pos_x"),
            optional_code(8, "pos_y"),
        ],
    )
}
