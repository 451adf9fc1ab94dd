//! # Bin Summary Records
//!
//! HBR (Hardware Bin Record) and SBR (Software Bin Record), one per bin
//! per head/site. Head 255 marks the aggregate across all heads; the
//! summary-synthesis filter can reconstruct those aggregates when a file
//! omits them.

use eyre::Result;

use crate::records::{RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::{optional_code, optional_text};

stdf_record! {
    /// Hardware bin count for one head/site.
    pub struct Hbr {
        head_num: u8,
        site_num: u8,
        hbin_num: u16,
        /// Parts binned here.
        hbin_cnt: u32,
        /// 'P' pass, 'F' fail, space unknown.
        hbin_pf: char,
        hbin_nam: str,
    }
}

pub(crate) fn hbr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::HBR,
        "Hbr",
        || RecordData::Hbr(Hbr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(2, FieldType::U2).with_property("hbin_num"),
            FieldDescriptor::plain(3, FieldType::U4).with_property("hbin_cnt"),
            optional_code(4, "hbin_pf"),
            optional_text(5, "hbin_nam"),
        ],
    )
}

stdf_record! {
    /// Software bin count for one head/site.
    pub struct Sbr {
        head_num: u8,
        site_num: u8,
        sbin_num: u16,
        sbin_cnt: u32,
        sbin_pf: char,
        sbin_nam: str,
    }
}

pub(crate) fn sbr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::SBR,
        "Sbr",
        || RecordData::Sbr(Sbr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(2, FieldType::U2).with_property("sbin_num"),
            FieldDescriptor::plain(3, FieldType::U4).with_property("sbin_cnt"),
            optional_code(4, "sbin_pf"),
            optional_text(5, "sbin_nam"),
        ],
    )
}
