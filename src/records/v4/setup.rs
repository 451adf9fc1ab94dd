//! # Test-Setup Records
//!
//! PMR (Pin Map), PGR (Pin Group), RDR (Retest Data), and SDR (Site
//! Description). These appear between the MIR and the first part and
//! describe the physical configuration the results refer back to.

use eyre::Result;

use crate::records::{FieldValue, RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::optional_text;

stdf_record! {
    /// Pin map: one tester channel and the names it goes by.
    pub struct Pmr {
        /// Pin index referenced by PGR groups and test pin lists.
        pmr_indx: u16,
        chan_typ: u16,
        chan_nam: str,
        phy_nam: str,
        log_nam: str,
        head_num: u8,
        site_num: u8,
    }
}

pub(crate) fn pmr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PMR,
        "Pmr",
        || RecordData::Pmr(Pmr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U2).with_property("pmr_indx"),
            FieldDescriptor::plain(1, FieldType::U2)
                .with_property("chan_typ")
                .with_missing(FieldValue::U16(0)),
            optional_text(2, "chan_nam"),
            optional_text(3, "phy_nam"),
            optional_text(4, "log_nam"),
            FieldDescriptor::plain(5, FieldType::U1)
                .with_property("head_num")
                .with_missing(FieldValue::U8(1)),
            FieldDescriptor::plain(6, FieldType::U1)
                .with_property("site_num")
                .with_missing(FieldValue::U8(1)),
        ],
    )
}

stdf_record! {
    /// Pin group: a named set of PMR indexes.
    pub struct Pgr {
        grp_indx: u16,
        grp_nam: str,
        /// Member pin indexes.
        pmr_indx: u16s,
    }
}

pub(crate) fn pgr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PGR,
        "Pgr",
        || RecordData::Pgr(Pgr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U2).with_property("grp_indx"),
            optional_text(1, "grp_nam"),
            // INDX_CNT: derived from the pin list at write time
            FieldDescriptor::plain(2, FieldType::U2),
            FieldDescriptor::array(3, FieldType::U2, 2).with_property("pmr_indx"),
        ],
    )
}

stdf_record! {
    /// Retest data: which hardware bins were submitted for retest.
    pub struct Rdr {
        rtst_bin: u16s,
    }
}

pub(crate) fn rdr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::RDR,
        "Rdr",
        || RecordData::Rdr(Rdr::default()),
        vec![
            // NUM_BINS: derived from the bin list at write time
            FieldDescriptor::plain(0, FieldType::U2),
            FieldDescriptor::array(1, FieldType::U2, 0).with_property("rtst_bin"),
        ],
    )
}

stdf_record! {
    /// Site description: the hardware fitted to one group of test sites.
    pub struct Sdr {
        head_num: u8,
        site_grp: u8,
        /// The sites in this group.
        site_num: u8s,
        hand_typ: str,
        hand_id: str,
        card_typ: str,
        card_id: str,
        load_typ: str,
        load_id: str,
        dib_typ: str,
        dib_id: str,
        cabl_typ: str,
        cabl_id: str,
        cont_typ: str,
        cont_id: str,
        lasr_typ: str,
        lasr_id: str,
        extr_typ: str,
        extr_id: str,
    }
}

pub(crate) fn sdr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::SDR,
        "Sdr",
        || RecordData::Sdr(Sdr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_grp"),
            // SITE_CNT: derived from the site list at write time
            FieldDescriptor::plain(2, FieldType::U1),
            FieldDescriptor::array(3, FieldType::U1, 2).with_property("site_num"),
            optional_text(4, "hand_typ"),
            optional_text(5, "hand_id"),
            optional_text(6, "card_typ"),
            optional_text(7, "card_id"),
            optional_text(8, "load_typ"),
            optional_text(9, "load_id"),
            optional_text(10, "dib_typ"),
            optional_text(11, "dib_id"),
            optional_text(12, "cabl_typ"),
            optional_text(13, "cabl_id"),
            optional_text(14, "cont_typ"),
            optional_text(15, "cont_id"),
            optional_text(16, "lasr_typ"),
            optional_text(17, "lasr_id"),
            optional_text(18, "extr_typ"),
            optional_text(19, "extr_id"),
        ],
    )
}
