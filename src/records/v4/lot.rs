//! # Lot-Level Records
//!
//! MIR (Master Information Record), MRR (Master Results Record), and PCR
//! (Part Count Record). The MIR/MRR pair brackets a test run; PCRs report
//! part counts per head and site, with head 255 reserved for the aggregate
//! across all of them.

use eyre::Result;

use crate::records::{FieldValue, RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::{optional_code, optional_text};

stdf_record! {
    /// Master information: the conditions the lot ran under. Written once,
    /// right after the FAR and any ATRs.
    pub struct Mir {
        /// Setup time, epoch seconds.
        setup_t: u32,
        /// First-part start time, epoch seconds.
        start_t: u32,
        /// Tester station number.
        stat_num: u8,
        mode_cod: char,
        rtst_cod: char,
        prot_cod: char,
        /// Burn-in time in minutes.
        burn_tim: u16,
        cmod_cod: char,
        lot_id: str,
        part_typ: str,
        node_nam: str,
        tstr_typ: str,
        job_nam: str,
        job_rev: str,
        sblot_id: str,
        oper_nam: str,
        exec_typ: str,
        exec_ver: str,
        test_cod: str,
        tst_temp: str,
        user_txt: str,
        aux_file: str,
        pkg_typ: str,
        famly_id: str,
        date_cod: str,
        facil_id: str,
        floor_id: str,
        proc_id: str,
        oper_frq: str,
        spec_nam: str,
        spec_ver: str,
        flow_id: str,
        setup_id: str,
        dsgn_rev: str,
        eng_id: str,
        rom_cod: str,
        serl_num: str,
        supr_nam: str,
    }
}

pub(crate) fn mir_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::MIR,
        "Mir",
        || RecordData::Mir(Mir::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("setup_t"),
            FieldDescriptor::plain(1, FieldType::U4).with_property("start_t"),
            FieldDescriptor::plain(2, FieldType::U1).with_property("stat_num"),
            optional_code(3, "mode_cod"),
            optional_code(4, "rtst_cod"),
            optional_code(5, "prot_cod"),
            FieldDescriptor::plain(6, FieldType::U2)
                .with_property("burn_tim")
                .with_missing(FieldValue::U16(65535)),
            optional_code(7, "cmod_cod"),
            FieldDescriptor::plain(8, FieldType::Cn).with_property("lot_id"),
            FieldDescriptor::plain(9, FieldType::Cn).with_property("part_typ"),
            FieldDescriptor::plain(10, FieldType::Cn).with_property("node_nam"),
            FieldDescriptor::plain(11, FieldType::Cn).with_property("tstr_typ"),
            FieldDescriptor::plain(12, FieldType::Cn).with_property("job_nam"),
            optional_text(13, "job_rev"),
            optional_text(14, "sblot_id"),
            optional_text(15, "oper_nam"),
            optional_text(16, "exec_typ"),
            optional_text(17, "exec_ver"),
            optional_text(18, "test_cod"),
            optional_text(19, "tst_temp"),
            optional_text(20, "user_txt"),
            optional_text(21, "aux_file"),
            optional_text(22, "pkg_typ"),
            optional_text(23, "famly_id"),
            optional_text(24, "date_cod"),
            optional_text(25, "facil_id"),
            optional_text(26, "floor_id"),
            optional_text(27, "proc_id"),
            optional_text(28, "oper_frq"),
            optional_text(29, "spec_nam"),
            optional_text(30, "spec_ver"),
            optional_text(31, "flow_id"),
            optional_text(32, "setup_id"),
            optional_text(33, "dsgn_rev"),
            optional_text(34, "eng_id"),
            optional_text(35, "rom_cod"),
            optional_text(36, "serl_num"),
            optional_text(37, "supr_nam"),
        ],
    )
}

stdf_record! {
    /// Master results: closes the run the MIR opened.
    pub struct Mrr {
        /// Last-part finish time, epoch seconds.
        finish_t: u32,
        /// Lot disposition code.
        disp_cod: char,
        usr_desc: str,
        exc_desc: str,
    }
}

pub(crate) fn mrr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::MRR,
        "Mrr",
        || RecordData::Mrr(Mrr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("finish_t"),
            optional_code(1, "disp_cod"),
            optional_text(2, "usr_desc"),
            optional_text(3, "exc_desc"),
        ],
    )
}

stdf_record! {
    /// Part counts for one head/site pair, or for the whole file when
    /// `head_num` is 255.
    pub struct Pcr {
        head_num: u8,
        site_num: u8,
        /// Parts tested.
        part_cnt: u32,
        /// Parts retested.
        rtst_cnt: u32,
        /// Parts aborted.
        abrt_cnt: u32,
        /// Good parts.
        good_cnt: u32,
        /// Functional parts.
        func_cnt: u32,
    }
}

pub(crate) fn pcr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PCR,
        "Pcr",
        || RecordData::Pcr(Pcr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(2, FieldType::U4).with_property("part_cnt"),
            FieldDescriptor::plain(3, FieldType::U4)
                .with_property("rtst_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(4, FieldType::U4)
                .with_property("abrt_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(5, FieldType::U4)
                .with_property("good_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(6, FieldType::U4)
                .with_property("func_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
        ],
    )
}
