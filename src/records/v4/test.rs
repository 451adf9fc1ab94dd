//! # Test Execution Records
//!
//! The per-execution records PTR (parametric), MPR (multiple-result
//! parametric), FTR (functional), and the per-test synopsis TSR. These are
//! the densest layouts in V4: each carries an optional-field flag byte, and
//! MPR/FTR add counted pin arrays.
//!
//! ## Flag Bytes
//!
//! `test_flg` and `parm_flg` are real properties; the optional-field flag
//! byte that follows the variable text fields is not. It exists only on the
//! wire, governing which of the trailing scaling/limit fields are valid, and
//! is reconstituted at write time from which properties are set. A mask bit
//! being set means the guarded value is a pad and the property stays empty.
//!
//! Two PTR/MPR subtleties worth naming:
//!
//! - the low/high limit masks combine the "limit invalid" and "no limit"
//!   bits (`0x50` / `0xA0`), so either condition leaves the property empty
//! - MPR's `rtn_indx` shares its element count with `rtn_stat`, the one
//!   place V4 reuses a count field; writing arrays of different lengths is
//!   rejected rather than silently truncated

use eyre::Result;

use crate::records::{FieldValue, RecordData, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::{optional_code, optional_text};

stdf_record! {
    /// Per-test synopsis, one per test per head/site.
    pub struct Tsr {
        head_num: u8,
        site_num: u8,
        /// P parametric, F functional, M multiple-result parametric.
        test_typ: char,
        test_num: u32,
        exec_cnt: u32,
        fail_cnt: u32,
        alrm_cnt: u32,
        test_nam: str,
        seq_name: str,
        test_lbl: str,
        test_tim: f32,
        test_min: f32,
        test_max: f32,
        tst_sums: f32,
        tst_sqrs: f32,
    }
}

pub(crate) fn tsr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::TSR,
        "Tsr",
        || RecordData::Tsr(Tsr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("site_num"),
            optional_code(2, "test_typ"),
            FieldDescriptor::plain(3, FieldType::U4).with_property("test_num"),
            FieldDescriptor::plain(4, FieldType::U4)
                .with_property("exec_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(5, FieldType::U4)
                .with_property("fail_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            FieldDescriptor::plain(6, FieldType::U4)
                .with_property("alrm_cnt")
                .with_missing(FieldValue::U32(u32::MAX)),
            optional_text(7, "test_nam"),
            optional_text(8, "seq_name"),
            optional_text(9, "test_lbl"),
            // OPT_FLAG: wire-only validity byte for the five statistics
            FieldDescriptor::plain(10, FieldType::B1),
            FieldDescriptor::flagged(11, FieldType::R4, 10, 0x04)
                .with_property("test_tim")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(12, FieldType::R4, 10, 0x01)
                .with_property("test_min")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(13, FieldType::R4, 10, 0x02)
                .with_property("test_max")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(14, FieldType::R4, 10, 0x10)
                .with_property("tst_sums")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(15, FieldType::R4, 10, 0x20)
                .with_property("tst_sqrs")
                .with_missing(FieldValue::F32(0.0)),
        ],
    )
}

stdf_record! {
    /// One parametric test execution.
    pub struct Ptr {
        test_num: u32,
        head_num: u8,
        site_num: u8,
        /// Pass/fail and alarm bits; bit 1 set means `result` is invalid.
        test_flg: u8,
        parm_flg: u8,
        result: f32,
        test_txt: str,
        alarm_id: str,
        res_scal: i8,
        llm_scal: i8,
        hlm_scal: i8,
        lo_limit: f32,
        hi_limit: f32,
        units: str,
        c_resfmt: str,
        c_llmfmt: str,
        c_hlmfmt: str,
        lo_spec: f32,
        hi_spec: f32,
    }
}

pub(crate) fn ptr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::PTR,
        "Ptr",
        || RecordData::Ptr(Ptr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("test_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(2, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(3, FieldType::B1).with_property("test_flg"),
            FieldDescriptor::plain(4, FieldType::B1).with_property("parm_flg"),
            FieldDescriptor::flagged(5, FieldType::R4, 3, 0x02)
                .with_property("result")
                .with_missing(FieldValue::F32(0.0)),
            optional_text(6, "test_txt"),
            optional_text(7, "alarm_id"),
            // OPT_FLAG: wire-only validity byte for the limit fields
            FieldDescriptor::plain(8, FieldType::B1),
            FieldDescriptor::flagged(9, FieldType::I1, 8, 0x01)
                .with_property("res_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(10, FieldType::I1, 8, 0x50)
                .with_property("llm_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(11, FieldType::I1, 8, 0xA0)
                .with_property("hlm_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(12, FieldType::R4, 8, 0x50)
                .with_property("lo_limit")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(13, FieldType::R4, 8, 0xA0)
                .with_property("hi_limit")
                .with_missing(FieldValue::F32(0.0)),
            optional_text(14, "units"),
            optional_text(15, "c_resfmt"),
            optional_text(16, "c_llmfmt"),
            optional_text(17, "c_hlmfmt"),
            FieldDescriptor::flagged(18, FieldType::R4, 8, 0x04)
                .with_property("lo_spec")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(19, FieldType::R4, 8, 0x08)
                .with_property("hi_spec")
                .with_missing(FieldValue::F32(0.0)),
        ],
    )
}

stdf_record! {
    /// One multiple-result parametric execution, such as a per-pin
    /// measurement sweep.
    pub struct Mpr {
        test_num: u32,
        head_num: u8,
        site_num: u8,
        test_flg: u8,
        parm_flg: u8,
        /// Per-pin state nibbles, one per returned pin.
        rtn_stat: u8s,
        rtn_rslt: f32s,
        test_txt: str,
        alarm_id: str,
        res_scal: i8,
        llm_scal: i8,
        hlm_scal: i8,
        lo_limit: f32,
        hi_limit: f32,
        start_in: f32,
        incr_in: f32,
        /// PMR indexes of the returned pins; same length as `rtn_stat`.
        rtn_indx: u16s,
        units: str,
        units_in: str,
        c_resfmt: str,
        c_llmfmt: str,
        c_hlmfmt: str,
        lo_spec: f32,
        hi_spec: f32,
    }
}

pub(crate) fn mpr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::MPR,
        "Mpr",
        || RecordData::Mpr(Mpr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("test_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(2, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(3, FieldType::B1).with_property("test_flg"),
            FieldDescriptor::plain(4, FieldType::B1).with_property("parm_flg"),
            // RTN_ICNT and RSLT_CNT: wire-only element counts
            FieldDescriptor::plain(5, FieldType::U2),
            FieldDescriptor::plain(6, FieldType::U2),
            FieldDescriptor::nibble_array(7, 5).with_property("rtn_stat"),
            FieldDescriptor::array(8, FieldType::R4, 6).with_property("rtn_rslt"),
            optional_text(9, "test_txt"),
            optional_text(10, "alarm_id"),
            // OPT_FLAG: wire-only validity byte for the limit fields
            FieldDescriptor::plain(11, FieldType::B1),
            FieldDescriptor::flagged(12, FieldType::I1, 11, 0x01)
                .with_property("res_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(13, FieldType::I1, 11, 0x50)
                .with_property("llm_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(14, FieldType::I1, 11, 0xA0)
                .with_property("hlm_scal")
                .with_missing(FieldValue::I8(0)),
            FieldDescriptor::flagged(15, FieldType::R4, 11, 0x50)
                .with_property("lo_limit")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(16, FieldType::R4, 11, 0xA0)
                .with_property("hi_limit")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(17, FieldType::R4, 11, 0x02)
                .with_property("start_in")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(18, FieldType::R4, 11, 0x02)
                .with_property("incr_in")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::array(19, FieldType::U2, 5).with_property("rtn_indx"),
            optional_text(20, "units"),
            optional_text(21, "units_in"),
            optional_text(22, "c_resfmt"),
            optional_text(23, "c_llmfmt"),
            optional_text(24, "c_hlmfmt"),
            FieldDescriptor::flagged(25, FieldType::R4, 11, 0x04)
                .with_property("lo_spec")
                .with_missing(FieldValue::F32(0.0)),
            FieldDescriptor::flagged(26, FieldType::R4, 11, 0x08)
                .with_property("hi_spec")
                .with_missing(FieldValue::F32(0.0)),
        ],
    )
}

stdf_record! {
    /// One functional test execution, with its pattern state.
    pub struct Ftr {
        test_num: u32,
        head_num: u8,
        site_num: u8,
        test_flg: u8,
        cycl_cnt: u32,
        rel_vadr: u32,
        rept_cnt: u32,
        num_fail: u32,
        xfail_ad: i32,
        yfail_ad: i32,
        vect_off: i16,
        rtn_indx: u16s,
        rtn_stat: u8s,
        pgm_indx: u16s,
        pgm_stat: u8s,
        /// One bit per pin; set means the pin failed.
        fail_pin: bits,
        vect_nam: str,
        time_set: str,
        op_code: str,
        test_txt: str,
        alarm_id: str,
        prog_txt: str,
        rslt_txt: str,
        patg_num: u8,
        spin_map: bits,
    }
}

pub(crate) fn ftr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::FTR,
        "Ftr",
        || RecordData::Ftr(Ftr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("test_num"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("head_num"),
            FieldDescriptor::plain(2, FieldType::U1).with_property("site_num"),
            FieldDescriptor::plain(3, FieldType::B1).with_property("test_flg"),
            // OPT_FLAG: wire-only validity byte for the address fields
            FieldDescriptor::plain(4, FieldType::B1),
            FieldDescriptor::flagged(5, FieldType::U4, 4, 0x01)
                .with_property("cycl_cnt")
                .with_missing(FieldValue::U32(0)),
            FieldDescriptor::flagged(6, FieldType::U4, 4, 0x02)
                .with_property("rel_vadr")
                .with_missing(FieldValue::U32(0)),
            FieldDescriptor::flagged(7, FieldType::U4, 4, 0x04)
                .with_property("rept_cnt")
                .with_missing(FieldValue::U32(0)),
            FieldDescriptor::flagged(8, FieldType::U4, 4, 0x08)
                .with_property("num_fail")
                .with_missing(FieldValue::U32(0)),
            FieldDescriptor::flagged(9, FieldType::I4, 4, 0x10)
                .with_property("xfail_ad")
                .with_missing(FieldValue::I32(0)),
            FieldDescriptor::flagged(10, FieldType::I4, 4, 0x10)
                .with_property("yfail_ad")
                .with_missing(FieldValue::I32(0)),
            FieldDescriptor::flagged(11, FieldType::I2, 4, 0x20)
                .with_property("vect_off")
                .with_missing(FieldValue::I16(0)),
            // RTN_ICNT and PGM_ICNT: wire-only element counts
            FieldDescriptor::plain(12, FieldType::U2),
            FieldDescriptor::plain(13, FieldType::U2),
            FieldDescriptor::array(14, FieldType::U2, 12).with_property("rtn_indx"),
            FieldDescriptor::nibble_array(15, 12).with_property("rtn_stat"),
            FieldDescriptor::array(16, FieldType::U2, 13).with_property("pgm_indx"),
            FieldDescriptor::nibble_array(17, 13).with_property("pgm_stat"),
            FieldDescriptor::plain(18, FieldType::Dn)
                .with_property("fail_pin")
                .with_missing(FieldValue::Bits(crate::codec::BitArray::default())),
            optional_text(19, "vect_nam"),
            optional_text(20, "time_set"),
            optional_text(21, "op_code"),
            optional_text(22, "test_txt"),
            optional_text(23, "alarm_id"),
            optional_text(24, "prog_txt"),
            optional_text(25, "rslt_txt"),
            FieldDescriptor::plain(26, FieldType::U1)
                .with_property("patg_num")
                .with_missing(FieldValue::U8(255)),
            FieldDescriptor::plain(27, FieldType::Dn)
                .with_property("spin_map")
                .with_missing(FieldValue::Bits(crate::codec::BitArray::default())),
        ],
    )
}
