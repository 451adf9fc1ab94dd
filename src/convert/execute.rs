//! # Read-Plan Interpreter
//!
//! [`PlanInterpreter`] walks a compiled read plan against one raw record
//! body and fills a typed record. The visitor overrides carry all decode
//! state: the body cursor, the values decoded so far (for counts, flag
//! bytes, and derived-bit sources), and the register holding the value
//! between a field's read leg and its assignment leg.
//!
//! ## Truncation
//!
//! A body may legally end mid-table. The interpreter turns that into
//! [`Flow::ExitAssignments`] rather than an error:
//!
//! - a fixed-size read with too few bytes left exits before consuming
//! - a length-prefixed read (`C*n`, `B*n`, `D*n`) is atomic: it either
//!   decodes whole or drains the remainder and exits
//! - a counted array keeps the whole elements present, then exits
//!
//! Everything decoded before the exit stays assigned; the rest of the
//! record's properties remain unset.

use eyre::{bail, ensure, eyre, Result};

use crate::codec::ByteReader;
use crate::ir::{CodeNode, CodeNodeVisitor, FieldAssignment, Flow};
use crate::records::{FieldValue, Record, RecordData, RecordType, UnknownRecord};
use crate::schema::{FieldType, RecordSchema};

/// One read-plan execution over one raw record.
pub(crate) struct PlanInterpreter<'a> {
    schema: &'a RecordSchema,
    raw: &'a UnknownRecord,
    reader: Option<ByteReader<'a>>,
    record: Option<RecordData>,
    decoded: Vec<Option<FieldValue>>,
    register: Option<FieldValue>,
    suppress_assign: bool,
    truncated: bool,
    result: Option<RecordData>,
}

impl<'a> PlanInterpreter<'a> {
    /// Runs `plan` over `raw` and returns the filled record at the raw
    /// record's stream offset.
    pub(crate) fn run(
        schema: &'a RecordSchema,
        plan: &CodeNode,
        raw: &'a UnknownRecord,
    ) -> Result<Record> {
        let mut interpreter = PlanInterpreter {
            schema,
            raw,
            reader: None,
            record: None,
            decoded: vec![None; schema.field_count()],
            register: None,
            suppress_assign: false,
            truncated: false,
            result: None,
        };
        interpreter.visit(plan)?;
        let data = interpreter
            .result
            .ok_or_else(|| eyre!("plan for {} ended without returning a record", schema.name()))?;
        Ok(Record::at_offset(raw.offset(), data))
    }

    fn reader_mut(&mut self) -> Result<&mut ByteReader<'a>> {
        self.reader
            .as_mut()
            .ok_or_else(|| eyre!("plan read before the body cursor was initialized"))
    }

    /// The decoded value of an earlier field, required by a count, flag,
    /// or derived-bit lookup.
    fn decoded_value(&self, index: usize) -> Result<&FieldValue> {
        self.decoded[index].as_ref().ok_or_else(|| {
            eyre!(
                "{} plan uses field {index} before it was decoded",
                self.schema.name()
            )
        })
    }

    fn assign(&mut self, property: &'static str, value: FieldValue) -> Result<()> {
        let record = self
            .record
            .as_mut()
            .ok_or_else(|| eyre!("plan assigned before the record was initialized"))?;
        let kind_name = record.kind_name();
        let fields = record.as_fields_mut().ok_or_else(|| {
            eyre!("record {kind_name} does not expose dynamic fields")
        })?;
        fields.set_field(property, value)
    }

    /// Reads a fixed-size scalar, exiting on a short body.
    fn read_scalar(&mut self, field_type: FieldType) -> Result<Flow> {
        let size = field_type
            .fixed_size()
            .ok_or_else(|| eyre!("{field_type} is not a fixed-size scalar"))?;
        let reader = self.reader_mut()?;
        if reader.remaining() < size {
            return Ok(Flow::ExitAssignments);
        }
        let value = match field_type {
            FieldType::U1 | FieldType::B1 => FieldValue::U8(reader.read_u8()?),
            FieldType::U2 => FieldValue::U16(reader.read_u16()?),
            FieldType::U4 => FieldValue::U32(reader.read_u32()?),
            FieldType::U8 => FieldValue::U64(reader.read_u64()?),
            FieldType::I1 => FieldValue::I8(reader.read_i8()?),
            FieldType::I2 => FieldValue::I16(reader.read_i16()?),
            FieldType::I4 => FieldValue::I32(reader.read_i32()?),
            FieldType::I8 => FieldValue::I64(reader.read_i64()?),
            FieldType::R4 => FieldValue::F32(reader.read_f32()?),
            FieldType::R8 => FieldValue::F64(reader.read_f64()?),
            FieldType::C1 => FieldValue::Char(reader.read_c1()?),
            FieldType::Cn | FieldType::Bn | FieldType::Dn | FieldType::N1 => {
                bail!("{field_type} has no fixed size")
            }
        };
        self.register = Some(value);
        Ok(Flow::Continue)
    }

    /// Reads a length-prefixed value atomically: on a short body nothing
    /// is decoded, the remainder is drained, and decoding stops.
    fn read_var(&mut self, field_type: FieldType) -> Result<Flow> {
        let reader = self.reader_mut()?;
        let mut probe = reader.clone();
        let outcome = match field_type {
            FieldType::Cn => probe.read_cn().map(FieldValue::Str),
            FieldType::Bn => probe.read_bn().map(FieldValue::Bytes),
            FieldType::Dn => probe.read_dn().map(FieldValue::Bits),
            other => bail!("{other} is not a length-prefixed type"),
        };
        match outcome {
            Ok(value) => {
                *reader = probe;
                self.register = Some(value);
                Ok(Flow::Continue)
            }
            Err(_) => {
                let rest = reader.remaining();
                reader.skip(rest);
                Ok(Flow::ExitAssignments)
            }
        }
    }

    fn read_counted(
        &mut self,
        field_type: FieldType,
        length_index: usize,
        tolerate_short: bool,
    ) -> Result<Flow> {
        let count = self.decoded_value(length_index)?.as_count()?;
        let reader = self.reader_mut()?;
        if count > 0 && reader.remaining() == 0 {
            return Ok(Flow::ExitAssignments);
        }
        let value = match field_type {
            FieldType::U1 => FieldValue::U8s(reader.read_u8_array(count, tolerate_short)?),
            FieldType::U2 => FieldValue::U16s(reader.read_u16_array(count, tolerate_short)?),
            FieldType::U4 => FieldValue::U32s(reader.read_u32_array(count, tolerate_short)?),
            FieldType::I2 => FieldValue::I16s(reader.read_i16_array(count, tolerate_short)?),
            FieldType::R4 => FieldValue::F32s(reader.read_f32_array(count, tolerate_short)?),
            FieldType::R8 => FieldValue::F64s(reader.read_f64_array(count, tolerate_short)?),
            FieldType::N1 => FieldValue::U8s(reader.read_nibble_array(count, tolerate_short)?),
            other => bail!("arrays of {other} are not supported"),
        };
        if value.array_len().unwrap_or(0) < count {
            // partial elements stay assigned; decoding stops after them
            self.truncated = true;
        }
        self.register = Some(value);
        Ok(Flow::Continue)
    }
}

impl<'a> CodeNodeVisitor for PlanInterpreter<'a> {
    fn visit_ensure_type_compatible(&mut self, record_type: RecordType) -> Result<Flow> {
        ensure!(
            self.raw.record_type() == record_type,
            "converter for {record_type} received a {} record",
            self.raw.record_type()
        );
        Ok(Flow::Continue)
    }

    fn visit_init_record(&mut self) -> Result<Flow> {
        self.record = Some(self.schema.make_record());
        Ok(Flow::Continue)
    }

    fn visit_init_reader(&mut self) -> Result<Flow> {
        self.reader = Some(self.raw.reader());
        Ok(Flow::Continue)
    }

    fn visit_field_assignment(&mut self, assignment: &FieldAssignment) -> Result<Flow> {
        self.register = None;
        self.suppress_assign = false;
        self.truncated = false;

        if let Some(read) = &assignment.read {
            if self.visit(read)? == Flow::ExitAssignments {
                return Ok(Flow::ExitAssignments);
            }
            self.decoded[assignment.field_index] = self.register.clone();
        }
        for condition in &assignment.conditions {
            self.visit(condition)?;
        }
        if !self.suppress_assign {
            if let Some(assign) = &assignment.assign {
                self.visit(assign)?;
            }
        }
        if self.truncated {
            return Ok(Flow::ExitAssignments);
        }
        Ok(Flow::Continue)
    }

    fn visit_skip_raw(&mut self, bytes: usize) -> Result<Flow> {
        self.reader_mut()?.skip(bytes);
        Ok(Flow::Continue)
    }

    fn visit_skip_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
    ) -> Result<Flow> {
        match (length_from, field_type) {
            (Some(length_index), field_type) => {
                let count = self.decoded_value(length_index)?.as_count()?;
                let bytes = match field_type {
                    FieldType::N1 => count.div_ceil(2),
                    other => {
                        count
                            * other.fixed_size().ok_or_else(|| {
                                eyre!("counted {other} fields cannot be skipped")
                            })?
                    }
                };
                self.reader_mut()?.skip(bytes);
            }
            (None, FieldType::Cn | FieldType::Bn) => self.reader_mut()?.skip_counted(),
            (None, FieldType::Dn) => self.reader_mut()?.skip_bits(),
            (None, other) => {
                let size = other
                    .fixed_size()
                    .ok_or_else(|| eyre!("{other} cannot be skipped without a size"))?;
                self.reader_mut()?.skip(size);
            }
        }
        Ok(Flow::Continue)
    }

    fn visit_read_type(
        &mut self,
        field_type: FieldType,
        length_from: Option<usize>,
        tolerate_short: bool,
    ) -> Result<Flow> {
        match (length_from, field_type) {
            (Some(length_index), _) => self.read_counted(field_type, length_index, tolerate_short),
            (None, FieldType::Cn | FieldType::Bn | FieldType::Dn) => self.read_var(field_type),
            (None, _) => self.read_scalar(field_type),
        }
    }

    fn visit_read_fixed_string(&mut self, width: usize) -> Result<Flow> {
        let reader = self.reader_mut()?;
        if reader.remaining() < width {
            return Ok(Flow::ExitAssignments);
        }
        let text = reader.read_cf(width)?;
        self.register = Some(FieldValue::Str(text));
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_flag_set(&mut self, flag_index: usize, mask: u8) -> Result<Flow> {
        let flag = self.decoded_value(flag_index)?.as_u8()?;
        if flag & mask != 0 {
            self.suppress_assign = true;
        }
        Ok(Flow::Continue)
    }

    fn visit_skip_assign_if_missing_value(&mut self, missing: &FieldValue) -> Result<Flow> {
        if self.register.as_ref() == Some(missing) {
            self.suppress_assign = true;
        }
        Ok(Flow::Continue)
    }

    fn visit_skip_array_if_length_zero(&mut self) -> Result<Flow> {
        if self.register.as_ref().and_then(FieldValue::array_len) == Some(0) {
            self.suppress_assign = true;
        }
        Ok(Flow::Continue)
    }

    fn visit_assign_to_property(&mut self, property: &'static str) -> Result<Flow> {
        let value = self
            .register
            .take()
            .ok_or_else(|| eyre!("assignment of {property} reached with no decoded value"))?;
        self.assign(property, value)?;
        Ok(Flow::Continue)
    }

    fn visit_assign_dependency(
        &mut self,
        source_index: usize,
        mask: u8,
        property: &'static str,
    ) -> Result<Flow> {
        // a truncated body may have ended before the source byte
        if let Some(source) = &self.decoded[source_index] {
            let bit = source.as_u8()? & mask != 0;
            self.assign(property, FieldValue::Bool(bit))?;
        }
        Ok(Flow::Continue)
    }

    fn visit_return_record(&mut self) -> Result<Flow> {
        self.result = self.record.take();
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ByteWriter, Endianness};
    use crate::convert::lowering::lower_read_plan;
    use crate::records::v4;

    fn run_plan(
        schema: &RecordSchema,
        properties: Option<&[&str]>,
        body: Vec<u8>,
        endian: Endianness,
    ) -> Record {
        let required = match properties {
            Some(properties) => schema.required_fields(properties).unwrap(),
            None => vec![true; schema.field_count()],
        };
        let plan = lower_read_plan(schema, &required);
        let raw = UnknownRecord::new(schema.record_type(), 96, endian, body);
        PlanInterpreter::run(schema, &plan, &raw).unwrap()
    }

    fn wir_body(endian: Endianness) -> Vec<u8> {
        let mut w = ByteWriter::new(endian);
        w.write_u8(1); // head_num
        w.write_u8(255); // site_grp: missing sentinel
        w.write_u32(1_700_000_000); // start_t
        w.write_cn("W-07").unwrap();
        w.into_bytes()
    }

    #[test]
    fn decodes_a_full_record_in_both_byte_orders() {
        for endian in [Endianness::Little, Endianness::Big] {
            let schema = v4::wir_schema().unwrap();
            let record = run_plan(&schema, None, wir_body(endian), endian);
            assert_eq!(record.offset, 96);
            let RecordData::Wir(wir) = record.data else {
                panic!("expected a WIR");
            };
            assert_eq!(wir.head_num, Some(1));
            assert_eq!(wir.site_grp, None, "sentinel must read back as unset");
            assert_eq!(wir.start_t, Some(1_700_000_000));
            assert_eq!(wir.wafer_id.as_deref(), Some("W-07"));
        }
    }

    #[test]
    fn truncated_body_leaves_later_fields_unset() {
        let schema = v4::wir_schema().unwrap();
        // head_num + site_grp + half of start_t
        let record = run_plan(&schema, None, vec![2, 7, 0xAA, 0xBB], Endianness::Little);
        let RecordData::Wir(wir) = record.data else {
            panic!("expected a WIR");
        };
        assert_eq!(wir.head_num, Some(2));
        assert_eq!(wir.site_grp, Some(7));
        assert_eq!(wir.start_t, None, "partial scalar must not decode");
        assert_eq!(wir.wafer_id, None);
    }

    #[test]
    fn truncated_string_is_atomic() {
        let schema = v4::wir_schema().unwrap();
        let mut body = wir_body(Endianness::Little);
        body.truncate(body.len() - 2); // cut into the wafer_id text
        let record = run_plan(&schema, None, body, Endianness::Little);
        let RecordData::Wir(wir) = record.data else {
            panic!("expected a WIR");
        };
        assert_eq!(wir.start_t, Some(1_700_000_000));
        assert_eq!(wir.wafer_id, None, "a cut string decodes as unset");
    }

    #[test]
    fn flag_bits_invalidate_their_fields() {
        let schema = v4::tsr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u8(1); // head_num
        w.write_u8(1); // site_num
        w.write_c1('P').unwrap(); // test_typ
        w.write_u32(1001); // test_num
        w.write_u32(50); // exec_cnt
        w.write_u32(u32::MAX); // fail_cnt: sentinel
        w.write_u32(0); // alrm_cnt
        w.write_cn("vdd_leak").unwrap(); // test_nam
        w.write_cn("").unwrap(); // seq_name: sentinel
        w.write_cn("").unwrap(); // test_lbl: sentinel
        w.write_u8(0x05); // opt_flag: test_min and test_tim invalid
        w.write_f32(0.0); // test_tim pad
        w.write_f32(0.0); // test_min pad
        w.write_f32(3.25); // test_max
        let body = w.into_bytes();

        let record = run_plan(&schema, None, body, Endianness::Little);
        let RecordData::Tsr(tsr) = record.data else {
            panic!("expected a TSR");
        };
        assert_eq!(tsr.exec_cnt, Some(50));
        assert_eq!(tsr.fail_cnt, None);
        assert_eq!(tsr.test_nam.as_deref(), Some("vdd_leak"));
        assert_eq!(tsr.seq_name, None);
        assert_eq!(tsr.test_tim, None, "flagged invalid");
        assert_eq!(tsr.test_min, None, "flagged invalid");
        assert_eq!(tsr.test_max, Some(3.25));
        // the record body ended before the sums; they stay unset
        assert_eq!(tsr.tst_sums, None);
        assert_eq!(tsr.tst_sqrs, None);
    }

    #[test]
    fn shared_count_arrays_decode_together() {
        let schema = v4::mpr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Big);
        w.write_u32(2002); // test_num
        w.write_u8(1); // head_num
        w.write_u8(3); // site_num
        w.write_u8(0); // test_flg
        w.write_u8(0); // parm_flg
        w.write_u16(3); // rtn_icnt
        w.write_u16(2); // rslt_cnt
        w.write_nibble_array(&[0x1, 0x2, 0x3]).unwrap(); // rtn_stat
        w.write_f32(0.5); // rtn_rslt[0]
        w.write_f32(1.5); // rtn_rslt[1]
        w.write_cn("io_mpr").unwrap(); // test_txt
        w.write_cn("").unwrap(); // alarm_id
        w.write_u8(0xFF); // opt_flag: everything invalid
        w.write_i8(0); // res_scal pad
        w.write_i8(0); // llm_scal pad
        w.write_i8(0); // hlm_scal pad
        w.write_f32(0.0); // lo_limit pad
        w.write_f32(0.0); // hi_limit pad
        w.write_f32(0.0); // start_in pad
        w.write_f32(0.0); // incr_in pad
        w.write_u16(11); // rtn_indx[0]
        w.write_u16(12); // rtn_indx[1]
        w.write_u16(13); // rtn_indx[2]
        let body = w.into_bytes();

        let record = run_plan(&schema, None, body, Endianness::Big);
        let RecordData::Mpr(mpr) = record.data else {
            panic!("expected an MPR");
        };
        assert_eq!(mpr.rtn_stat, Some(vec![1, 2, 3]));
        assert_eq!(mpr.rtn_rslt, Some(vec![0.5, 1.5]));
        assert_eq!(mpr.rtn_indx, Some(vec![11, 12, 13]));
        assert_eq!(mpr.lo_limit, None);
        assert_eq!(mpr.test_txt.as_deref(), Some("io_mpr"));
    }

    #[test]
    fn zero_count_arrays_stay_unset() {
        let schema = v4::mpr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u32(1); // test_num
        w.write_u8(1); // head_num
        w.write_u8(1); // site_num
        w.write_u8(0); // test_flg
        w.write_u8(0); // parm_flg
        w.write_u16(0); // rtn_icnt
        w.write_u16(0); // rslt_cnt
        let record = run_plan(&schema, None, w.into_bytes(), Endianness::Little);
        let RecordData::Mpr(mpr) = record.data else {
            panic!("expected an MPR");
        };
        assert_eq!(mpr.rtn_stat, None);
        assert_eq!(mpr.rtn_rslt, None);
    }

    #[test]
    fn truncated_array_keeps_whole_elements_and_stops() {
        let schema = v4::mpr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u32(1);
        w.write_u8(1);
        w.write_u8(1);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u16(0); // rtn_icnt
        w.write_u16(3); // rslt_cnt claims 3 results
        w.write_f32(1.0); // only one fits
        let record = run_plan(&schema, None, w.into_bytes(), Endianness::Little);
        let RecordData::Mpr(mpr) = record.data else {
            panic!("expected an MPR");
        };
        assert_eq!(mpr.rtn_rslt, Some(vec![1.0]));
        assert_eq!(mpr.test_txt, None);
    }

    #[test]
    fn dependency_bits_come_from_the_source_byte() {
        let schema = v4::prr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u8(1); // head_num
        w.write_u8(0); // site_num
        w.write_u8(0b0000_1010); // part_flg: coords superseded, failed... bit3
        w.write_u16(12); // num_test
        w.write_u16(5); // hard_bin
        let record = run_plan(&schema, None, w.into_bytes(), Endianness::Little);
        let RecordData::Prr(prr) = record.data else {
            panic!("expected a PRR");
        };
        assert_eq!(prr.part_flg, Some(0b0000_1010));
        assert_eq!(prr.supersedes_part_id, Some(false));
        assert_eq!(prr.supersedes_coords, Some(true));
        assert_eq!(prr.abnormal_end, Some(false));
        assert_eq!(prr.failed, Some(true));
        // truncated before the coordinates
        assert_eq!(prr.x_coord, None);
    }

    #[test]
    fn dependencies_stay_unset_when_the_source_is_truncated_away() {
        let schema = v4::prr_schema().unwrap();
        let record = run_plan(&schema, None, vec![1, 0], Endianness::Little);
        let RecordData::Prr(prr) = record.data else {
            panic!("expected a PRR");
        };
        assert_eq!(prr.part_flg, None);
        assert_eq!(prr.failed, None);
    }

    #[test]
    fn restricted_plan_populates_only_wanted_properties() {
        let schema = v4::prr_schema().unwrap();
        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u8(1);
        w.write_u8(6);
        w.write_u8(0x08);
        w.write_u16(12);
        w.write_u16(5);
        w.write_u16(50); // soft_bin
        let record = run_plan(
            &schema,
            Some(&["soft_bin"]),
            w.into_bytes(),
            Endianness::Little,
        );
        let RecordData::Prr(prr) = record.data else {
            panic!("expected a PRR");
        };
        assert_eq!(prr.soft_bin, Some(50));
        assert_eq!(prr.head_num, None, "pruned fields stay unset");
        assert_eq!(prr.hard_bin, None, "pruned fields stay unset");
    }

    #[test]
    fn wrong_record_type_is_rejected() {
        let schema = v4::wir_schema().unwrap();
        let plan = lower_read_plan(&schema, &[true; 4]);
        let raw = UnknownRecord::new(RecordType::PIR, 0, Endianness::Little, vec![1, 1]);
        let err = PlanInterpreter::run(&schema, &plan, &raw).unwrap_err();
        assert!(err.to_string().contains("received a PIR"));
    }

    #[test]
    fn extra_trailing_bytes_are_ignored() {
        let schema = v4::pir_schema().unwrap();
        let record = run_plan(&schema, None, vec![1, 2, 0xEE, 0xFF], Endianness::Little);
        let RecordData::Pir(pir) = record.data else {
            panic!("expected a PIR");
        };
        assert_eq!(pir.head_num, Some(1));
        assert_eq!(pir.site_num, Some(2));
    }
}
