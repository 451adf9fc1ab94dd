//! # Write-Plan Emitter
//!
//! [`PlanEmitter`] turns a typed record back into the bytes of one record
//! body. Emission is two-phase:
//!
//! 1. **Staging.** Every on-wire property is pulled out of the record.
//!    The last staged index fixes where the body ends; records are written
//!    exactly as long as their rightmost present field. Then the values no
//!    caller ever sets are derived: array-count fields take the length of
//!    their arrays (arrays sharing a count must agree), and validity-flag
//!    bytes get the mask of every absent guarded field OR-ed in.
//! 2. **Emission.** The write plan is walked once. Unset fields inside the
//!    body substitute their missing-value sentinel; flagged fields
//!    substitute their pad. A field with neither is an error, because the
//!    bytes have to say something.

use eyre::{bail, ensure, eyre, Result};
use hashbrown::HashMap;

use crate::codec::{ByteWriter, Endianness};
use crate::ir::{CodeNode, CodeNodeVisitor, Flow};
use crate::records::{FieldValue, RecordData};
use crate::schema::{FieldDescriptor, FieldKind, FieldType, RecordSchema};

/// One write-plan execution over one typed record.
pub(crate) struct PlanEmitter<'a> {
    schema: &'a RecordSchema,
    record: &'a RecordData,
    endian: Endianness,
    staged: Vec<Option<FieldValue>>,
    last_emit: Option<usize>,
    writer: Option<ByteWriter>,
    body: Option<Vec<u8>>,
}

impl<'a> PlanEmitter<'a> {
    /// Runs `plan` over `record` and returns the encoded body, without the
    /// record header.
    pub(crate) fn run(
        schema: &'a RecordSchema,
        plan: &CodeNode,
        record: &'a RecordData,
        endian: Endianness,
    ) -> Result<Vec<u8>> {
        ensure!(
            record.record_type() == Some(schema.record_type()),
            "emitter for {} received a {} record",
            schema.name(),
            record.kind_name()
        );
        let mut emitter = PlanEmitter {
            schema,
            record,
            endian,
            staged: vec![None; schema.field_count()],
            last_emit: None,
            writer: None,
            body: None,
        };
        emitter.visit(plan)?;
        emitter
            .body
            .ok_or_else(|| eyre!("plan for {} ended without returning a body", schema.name()))
    }

    fn writer_mut(&mut self) -> Result<&mut ByteWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| eyre!("plan wrote before the body buffer was initialized"))
    }

    /// Pulls property values out of the record, fixes the emission cutoff,
    /// then derives the count and flag fields no property maps to.
    fn stage(&mut self) -> Result<()> {
        let fields = self.record.as_fields().ok_or_else(|| {
            eyre!(
                "{} records do not carry a field table",
                self.record.kind_name()
            )
        })?;
        for field in self.schema.fields() {
            if !field.on_wire() {
                continue;
            }
            if let Some(property) = field.property {
                self.staged[field.index] = fields.field(property)?;
            }
        }

        // The cutoff comes from caller-visible values only. Derived counts
        // and flag bytes never extend a record on their own.
        self.last_emit = self
            .staged
            .iter()
            .rposition(|value| value.is_some());

        self.derive_counts()?;
        self.fix_flags()?;
        Ok(())
    }

    fn derive_counts(&mut self) -> Result<()> {
        let mut lengths: HashMap<usize, (usize, &'static str)> = HashMap::new();
        for field in self.schema.fields() {
            let (FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index }) =
                field.kind
            else {
                continue;
            };
            let count = match &self.staged[field.index] {
                Some(value) => value.array_len().ok_or_else(|| {
                    eyre!(
                        "{}.{} holds a {} where an array was staged",
                        self.schema.name(),
                        label(field),
                        value.type_name()
                    )
                })?,
                None => continue,
            };
            if let Some((existing, first)) = lengths.get(&length_index) {
                ensure!(
                    *existing == count,
                    "{} arrays {first} and {} share a count but disagree: {existing} vs {count}",
                    self.schema.name(),
                    label(field)
                );
            } else {
                lengths.insert(length_index, (count, label(field)));
            }
        }

        for field in self.schema.fields() {
            let (FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index }) =
                field.kind
            else {
                continue;
            };
            if self.staged[length_index].is_some() {
                continue;
            }
            let count = lengths.get(&length_index).map_or(0, |(count, _)| *count);
            self.staged[length_index] =
                Some(make_count(&self.schema.fields()[length_index], count)?);
        }
        Ok(())
    }

    /// ORs the invalid-bit of every absent flagged field into its flag
    /// byte, and zeroes any referenced flag byte nothing else set.
    fn fix_flags(&mut self) -> Result<()> {
        for field in self.schema.fields() {
            let FieldKind::Flagged {
                flag_index,
                flag_mask,
            } = field.kind
            else {
                continue;
            };
            if self.staged[field.index].is_some() {
                if self.staged[flag_index].is_none() {
                    self.staged[flag_index] = Some(FieldValue::U8(0));
                }
                continue;
            }
            let base = match &self.staged[flag_index] {
                Some(value) => value.as_u8()?,
                None => 0,
            };
            self.staged[flag_index] = Some(FieldValue::U8(base | flag_mask));
        }
        Ok(())
    }

    fn write_scalar(&mut self, field_type: FieldType, value: &FieldValue) -> Result<()> {
        let writer = self.writer_mut()?;
        match field_type {
            FieldType::U1 | FieldType::B1 => writer.write_u8(value.as_u8()?),
            FieldType::U2 => writer.write_u16(value.as_u16()?),
            FieldType::U4 => writer.write_u32(value.as_u32()?),
            FieldType::U8 => writer.write_u64(value.as_u64()?),
            FieldType::I1 => writer.write_i8(value.as_i8()?),
            FieldType::I2 => writer.write_i16(value.as_i16()?),
            FieldType::I4 => writer.write_i32(value.as_i32()?),
            FieldType::I8 => writer.write_i64(value.as_i64()?),
            FieldType::R4 => writer.write_f32(value.as_f32()?),
            FieldType::R8 => writer.write_f64(value.as_f64()?),
            FieldType::C1 => writer.write_c1(value.as_char()?)?,
            FieldType::Cn => writer.write_cn(value.as_str()?)?,
            FieldType::Bn => writer.write_bn(value.as_bytes()?)?,
            FieldType::Dn => writer.write_dn(value.as_bits()?),
            FieldType::N1 => bail!("nibble values only occur in counted arrays"),
        }
        Ok(())
    }

    fn write_array(&mut self, field: &FieldDescriptor, value: &FieldValue) -> Result<()> {
        let writer = self.writer_mut()?;
        match field.field_type {
            FieldType::U1 => writer.write_u8_array(value.as_u8s()?),
            FieldType::U2 => writer.write_u16_array(value.as_u16s()?),
            FieldType::U4 => writer.write_u32_array(value.as_u32s()?),
            FieldType::I2 => writer.write_i16_array(value.as_i16s()?),
            FieldType::R4 => writer.write_f32_array(value.as_f32s()?),
            FieldType::R8 => writer.write_f64_array(value.as_f64s()?),
            FieldType::N1 => writer.write_nibble_array(value.as_u8s()?)?,
            other => bail!("arrays of {other} are not supported"),
        }
        Ok(())
    }
}

impl<'a> CodeNodeVisitor for PlanEmitter<'a> {
    fn visit_init_writer(&mut self) -> Result<Flow> {
        self.stage()?;
        self.writer = Some(ByteWriter::new(self.endian));
        Ok(Flow::Continue)
    }

    fn visit_write_field(&mut self, field_index: usize) -> Result<Flow> {
        if self.last_emit.map_or(true, |last| field_index > last) {
            return Ok(Flow::Continue);
        }
        let field = &self.schema.fields()[field_index];
        let staged = self.staged[field_index].clone();

        match field.kind {
            FieldKind::Array { length_index } | FieldKind::NibbleArray { length_index } => {
                match staged {
                    Some(value) => self.write_array(field, &value)?,
                    None => {
                        let count = self.staged[length_index]
                            .as_ref()
                            .ok_or_else(|| eyre!("array count staged out of order"))?
                            .as_count()?;
                        ensure!(
                            count == 0,
                            "{}.{} is unset while a sibling array carries {count} elements",
                            self.schema.name(),
                            label(field)
                        );
                    }
                }
            }
            FieldKind::FixedString { width } => {
                let value = staged.or_else(|| field.missing_value.clone()).ok_or_else(|| {
                    unset_field_error(self.schema, field)
                })?;
                self.writer_mut()?.write_cf(value.as_str()?, width)?;
            }
            _ => {
                let value = staged.or_else(|| field.missing_value.clone()).ok_or_else(|| {
                    unset_field_error(self.schema, field)
                })?;
                self.write_scalar(field.field_type, &value)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn visit_write_flagged_field(&mut self, field_index: usize) -> Result<Flow> {
        if self.last_emit.map_or(true, |last| field_index > last) {
            return Ok(Flow::Continue);
        }
        let field = &self.schema.fields()[field_index];
        // table validation guarantees flagged fields carry a pad
        let value = self.staged[field_index]
            .clone()
            .or_else(|| field.missing_value.clone())
            .ok_or_else(|| unset_field_error(self.schema, field))?;
        self.write_scalar(field.field_type, &value)?;
        Ok(Flow::Continue)
    }

    fn visit_return_raw_record(&mut self) -> Result<Flow> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| eyre!("plan returned before the body buffer was initialized"))?;
        self.body = Some(writer.into_bytes());
        Ok(Flow::Continue)
    }
}

fn label(field: &FieldDescriptor) -> &'static str {
    field.property.unwrap_or("(unnamed)")
}

fn unset_field_error(schema: &RecordSchema, field: &FieldDescriptor) -> eyre::Report {
    eyre!(
        "{}.{} is unset, has no substitute value, and later fields are present",
        schema.name(),
        label(field)
    )
}

/// Builds a count value of the field's width, rejecting lengths the wire
/// type cannot carry.
fn make_count(field: &FieldDescriptor, count: usize) -> Result<FieldValue> {
    match field.field_type {
        FieldType::U1 => {
            ensure!(
                count <= u8::MAX as usize,
                "array of {count} elements overflows a U*1 count"
            );
            Ok(FieldValue::U8(count as u8))
        }
        FieldType::U2 => {
            ensure!(
                count <= u16::MAX as usize,
                "array of {count} elements overflows a U*2 count"
            );
            Ok(FieldValue::U16(count as u16))
        }
        FieldType::U4 => {
            ensure!(
                count <= u32::MAX as usize,
                "array of {count} elements overflows a U*4 count"
            );
            Ok(FieldValue::U32(count as u32))
        }
        other => bail!("{other} fields cannot carry an array count"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::execute::PlanInterpreter;
    use crate::convert::lowering::{lower_read_plan, lower_write_plan};
    use crate::records::v4;
    use crate::records::{Mpr, Prr, Record, Tsr, UnknownRecord, Wir};

    fn emit(schema: &RecordSchema, record: &RecordData, endian: Endianness) -> Result<Vec<u8>> {
        let plan = lower_write_plan(schema);
        PlanEmitter::run(schema, &plan, record, endian)
    }

    fn decode(schema: &RecordSchema, body: Vec<u8>, endian: Endianness) -> Record {
        let plan = lower_read_plan(schema, &vec![true; schema.field_count()]);
        let raw = UnknownRecord::new(schema.record_type(), 0, endian, body);
        PlanInterpreter::run(schema, &plan, &raw).unwrap()
    }

    #[test]
    fn full_record_round_trips_in_both_byte_orders() {
        let schema = v4::wir_schema().unwrap();
        let wir = RecordData::Wir(Wir {
            head_num: Some(1),
            site_grp: Some(4),
            start_t: Some(1_700_000_000),
            wafer_id: Some("W-07".into()),
        });
        for endian in [Endianness::Little, Endianness::Big] {
            let body = emit(&schema, &wir, endian).unwrap();
            assert_eq!(decode(&schema, body, endian).data, wir);
        }
    }

    #[test]
    fn body_ends_at_the_last_set_field() {
        let schema = v4::prr_schema().unwrap();
        let prr = RecordData::Prr(Prr {
            head_num: Some(1),
            site_num: Some(0),
            part_flg: Some(0),
            num_test: Some(12),
            hard_bin: Some(3),
            ..Prr::default()
        });
        let body = emit(&schema, &prr, Endianness::Little).unwrap();
        assert_eq!(body.len(), 1 + 1 + 1 + 2 + 2);
    }

    #[test]
    fn unset_sentinel_fields_inside_the_body_write_their_sentinel() {
        let schema = v4::prr_schema().unwrap();
        let prr = RecordData::Prr(Prr {
            head_num: Some(1),
            site_num: Some(0),
            part_flg: Some(0),
            num_test: Some(12),
            hard_bin: Some(3),
            // soft_bin unset, then coordinates force it into the body
            x_coord: Some(-3),
            y_coord: Some(7),
            ..Prr::default()
        });
        let body = emit(&schema, &prr, Endianness::Little).unwrap();
        let decoded = decode(&schema, body, Endianness::Little);
        let RecordData::Prr(out) = decoded.data else {
            panic!("expected a PRR");
        };
        assert_eq!(out.soft_bin, None, "sentinel reads back as unset");
        assert_eq!(out.x_coord, Some(-3));
        assert_eq!(out.y_coord, Some(7));
    }

    #[test]
    fn absent_flagged_fields_pad_and_set_their_invalid_bits() {
        let schema = v4::tsr_schema().unwrap();
        let tsr = RecordData::Tsr(Tsr {
            head_num: Some(1),
            site_num: Some(2),
            test_num: Some(99),
            exec_cnt: Some(50),
            test_max: Some(3.25),
            ..Tsr::default()
        });
        let body = emit(&schema, &tsr, Endianness::Little).unwrap();
        // head site typ num exec fail alrm nam seq lbl flag tim min max
        assert_eq!(body.len(), 1 + 1 + 1 + 4 + 4 + 4 + 4 + 1 + 1 + 1 + 1 + 4 + 4 + 4);
        // test_tim, test_min, tst_sums, tst_sqrs absent
        let opt_flag = body[22];
        assert_eq!(opt_flag, 0x04 | 0x01 | 0x10 | 0x20);

        let decoded = decode(&schema, body, Endianness::Little);
        let RecordData::Tsr(out) = decoded.data else {
            panic!("expected a TSR");
        };
        assert_eq!(out.exec_cnt, Some(50));
        assert_eq!(out.fail_cnt, None);
        assert_eq!(out.test_tim, None);
        assert_eq!(out.test_min, None);
        assert_eq!(out.test_max, Some(3.25));
    }

    #[test]
    fn array_counts_derive_from_the_arrays() {
        let schema = v4::mpr_schema().unwrap();
        let mpr = RecordData::Mpr(Mpr {
            test_num: Some(2002),
            head_num: Some(1),
            site_num: Some(3),
            test_flg: Some(0),
            parm_flg: Some(0),
            rtn_stat: Some(vec![1, 2, 3]),
            rtn_rslt: Some(vec![0.5, 1.5]),
            rtn_indx: Some(vec![11, 12, 13]),
            ..Mpr::default()
        });
        let body = emit(&schema, &mpr, Endianness::Big).unwrap();
        let decoded = decode(&schema, body, Endianness::Big);
        let RecordData::Mpr(out) = decoded.data else {
            panic!("expected an MPR");
        };
        assert_eq!(out.rtn_stat, Some(vec![1, 2, 3]));
        assert_eq!(out.rtn_rslt, Some(vec![0.5, 1.5]));
        assert_eq!(out.rtn_indx, Some(vec![11, 12, 13]));
        assert_eq!(out.lo_limit, None, "absent limits stay absent");
    }

    #[test]
    fn arrays_sharing_a_count_must_agree() {
        let schema = v4::mpr_schema().unwrap();
        let mpr = RecordData::Mpr(Mpr {
            test_num: Some(1),
            head_num: Some(1),
            site_num: Some(1),
            test_flg: Some(0),
            parm_flg: Some(0),
            rtn_stat: Some(vec![1, 2]),
            rtn_indx: Some(vec![11, 12, 13]),
            ..Mpr::default()
        });
        let err = emit(&schema, &mpr, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("share a count but disagree"));
    }

    #[test]
    fn absent_array_beside_a_populated_sibling_is_an_error() {
        let schema = v4::mpr_schema().unwrap();
        let mpr = RecordData::Mpr(Mpr {
            test_num: Some(1),
            head_num: Some(1),
            site_num: Some(1),
            test_flg: Some(0),
            parm_flg: Some(0),
            rtn_indx: Some(vec![11]),
            ..Mpr::default()
        });
        let err = emit(&schema, &mpr, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("rtn_stat"));
        assert!(err.to_string().contains("1 elements"));
    }

    #[test]
    fn unset_arrays_inside_the_body_write_zero_counts() {
        let schema = v4::mpr_schema().unwrap();
        let mpr = RecordData::Mpr(Mpr {
            test_num: Some(1),
            head_num: Some(1),
            site_num: Some(1),
            test_flg: Some(0),
            parm_flg: Some(0),
            alarm_id: Some("over".into()),
            ..Mpr::default()
        });
        let body = emit(&schema, &mpr, Endianness::Little).unwrap();
        let decoded = decode(&schema, body, Endianness::Little);
        let RecordData::Mpr(out) = decoded.data else {
            panic!("expected an MPR");
        };
        assert_eq!(out.rtn_stat, None);
        assert_eq!(out.rtn_rslt, None);
        assert_eq!(out.alarm_id.as_deref(), Some("over"));
    }

    #[test]
    fn unset_field_without_a_sentinel_is_an_error() {
        let schema = v4::wir_schema().unwrap();
        let wir = RecordData::Wir(Wir {
            wafer_id: Some("W-07".into()),
            ..Wir::default()
        });
        let err = emit(&schema, &wir, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("head_num"));
        assert!(err.to_string().contains("no substitute value"));
    }

    #[test]
    fn record_with_nothing_set_has_an_empty_body() {
        let schema = v4::eps_schema().unwrap();
        let eps = RecordData::Eps(crate::records::Eps::default());
        let body = emit(&schema, &eps, Endianness::Little).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn non_latin1_text_is_rejected() {
        let schema = v4::wir_schema().unwrap();
        let wir = RecordData::Wir(Wir {
            head_num: Some(1),
            site_grp: Some(1),
            start_t: Some(0),
            wafer_id: Some("晶圆".into()),
        });
        let err = emit(&schema, &wir, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("not Latin-1 representable"));
    }

    #[test]
    fn wrong_record_kind_is_rejected() {
        let schema = v4::wir_schema().unwrap();
        let prr = RecordData::Prr(Prr::default());
        let err = emit(&schema, &prr, Endianness::Little).unwrap_err();
        assert!(err.to_string().contains("received a PRR record"));
    }
}
