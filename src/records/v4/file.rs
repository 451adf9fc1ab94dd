//! # File-Level Records
//!
//! FAR (File Attributes Record) and ATR (Audit Trail Record). The FAR is
//! the only record whose fields are plain values instead of `Option`s: it
//! must be complete or the file has no defined byte order at all.

use eyre::{bail, Result};

use crate::config::{CPU_TYPE_X86, STDF_VERSION_V4};
use crate::records::{FieldValue, RecordData, RecordFields, RecordType};
use crate::schema::{FieldDescriptor, FieldType, RecordSchema};
use crate::stdf_record;

use super::optional_text;

/// File attributes: the CPU_TYPE byte that selects the stream byte order
/// and the STDF version. Always the first record of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Far {
    pub cpu_type: u8,
    pub stdf_ver: u8,
}

impl Default for Far {
    fn default() -> Self {
        Self {
            cpu_type: CPU_TYPE_X86,
            stdf_ver: STDF_VERSION_V4,
        }
    }
}

impl RecordFields for Far {
    fn set_field(&mut self, property: &str, value: FieldValue) -> Result<()> {
        match property {
            "cpu_type" => self.cpu_type = value.as_u8()?,
            "stdf_ver" => self.stdf_ver = value.as_u8()?,
            other => bail!("record Far has no property named {other}"),
        }
        Ok(())
    }

    fn field(&self, property: &str) -> Result<Option<FieldValue>> {
        Ok(Some(match property {
            "cpu_type" => FieldValue::U8(self.cpu_type),
            "stdf_ver" => FieldValue::U8(self.stdf_ver),
            other => bail!("record Far has no property named {other}"),
        }))
    }
}

pub(crate) fn far_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::FAR,
        "Far",
        || RecordData::Far(Far::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U1).with_property("cpu_type"),
            FieldDescriptor::plain(1, FieldType::U1).with_property("stdf_ver"),
        ],
    )
}

stdf_record! {
    /// Audit trail: one modification event applied to the file after it
    /// was first written.
    pub struct Atr {
        /// When the file was modified, epoch seconds.
        mod_tim: u32,
        /// Command line of the program that modified it.
        cmd_line: str,
    }
}

pub(crate) fn atr_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::ATR,
        "Atr",
        || RecordData::Atr(Atr::default()),
        vec![
            FieldDescriptor::plain(0, FieldType::U4).with_property("mod_tim"),
            optional_text(1, "cmd_line"),
        ],
    )
}
