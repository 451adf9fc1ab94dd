//! # Program Section Records
//!
//! BPS/EPS bracket a named section of the test program, such as one flow or
//! sequencer run. EPS has no body at all.

use eyre::Result;

use crate::records::{RecordData, RecordType};
use crate::schema::RecordSchema;
use crate::stdf_record;

use super::optional_text;

stdf_record! {
    /// Begins a program section.
    pub struct Bps {
        seq_name: str,
    }
}

pub(crate) fn bps_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::BPS,
        "Bps",
        || RecordData::Bps(Bps::default()),
        vec![optional_text(0, "seq_name")],
    )
}

stdf_record! {
    /// Ends the innermost open program section. Carries no fields.
    pub struct Eps {}
}

pub(crate) fn eps_schema() -> Result<RecordSchema> {
    RecordSchema::new(
        RecordType::EPS,
        "Eps",
        || RecordData::Eps(Eps::default()),
        Vec::new(),
    )
}
