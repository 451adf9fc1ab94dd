//! # STDF V4 Record Definitions
//!
//! One module per record family, each holding the record structs and their
//! layout tables. [`register_all`] installs the full set into a
//! [`ConverterFactory`]; GDR goes in as a custom codec because its shape is
//! self-describing rather than fixed.
//!
//! | Module    | Records                  |
//! |-----------|--------------------------|
//! | `file`    | FAR, ATR                 |
//! | `lot`     | MIR, MRR, PCR            |
//! | `bins`    | HBR, SBR                 |
//! | `setup`   | PMR, PGR, RDR, SDR       |
//! | `wafer`   | WIR, WRR, WCR            |
//! | `part`    | PIR, PRR                 |
//! | `test`    | TSR, PTR, MPR, FTR       |
//! | `program` | BPS, EPS                 |
//! | `generic` | GDR, DTR                 |
//!
//! ## Optional Text and Code Conventions
//!
//! V4 marks most optional `C*n` fields as "length byte = 0 means missing"
//! and most optional `C*1` fields as "space means missing". The
//! [`optional_text`] and [`optional_code`] helpers encode those two
//! conventions once so the layout tables stay declarative.

use eyre::Result;

use crate::convert::ConverterFactory;
use crate::records::{FieldValue, RecordType};
use crate::schema::{FieldDescriptor, FieldType};

mod bins;
mod file;
mod generic;
mod lot;
mod part;
mod program;
mod setup;
mod test;
mod wafer;

pub use bins::{Hbr, Sbr};
pub use file::{Atr, Far};
pub use generic::{Dtr, Gdr, GenericData};
pub use lot::{Mir, Mrr, Pcr};
pub use part::{Pir, Prr};
pub use program::{Bps, Eps};
pub use setup::{Pgr, Pmr, Rdr, Sdr};
pub use test::{Ftr, Mpr, Ptr, Tsr};
pub use wafer::{Wcr, Wir, Wrr};

#[cfg(test)]
pub(crate) use file::{atr_schema, far_schema};
#[cfg(test)]
pub(crate) use lot::mir_schema;
#[cfg(test)]
pub(crate) use part::{pir_schema, prr_schema};
#[cfg(test)]
pub(crate) use program::eps_schema;
#[cfg(test)]
pub(crate) use test::{ftr_schema, mpr_schema, ptr_schema, tsr_schema};
#[cfg(test)]
pub(crate) use wafer::wir_schema;

/// An optional `C*n` field: an empty string on the wire means the property
/// stays unset.
pub(crate) fn optional_text(index: usize, property: &'static str) -> FieldDescriptor {
    FieldDescriptor::plain(index, FieldType::Cn)
        .with_property(property)
        .with_missing(FieldValue::Str(String::new()))
}

/// An optional `C*1` code field: a space on the wire means the property
/// stays unset.
pub(crate) fn optional_code(index: usize, property: &'static str) -> FieldDescriptor {
    FieldDescriptor::plain(index, FieldType::C1)
        .with_property(property)
        .with_missing(FieldValue::Char(' '))
}

/// Registers every V4 record kind.
pub fn register_all(factory: &mut ConverterFactory) -> Result<()> {
    factory.register(file::far_schema()?)?;
    factory.register(file::atr_schema()?)?;
    factory.register(lot::mir_schema()?)?;
    factory.register(lot::mrr_schema()?)?;
    factory.register(lot::pcr_schema()?)?;
    factory.register(bins::hbr_schema()?)?;
    factory.register(bins::sbr_schema()?)?;
    factory.register(setup::pmr_schema()?)?;
    factory.register(setup::pgr_schema()?)?;
    factory.register(setup::rdr_schema()?)?;
    factory.register(setup::sdr_schema()?)?;
    factory.register(wafer::wir_schema()?)?;
    factory.register(wafer::wrr_schema()?)?;
    factory.register(wafer::wcr_schema()?)?;
    factory.register(part::pir_schema()?)?;
    factory.register(part::prr_schema()?)?;
    factory.register(test::tsr_schema()?)?;
    factory.register(test::ptr_schema()?)?;
    factory.register(test::mpr_schema()?)?;
    factory.register(test::ftr_schema()?)?;
    factory.register(program::bps_schema()?)?;
    factory.register(program::eps_schema()?)?;
    factory.register(generic::dtr_schema()?)?;
    factory.register_custom(
        RecordType::GDR,
        Box::new(generic::convert_gdr),
        Box::new(generic::unconvert_gdr),
    )?;
    Ok(())
}
