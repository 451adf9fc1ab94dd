//! # Record Model
//!
//! Everything the reader emits and the writer consumes is a [`Record`]: a
//! stream offset, a synthesized flag, and a [`RecordData`] payload. The
//! payload is a closed sum over three families:
//!
//! | Family   | Variants                                                    |
//! |----------|-------------------------------------------------------------|
//! | Markers  | start/end of stream, format errors, corrupt runs, ordering  |
//! |          | violations; in-band events with no wire bytes               |
//! | Unknown  | framed but unparsed bodies, preserved byte-for-byte         |
//! | V4 kinds | the 24 typed record structs under [`v4`]                    |
//!
//! Typed records expose every schema-backed field as an `Option`: `None`
//! means the field was truncated away, flagged invalid, or equal to its
//! missing-value sentinel. The [`RecordFields`] trait is the dynamic
//! property interface the conversion interpreter drives; the structs also
//! expose their fields directly for typed code.
//!
//! ## Module Structure
//!
//! - `header`: record framing and the [`RecordType`] registry
//! - `value`: the dynamic [`FieldValue`] union
//! - `markers`: stream-event payloads
//! - `unknown`: the raw passthrough record
//! - `v4`: the STDF V4 record structs and their layout tables

pub mod header;
pub mod markers;
pub mod unknown;
pub mod v4;
pub mod value;

pub use header::{RecordHeader, RecordType};
pub use markers::{CorruptData, EndOfStream, FormatError, OrderError, StartOfStream};
pub use unknown::UnknownRecord;
pub use v4::{
    Atr, Bps, Dtr, Eps, Far, Ftr, Gdr, GenericData, Hbr, Mir, Mpr, Mrr, Pcr, Pgr, Pir, Pmr, Prr,
    Ptr, Rdr, Sbr, Sdr, Tsr, Wcr, Wir, Wrr,
};
pub use value::FieldValue;

use eyre::Result;

/// Dynamic field access by property name. Implemented by every typed record
/// so one interpreter can fill and drain them all.
pub trait RecordFields {
    /// Stores a decoded value. Fails on unknown property names and on
    /// values of the wrong shape.
    fn set_field(&mut self, property: &str, value: FieldValue) -> Result<()>;

    /// Reads a field back out. `Ok(None)` means the field is unset; an
    /// unknown property name is an error.
    fn field(&self, property: &str) -> Result<Option<FieldValue>>;
}

/// One element of a record stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Stream offset of the record header. Synthesized records carry the
    /// offset of the record they were emitted before.
    pub offset: u64,
    /// Set on records invented by a pipeline filter rather than read from
    /// the stream, such as missing summary records.
    pub synthesized: bool,
    pub data: RecordData,
}

impl Record {
    pub fn new(data: RecordData) -> Self {
        Self {
            offset: 0,
            synthesized: false,
            data,
        }
    }

    pub fn at_offset(offset: u64, data: RecordData) -> Self {
        Self {
            offset,
            synthesized: false,
            data,
        }
    }

    pub fn synthesized(data: RecordData, offset: u64) -> Self {
        Self {
            offset,
            synthesized: true,
            data,
        }
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.data.record_type()
    }

    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }
}

/// The payload of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordData {
    StartOfStream(StartOfStream),
    EndOfStream(EndOfStream),
    FormatError(FormatError),
    CorruptData(CorruptData),
    OrderError(OrderError),
    Unknown(UnknownRecord),
    Far(Far),
    Atr(Atr),
    Mir(Mir),
    Mrr(Mrr),
    Pcr(Pcr),
    Hbr(Hbr),
    Sbr(Sbr),
    Pmr(Pmr),
    Pgr(Pgr),
    Rdr(Rdr),
    Sdr(Sdr),
    Wir(Wir),
    Wrr(Wrr),
    Wcr(Wcr),
    Pir(Pir),
    Prr(Prr),
    Tsr(Tsr),
    Ptr(Ptr),
    Mpr(Mpr),
    Ftr(Ftr),
    Bps(Bps),
    Eps(Eps),
    Gdr(Gdr),
    Dtr(Dtr),
}

impl RecordData {
    /// The wire type pair, or `None` for marker records that never
    /// correspond to bytes.
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            RecordData::StartOfStream(_)
            | RecordData::EndOfStream(_)
            | RecordData::FormatError(_)
            | RecordData::CorruptData(_)
            | RecordData::OrderError(_) => None,
            RecordData::Unknown(raw) => Some(raw.record_type()),
            RecordData::Far(_) => Some(RecordType::FAR),
            RecordData::Atr(_) => Some(RecordType::ATR),
            RecordData::Mir(_) => Some(RecordType::MIR),
            RecordData::Mrr(_) => Some(RecordType::MRR),
            RecordData::Pcr(_) => Some(RecordType::PCR),
            RecordData::Hbr(_) => Some(RecordType::HBR),
            RecordData::Sbr(_) => Some(RecordType::SBR),
            RecordData::Pmr(_) => Some(RecordType::PMR),
            RecordData::Pgr(_) => Some(RecordType::PGR),
            RecordData::Rdr(_) => Some(RecordType::RDR),
            RecordData::Sdr(_) => Some(RecordType::SDR),
            RecordData::Wir(_) => Some(RecordType::WIR),
            RecordData::Wrr(_) => Some(RecordType::WRR),
            RecordData::Wcr(_) => Some(RecordType::WCR),
            RecordData::Pir(_) => Some(RecordType::PIR),
            RecordData::Prr(_) => Some(RecordType::PRR),
            RecordData::Tsr(_) => Some(RecordType::TSR),
            RecordData::Ptr(_) => Some(RecordType::PTR),
            RecordData::Mpr(_) => Some(RecordType::MPR),
            RecordData::Ftr(_) => Some(RecordType::FTR),
            RecordData::Bps(_) => Some(RecordType::BPS),
            RecordData::Eps(_) => Some(RecordType::EPS),
            RecordData::Gdr(_) => Some(RecordType::GDR),
            RecordData::Dtr(_) => Some(RecordType::DTR),
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            RecordData::StartOfStream(_)
                | RecordData::EndOfStream(_)
                | RecordData::FormatError(_)
                | RecordData::CorruptData(_)
                | RecordData::OrderError(_)
        )
    }

    /// Whether the writer can put this record on the wire. Everything that
    /// has a type pair can be written; markers cannot.
    pub fn is_writable(&self) -> bool {
        !self.is_marker()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RecordData::StartOfStream(_) => "start-of-stream",
            RecordData::EndOfStream(_) => "end-of-stream",
            RecordData::FormatError(_) => "format-error",
            RecordData::CorruptData(_) => "corrupt-data",
            RecordData::OrderError(_) => "order-error",
            RecordData::Unknown(_) => "unknown",
            RecordData::Far(_) => "FAR",
            RecordData::Atr(_) => "ATR",
            RecordData::Mir(_) => "MIR",
            RecordData::Mrr(_) => "MRR",
            RecordData::Pcr(_) => "PCR",
            RecordData::Hbr(_) => "HBR",
            RecordData::Sbr(_) => "SBR",
            RecordData::Pmr(_) => "PMR",
            RecordData::Pgr(_) => "PGR",
            RecordData::Rdr(_) => "RDR",
            RecordData::Sdr(_) => "SDR",
            RecordData::Wir(_) => "WIR",
            RecordData::Wrr(_) => "WRR",
            RecordData::Wcr(_) => "WCR",
            RecordData::Pir(_) => "PIR",
            RecordData::Prr(_) => "PRR",
            RecordData::Tsr(_) => "TSR",
            RecordData::Ptr(_) => "PTR",
            RecordData::Mpr(_) => "MPR",
            RecordData::Ftr(_) => "FTR",
            RecordData::Bps(_) => "BPS",
            RecordData::Eps(_) => "EPS",
            RecordData::Gdr(_) => "GDR",
            RecordData::Dtr(_) => "DTR",
        }
    }

    /// Dynamic property access for schema-backed kinds. `None` for markers,
    /// unknown records, and the GDR, whose payload is type-tagged rather
    /// than positional.
    pub fn as_fields(&self) -> Option<&dyn RecordFields> {
        macro_rules! arms {
            ($($variant:ident),+) => {
                match self {
                    $(RecordData::$variant(inner) => Some(inner as &dyn RecordFields),)+
                    _ => None,
                }
            };
        }
        arms!(
            Far, Atr, Mir, Mrr, Pcr, Hbr, Sbr, Pmr, Pgr, Rdr, Sdr, Wir, Wrr, Wcr, Pir, Prr, Tsr,
            Ptr, Mpr, Ftr, Bps, Eps, Dtr
        )
    }

    pub fn as_fields_mut(&mut self) -> Option<&mut dyn RecordFields> {
        macro_rules! arms {
            ($($variant:ident),+) => {
                match self {
                    $(RecordData::$variant(inner) => Some(inner as &mut dyn RecordFields),)+
                    _ => None,
                }
            };
        }
        arms!(
            Far, Atr, Mir, Mrr, Pcr, Hbr, Sbr, Pmr, Pgr, Rdr, Sdr, Wir, Wrr, Wcr, Pir, Prr, Tsr,
            Ptr, Mpr, Ftr, Bps, Eps, Dtr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Endianness;

    #[test]
    fn markers_have_no_record_type() {
        let marker = RecordData::EndOfStream(EndOfStream);
        assert_eq!(marker.record_type(), None);
        assert!(marker.is_marker());
        assert!(!marker.is_writable());
    }

    #[test]
    fn typed_kinds_report_their_type_pair() {
        let record = RecordData::Hbr(Hbr::default());
        assert_eq!(record.record_type(), Some(RecordType::HBR));
        assert!(record.is_writable());
        assert_eq!(record.kind_name(), "HBR");
    }

    #[test]
    fn unknown_records_report_the_framed_type() {
        let raw = UnknownRecord::new(RecordType::new(7, 77), 0, Endianness::Little, vec![]);
        let record = RecordData::Unknown(raw);
        assert_eq!(record.record_type(), Some(RecordType::new(7, 77)));
        assert!(record.as_fields().is_none());
    }

    #[test]
    fn field_access_round_trips_through_the_trait() {
        let mut record = RecordData::Hbr(Hbr::default());
        let fields = record.as_fields_mut().unwrap();
        fields
            .set_field("hbin_num", FieldValue::U16(42))
            .unwrap();
        assert_eq!(
            record.as_fields().unwrap().field("hbin_num").unwrap(),
            Some(FieldValue::U16(42))
        );
        assert_eq!(record.as_fields().unwrap().field("hbin_nam").unwrap(), None);
    }

    #[test]
    fn synthesized_records_carry_the_flag() {
        let record = Record::synthesized(RecordData::EndOfStream(EndOfStream), 64);
        assert!(record.synthesized);
        assert_eq!(record.offset, 64);
        assert!(!Record::new(RecordData::EndOfStream(EndOfStream)).synthesized);
    }
}
