//! # Content Order Validation
//!
//! STDF files follow a grammar:
//!
//! ```text
//!   FAR ─▶ ATR* ─▶ MIR ─▶ configuration ─▶ test activity ─▶ MRR
//! ```
//!
//! [`OrderValidator`] checks the stream against it and flags misplaced
//! records inline with an [`OrderError`] marker placed immediately before
//! the offending record. The record itself still flows through, and the
//! stream never halts: validation is a report, not a gate.
//!
//! After a violation the validator moves to the phase the record implies,
//! but only forward. A fragment that opens with a WIR gets one error for
//! the missing preamble, then its body records are judged normally.

use super::{RecordFilter, RecordSeq};
use crate::records::{OrderError, Record, RecordData, RecordType};

/// Position in the file grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    /// Nothing seen; the FAR must come first.
    AwaitFar,
    /// FAR seen; ATRs may follow until the MIR.
    Preamble,
    /// MIR seen; configuration records load here.
    Setup,
    /// Wafer, part, or test activity has begun.
    Body,
    /// MRR seen; the stream should only end.
    Ended,
}

/// Configuration kinds that belong between the MIR and the first activity.
fn is_setup(record_type: RecordType) -> bool {
    matches!(
        record_type,
        RecordType::PMR
            | RecordType::PGR
            | RecordType::RDR
            | RecordType::SDR
            | RecordType::WCR
    )
}

/// Wafer, part, test, and summary kinds, all legal once the MIR is in.
fn is_activity(record_type: RecordType) -> bool {
    matches!(
        record_type,
        RecordType::WIR
            | RecordType::WRR
            | RecordType::PIR
            | RecordType::PRR
            | RecordType::PTR
            | RecordType::MPR
            | RecordType::FTR
            | RecordType::BPS
            | RecordType::EPS
            | RecordType::PCR
            | RecordType::HBR
            | RecordType::SBR
            | RecordType::TSR
    )
}

/// Kinds legal anywhere after the MIR, without a phase of their own.
fn is_floating(record_type: RecordType) -> bool {
    matches!(record_type, RecordType::DTR | RecordType::GDR)
}

/// One grammar step: the next phase, plus a violation message when the
/// record is out of place.
fn advance(phase: Phase, record_type: RecordType) -> (Phase, Option<String>) {
    use Phase::*;
    match record_type {
        RecordType::FAR => match phase {
            AwaitFar => (Preamble, None),
            _ => (phase, Some("a FAR only opens a stream".into())),
        },
        RecordType::ATR => match phase {
            Preamble => (Preamble, None),
            _ => (
                phase,
                Some("ATR belongs between the FAR and the MIR".into()),
            ),
        },
        RecordType::MIR => match phase {
            Preamble => (Setup, None),
            AwaitFar => (Setup, Some("MIR before any FAR".into())),
            _ => (phase, Some("duplicate or late MIR".into())),
        },
        RecordType::MRR => match phase {
            Setup | Body => (Ended, None),
            AwaitFar | Preamble => (Ended, Some("MRR before the MIR".into())),
            Ended => (Ended, Some("duplicate MRR".into())),
        },
        rt if is_setup(rt) => match phase {
            Setup => (Setup, None),
            AwaitFar | Preamble => (Setup, Some(format!("{rt} before the MIR"))),
            Body => (Body, Some(format!("{rt} after test activity began"))),
            Ended => (Ended, Some(format!("{rt} after the MRR"))),
        },
        rt if is_activity(rt) => match phase {
            Setup | Body => (Body, None),
            AwaitFar | Preamble => (Body, Some(format!("{rt} before the MIR"))),
            Ended => (Ended, Some(format!("{rt} after the MRR"))),
        },
        rt if is_floating(rt) => match phase {
            Setup | Body => (phase, None),
            AwaitFar | Preamble => (phase, Some(format!("{rt} before the MIR"))),
            Ended => (Ended, Some(format!("{rt} after the MRR"))),
        },
        // unrecognized kinds have no position in the grammar
        _ => (phase, None),
    }
}

/// Flags records that break the file grammar, without halting the stream.
pub struct OrderValidator;

impl RecordFilter for OrderValidator {
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
        Box::new(OrderCheck {
            upstream: records,
            phase: Phase::AwaitFar,
            held: None,
        })
    }
}

struct OrderCheck<'a> {
    upstream: RecordSeq<'a>,
    phase: Phase,
    /// The judged record, queued behind its error marker.
    held: Option<Record>,
}

impl Iterator for OrderCheck<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if let Some(record) = self.held.take() {
            return Some(record);
        }
        let record = self.upstream.next()?;
        if record.synthesized || !record.data.is_writable() {
            return Some(record);
        }
        let Some(record_type) = record.data.record_type() else {
            return Some(record);
        };
        let (phase, violation) = advance(self.phase, record_type);
        self.phase = phase;
        match violation {
            Some(message) => {
                let marker = Record::at_offset(
                    record.offset,
                    RecordData::OrderError(OrderError {
                        record_type,
                        message,
                    }),
                );
                self.held = Some(record);
                Some(marker)
            }
            None => Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        Atr, EndOfStream, Far, Mir, Mrr, Pcr, Pir, Pmr, Prr, Ptr, StartOfStream, Wir,
    };

    fn run(records: Vec<Record>) -> Vec<Record> {
        OrderValidator
            .apply(Box::new(records.into_iter()))
            .collect()
    }

    fn order_errors(records: &[Record]) -> Vec<RecordType> {
        records
            .iter()
            .filter_map(|record| match &record.data {
                RecordData::OrderError(err) => Some(err.record_type),
                _ => None,
            })
            .collect()
    }

    fn plain(data: RecordData) -> Record {
        Record::new(data)
    }

    #[test]
    fn a_well_formed_stream_passes_untouched() {
        let records = vec![
            plain(RecordData::StartOfStream(StartOfStream { endian: None })),
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Atr(Atr::default())),
            plain(RecordData::Mir(Mir::default())),
            plain(RecordData::Pir(Pir::default())),
            plain(RecordData::Ptr(Ptr::default())),
            plain(RecordData::Prr(Prr::default())),
            plain(RecordData::Mrr(Mrr::default())),
            plain(RecordData::EndOfStream(EndOfStream)),
        ];
        let out = run(records.clone());
        assert_eq!(out, records);
    }

    #[test]
    fn an_atr_after_the_mir_is_flagged_before_the_record() {
        let out = run(vec![
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Mir(Mir::default())),
            plain(RecordData::Atr(Atr::default())),
        ]);
        assert_eq!(out.len(), 4);
        let RecordData::OrderError(err) = &out[2].data else {
            panic!("expected an order error, got {:?}", out[2]);
        };
        assert_eq!(err.record_type, RecordType::ATR);
        assert!(err.message.contains("between the FAR and the MIR"));
        assert!(matches!(out[3].data, RecordData::Atr(_)));
    }

    #[test]
    fn two_fars_after_the_mrr_flag_twice_without_halting() {
        let out = run(vec![
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Mir(Mir::default())),
            plain(RecordData::Mrr(Mrr::default())),
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Far(Far::default())),
            plain(RecordData::EndOfStream(EndOfStream)),
        ]);
        assert_eq!(order_errors(&out), vec![RecordType::FAR, RecordType::FAR]);
        assert!(matches!(
            out.last().unwrap().data,
            RecordData::EndOfStream(_)
        ));
    }

    #[test]
    fn setup_records_after_test_activity_are_flagged() {
        let out = run(vec![
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Mir(Mir::default())),
            plain(RecordData::Pir(Pir::default())),
            plain(RecordData::Pmr(Pmr::default())),
        ]);
        assert_eq!(order_errors(&out), vec![RecordType::PMR]);
    }

    #[test]
    fn a_headerless_fragment_is_flagged_once_then_judged_normally() {
        let out = run(vec![
            plain(RecordData::Wir(Wir::default())),
            plain(RecordData::Pir(Pir::default())),
            plain(RecordData::Ptr(Ptr::default())),
        ]);
        assert_eq!(order_errors(&out), vec![RecordType::WIR]);
    }

    #[test]
    fn synthesized_records_are_never_judged() {
        let mut summary = plain(RecordData::Pcr(Pcr::default()));
        summary.synthesized = true;
        let out = run(vec![
            plain(RecordData::Far(Far::default())),
            plain(RecordData::Mir(Mir::default())),
            plain(RecordData::Mrr(Mrr::default())),
            summary,
            plain(RecordData::EndOfStream(EndOfStream)),
        ]);
        assert!(order_errors(&out).is_empty());
    }
}
