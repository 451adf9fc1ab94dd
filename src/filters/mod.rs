//! # Record Pipeline Filters
//!
//! Filters are transforms over boxed record iterators. A [`RecordFilter`]
//! takes the sequence so far and returns a wrapped sequence, so chaining
//! is plain function composition:
//!
//! ```text
//!   pump ──▶ order ──▶ defaults ──▶ summaries ──▶ caller ──▶ cache ──▶
//! ```
//!
//! Every filter passes markers through; filters that invent records mark
//! them `synthesized`, and downstream filters skip those. The stock set:
//!
//! | Filter                 | Job                                           |
//! |------------------------|-----------------------------------------------|
//! | [`OrderValidator`]     | flag records that break the file grammar      |
//! | [`DefaultPropagator`]  | fill omitted PTR fields from each test's first|
//! | [`SummarySynthesizer`] | invent missing head-255 summary records       |
//! | [`CachingFilter`]      | materialize one play, replay the rest         |

pub mod caching;
pub mod defaults;
pub mod order;
pub mod summary;

pub use caching::CachingFilter;
pub use defaults::DefaultPropagator;
pub use order::OrderValidator;
pub use summary::SummarySynthesizer;

use crate::records::Record;

/// A stage of the record pipeline.
pub type RecordSeq<'a> = Box<dyn Iterator<Item = Record> + 'a>;

/// A transform over record sequences.
pub trait RecordFilter {
    /// Wraps a sequence with this filter's behavior. Stateful filters
    /// keep per-play state inside the returned iterator, so each call
    /// starts fresh.
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a>;
}

impl<F> RecordFilter for F
where
    F: for<'a> Fn(RecordSeq<'a>) -> RecordSeq<'a>,
{
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
        self(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EndOfStream, Pir, RecordData};

    struct DropMarkers;

    impl RecordFilter for DropMarkers {
        fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
            Box::new(records.filter(|record| !record.data.is_marker()))
        }
    }

    #[test]
    fn filters_compose_left_to_right() {
        let records = vec![
            Record::new(RecordData::Pir(Pir::default())),
            Record::new(RecordData::EndOfStream(EndOfStream)),
        ];
        let base: RecordSeq<'_> = Box::new(records.into_iter());
        let filter = DropMarkers;
        let out: Vec<Record> = filter.apply(base).collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].data, RecordData::Pir(_)));
    }
}
