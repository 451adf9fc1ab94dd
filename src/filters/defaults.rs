//! # Test Parameter Defaults
//!
//! The first PTR for each test number carries the stable execution
//! context: scaling exponents, limits, units, and display formats. Later
//! PTRs for the same test may omit them to save space, either by
//! truncating the record or by flagging them invalid. [`DefaultPropagator`]
//! restores those fields from the first record, so every PTR a consumer
//! sees is self-contained.
//!
//! The baseline is strictly first-record-wins per test number: a later
//! PTR that does carry a value keeps its own value for that record, but
//! never rewrites the baseline.

use hashbrown::HashMap;

use super::{RecordFilter, RecordSeq};
use crate::records::{Ptr, Record, RecordData};

/// The fields a later PTR may omit and inherit.
#[derive(Clone, Default)]
struct Baseline {
    res_scal: Option<i8>,
    llm_scal: Option<i8>,
    hlm_scal: Option<i8>,
    lo_limit: Option<f32>,
    hi_limit: Option<f32>,
    units: Option<String>,
    c_resfmt: Option<String>,
    c_llmfmt: Option<String>,
    c_hlmfmt: Option<String>,
    lo_spec: Option<f32>,
    hi_spec: Option<f32>,
}

impl Baseline {
    fn capture(ptr: &Ptr) -> Self {
        Self {
            res_scal: ptr.res_scal,
            llm_scal: ptr.llm_scal,
            hlm_scal: ptr.hlm_scal,
            lo_limit: ptr.lo_limit,
            hi_limit: ptr.hi_limit,
            units: ptr.units.clone(),
            c_resfmt: ptr.c_resfmt.clone(),
            c_llmfmt: ptr.c_llmfmt.clone(),
            c_hlmfmt: ptr.c_hlmfmt.clone(),
            lo_spec: ptr.lo_spec,
            hi_spec: ptr.hi_spec,
        }
    }

    fn fill(&self, ptr: &mut Ptr) {
        ptr.res_scal = ptr.res_scal.or(self.res_scal);
        ptr.llm_scal = ptr.llm_scal.or(self.llm_scal);
        ptr.hlm_scal = ptr.hlm_scal.or(self.hlm_scal);
        ptr.lo_limit = ptr.lo_limit.or(self.lo_limit);
        ptr.hi_limit = ptr.hi_limit.or(self.hi_limit);
        ptr.lo_spec = ptr.lo_spec.or(self.lo_spec);
        ptr.hi_spec = ptr.hi_spec.or(self.hi_spec);
        if ptr.units.is_none() {
            ptr.units = self.units.clone();
        }
        if ptr.c_resfmt.is_none() {
            ptr.c_resfmt = self.c_resfmt.clone();
        }
        if ptr.c_llmfmt.is_none() {
            ptr.c_llmfmt = self.c_llmfmt.clone();
        }
        if ptr.c_hlmfmt.is_none() {
            ptr.c_hlmfmt = self.c_hlmfmt.clone();
        }
    }
}

/// Fills omitted PTR context fields from each test's first record.
pub struct DefaultPropagator;

impl RecordFilter for DefaultPropagator {
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
        let mut baselines: HashMap<u32, Baseline> = HashMap::new();
        Box::new(records.map(move |mut record| {
            if let RecordData::Ptr(ptr) = &mut record.data {
                if let Some(test_num) = ptr.test_num {
                    match baselines.get(&test_num) {
                        Some(baseline) => baseline.fill(ptr),
                        None => {
                            baselines.insert(test_num, Baseline::capture(ptr));
                        }
                    }
                }
            }
            record
        }))
    }
}
