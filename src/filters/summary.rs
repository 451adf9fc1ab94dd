//! # Summary Synthesis
//!
//! A finished lot should carry head-255 aggregate records: one PCR for
//! the whole file plus an HBR, SBR, and TSR per bin or test. Plenty of
//! testers only write the per-site versions. [`SummarySynthesizer`]
//! builds the missing aggregates from the per-site records and emits
//! them immediately before the end-of-stream marker, flagged
//! `synthesized` so downstream consumers can tell them from file content.
//!
//! Counter arithmetic treats a missing counter as unknown, not zero:
//! `Some(a) + None = Some(a)`, and only two unknowns stay unknown.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use super::{RecordFilter, RecordSeq};
use crate::config::{HEAD_ALL_SITES, SUMMARY_SITE_NUM};
use crate::records::{Hbr, Pcr, Record, RecordData, Sbr, Tsr};

/// None-aware counter sum.
fn opt_add(acc: Option<u32>, add: Option<u32>) -> Option<u32> {
    match (acc, add) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    }
}

#[derive(Default, Clone)]
struct PartTally {
    part_cnt: Option<u32>,
    rtst_cnt: Option<u32>,
    abrt_cnt: Option<u32>,
    good_cnt: Option<u32>,
    func_cnt: Option<u32>,
}

#[derive(Default, Clone)]
struct BinTally {
    count: Option<u32>,
    pass_fail: Option<char>,
    name: Option<String>,
}

#[derive(Default, Clone)]
struct TestTally {
    test_typ: Option<char>,
    exec_cnt: Option<u32>,
    fail_cnt: Option<u32>,
    alrm_cnt: Option<u32>,
    test_nam: Option<String>,
    seq_name: Option<String>,
    test_lbl: Option<String>,
}

#[derive(Default)]
struct Tally {
    parts: HashMap<(u8, u8), PartTally>,
    parts_covered: bool,
    hard_bins: HashMap<(u8, u8, u16), BinTally>,
    hard_covered: HashSet<u16>,
    soft_bins: HashMap<(u8, u8, u16), BinTally>,
    soft_covered: HashSet<u16>,
    tests: HashMap<(u8, u8, u32), TestTally>,
    tests_covered: HashSet<u32>,
}

impl Tally {
    fn observe(&mut self, data: &RecordData) {
        match data {
            RecordData::Pcr(pcr) => self.observe_pcr(pcr),
            RecordData::Hbr(hbr) => self.observe_hbr(hbr),
            RecordData::Sbr(sbr) => self.observe_sbr(sbr),
            RecordData::Tsr(tsr) => self.observe_tsr(tsr),
            _ => {}
        }
    }

    fn observe_pcr(&mut self, pcr: &Pcr) {
        if pcr.head_num == Some(HEAD_ALL_SITES) {
            self.parts_covered = true;
            return;
        }
        let (Some(head), Some(site)) = (pcr.head_num, pcr.site_num) else {
            return;
        };
        // a repeated summary for the same group replaces the earlier one
        self.parts.insert(
            (head, site),
            PartTally {
                part_cnt: pcr.part_cnt,
                rtst_cnt: pcr.rtst_cnt,
                abrt_cnt: pcr.abrt_cnt,
                good_cnt: pcr.good_cnt,
                func_cnt: pcr.func_cnt,
            },
        );
    }

    fn observe_hbr(&mut self, hbr: &Hbr) {
        let Some(bin) = hbr.hbin_num else { return };
        if hbr.head_num == Some(HEAD_ALL_SITES) {
            self.hard_covered.insert(bin);
            return;
        }
        let (Some(head), Some(site)) = (hbr.head_num, hbr.site_num) else {
            return;
        };
        self.hard_bins.insert(
            (head, site, bin),
            BinTally {
                count: hbr.hbin_cnt,
                pass_fail: hbr.hbin_pf,
                name: hbr.hbin_nam.clone(),
            },
        );
    }

    fn observe_sbr(&mut self, sbr: &Sbr) {
        let Some(bin) = sbr.sbin_num else { return };
        if sbr.head_num == Some(HEAD_ALL_SITES) {
            self.soft_covered.insert(bin);
            return;
        }
        let (Some(head), Some(site)) = (sbr.head_num, sbr.site_num) else {
            return;
        };
        self.soft_bins.insert(
            (head, site, bin),
            BinTally {
                count: sbr.sbin_cnt,
                pass_fail: sbr.sbin_pf,
                name: sbr.sbin_nam.clone(),
            },
        );
    }

    fn observe_tsr(&mut self, tsr: &Tsr) {
        let Some(test) = tsr.test_num else { return };
        if tsr.head_num == Some(HEAD_ALL_SITES) {
            self.tests_covered.insert(test);
            return;
        }
        let (Some(head), Some(site)) = (tsr.head_num, tsr.site_num) else {
            return;
        };
        self.tests.insert(
            (head, site, test),
            TestTally {
                test_typ: tsr.test_typ,
                exec_cnt: tsr.exec_cnt,
                fail_cnt: tsr.fail_cnt,
                alrm_cnt: tsr.alrm_cnt,
                test_nam: tsr.test_nam.clone(),
                seq_name: tsr.seq_name.clone(),
                test_lbl: tsr.test_lbl.clone(),
            },
        );
    }

    /// The missing aggregates, in emission order.
    fn flush(&self) -> Vec<RecordData> {
        let mut out = Vec::new();
        if !self.parts_covered && !self.parts.is_empty() {
            let mut total = PartTally::default();
            for tally in self.parts.values() {
                total.part_cnt = opt_add(total.part_cnt, tally.part_cnt);
                total.rtst_cnt = opt_add(total.rtst_cnt, tally.rtst_cnt);
                total.abrt_cnt = opt_add(total.abrt_cnt, tally.abrt_cnt);
                total.good_cnt = opt_add(total.good_cnt, tally.good_cnt);
                total.func_cnt = opt_add(total.func_cnt, tally.func_cnt);
            }
            out.push(RecordData::Pcr(Pcr {
                head_num: Some(HEAD_ALL_SITES),
                site_num: Some(SUMMARY_SITE_NUM),
                part_cnt: total.part_cnt,
                rtst_cnt: total.rtst_cnt,
                abrt_cnt: total.abrt_cnt,
                good_cnt: total.good_cnt,
                func_cnt: total.func_cnt,
            }));
        }
        for (bin, tally) in merge_bins(&self.hard_bins, &self.hard_covered) {
            out.push(RecordData::Hbr(Hbr {
                head_num: Some(HEAD_ALL_SITES),
                site_num: Some(SUMMARY_SITE_NUM),
                hbin_num: Some(bin),
                hbin_cnt: tally.count,
                hbin_pf: tally.pass_fail,
                hbin_nam: tally.name,
            }));
        }
        for (bin, tally) in merge_bins(&self.soft_bins, &self.soft_covered) {
            out.push(RecordData::Sbr(Sbr {
                head_num: Some(HEAD_ALL_SITES),
                site_num: Some(SUMMARY_SITE_NUM),
                sbin_num: Some(bin),
                sbin_cnt: tally.count,
                sbin_pf: tally.pass_fail,
                sbin_nam: tally.name,
            }));
        }
        for (test, tally) in merge_tests(&self.tests, &self.tests_covered) {
            out.push(RecordData::Tsr(Tsr {
                head_num: Some(HEAD_ALL_SITES),
                site_num: Some(SUMMARY_SITE_NUM),
                test_typ: tally.test_typ,
                test_num: Some(test),
                exec_cnt: tally.exec_cnt,
                fail_cnt: tally.fail_cnt,
                alrm_cnt: tally.alrm_cnt,
                test_nam: tally.test_nam,
                seq_name: tally.seq_name,
                test_lbl: tally.test_lbl,
                ..Tsr::default()
            }));
        }
        out
    }
}

/// Aggregates bin groups across heads and sites, in bin order. Counters
/// add; labels take the first value seen in (head, site) order.
fn merge_bins(
    bins: &HashMap<(u8, u8, u16), BinTally>,
    covered: &HashSet<u16>,
) -> Vec<(u16, BinTally)> {
    let mut keys: Vec<(u8, u8, u16)> = bins.keys().copied().collect();
    keys.sort_unstable_by_key(|&(head, site, bin)| (bin, head, site));
    let mut merged: Vec<(u16, BinTally)> = Vec::new();
    for key in keys {
        let (head, site, bin) = key;
        if covered.contains(&bin) {
            continue;
        }
        let tally = &bins[&(head, site, bin)];
        match merged.last_mut() {
            Some((current, total)) if *current == bin => {
                total.count = opt_add(total.count, tally.count);
                if total.pass_fail.is_none() {
                    total.pass_fail = tally.pass_fail;
                }
                if total.name.is_none() {
                    total.name = tally.name.clone();
                }
            }
            _ => merged.push((bin, tally.clone())),
        }
    }
    merged
}

/// Aggregates test synopses across heads and sites, in test order.
fn merge_tests(
    tests: &HashMap<(u8, u8, u32), TestTally>,
    covered: &HashSet<u32>,
) -> Vec<(u32, TestTally)> {
    let mut keys: Vec<(u8, u8, u32)> = tests.keys().copied().collect();
    keys.sort_unstable_by_key(|&(head, site, test)| (test, head, site));
    let mut merged: Vec<(u32, TestTally)> = Vec::new();
    for key in keys {
        let (head, site, test) = key;
        if covered.contains(&test) {
            continue;
        }
        let tally = &tests[&(head, site, test)];
        match merged.last_mut() {
            Some((current, total)) if *current == test => {
                total.exec_cnt = opt_add(total.exec_cnt, tally.exec_cnt);
                total.fail_cnt = opt_add(total.fail_cnt, tally.fail_cnt);
                total.alrm_cnt = opt_add(total.alrm_cnt, tally.alrm_cnt);
                if total.test_typ.is_none() {
                    total.test_typ = tally.test_typ;
                }
                if total.test_nam.is_none() {
                    total.test_nam = tally.test_nam.clone();
                }
                if total.seq_name.is_none() {
                    total.seq_name = tally.seq_name.clone();
                }
                if total.test_lbl.is_none() {
                    total.test_lbl = tally.test_lbl.clone();
                }
            }
            _ => merged.push((test, tally.clone())),
        }
    }
    merged
}

/// Synthesizes missing head-255 summary records from per-site ones.
///
/// An upstream head-255 record suppresses its group: the whole PCR, the
/// matching bin, or the matching test. A file that already carries its
/// aggregates gains nothing, so running the filter again is a no-op.
pub struct SummarySynthesizer;

impl RecordFilter for SummarySynthesizer {
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
        Box::new(Synthesize {
            upstream: records,
            tally: Tally::default(),
            ready: VecDeque::new(),
        })
    }
}

struct Synthesize<'a> {
    upstream: RecordSeq<'a>,
    tally: Tally,
    ready: VecDeque<Record>,
}

impl Iterator for Synthesize<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if let Some(record) = self.ready.pop_front() {
            return Some(record);
        }
        let record = self.upstream.next()?;
        if matches!(record.data, RecordData::EndOfStream(_)) {
            for data in self.tally.flush() {
                let mut aggregate = Record::at_offset(record.offset, data);
                aggregate.synthesized = true;
                self.ready.push_back(aggregate);
            }
            self.ready.push_back(record);
            return self.ready.pop_front();
        }
        self.tally.observe(&record.data);
        Some(record)
    }
}
