//! # Stream Caching
//!
//! Reading a gzip source twice means inflating it twice; reading a
//! filtered pipeline twice repeats every filter's work. [`CachingFilter`]
//! pays that cost once: the first play materializes the records it sees,
//! and every later play replays the stored copy without touching
//! upstream.

use std::cell::RefCell;
use std::sync::Arc;

use super::{RecordFilter, RecordSeq};
use crate::records::Record;

enum CacheState {
    Empty,
    Filling,
    Full(Arc<Vec<Record>>),
}

/// Materializes the stream on first play and replays it afterwards.
///
/// A play abandoned partway discards the partial cache; the next play
/// pulls from wherever upstream stopped, because upstream iterators are
/// one-shot. Starting a second play while the first is still
/// materializing panics: two pulls would race for the same upstream
/// records.
pub struct CachingFilter {
    state: RefCell<CacheState>,
}

impl CachingFilter {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(CacheState::Empty),
        }
    }

    /// True once a complete play has been materialized.
    pub fn is_cached(&self) -> bool {
        matches!(*self.state.borrow(), CacheState::Full(_))
    }
}

impl Default for CachingFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFilter for CachingFilter {
    fn apply<'a>(&'a self, records: RecordSeq<'a>) -> RecordSeq<'a> {
        {
            let mut state = self.state.borrow_mut();
            match &*state {
                CacheState::Full(cache) => {
                    let cache = Arc::clone(cache);
                    drop(state);
                    return Box::new(Replay { cache, index: 0 });
                }
                // fall through with the borrow released, so the unwind can
                // run iterator destructors that touch the state
                CacheState::Filling => {}
                CacheState::Empty => {
                    *state = CacheState::Filling;
                    drop(state);
                    return Box::new(Materialize {
                        upstream: records,
                        seen: Vec::new(),
                        filter: self,
                        finished: false,
                    });
                }
            }
        }
        panic!("caching filter re-entered while materializing");
    }
}

struct Replay {
    cache: Arc<Vec<Record>>,
    index: usize,
}

impl Iterator for Replay {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = self.cache.get(self.index)?.clone();
        self.index += 1;
        Some(record)
    }
}

struct Materialize<'a> {
    upstream: RecordSeq<'a>,
    seen: Vec<Record>,
    filter: &'a CachingFilter,
    finished: bool,
}

impl Iterator for Materialize<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        match self.upstream.next() {
            Some(record) => {
                self.seen.push(record.clone());
                Some(record)
            }
            None => {
                if !self.finished {
                    self.finished = true;
                    let cache = Arc::new(std::mem::take(&mut self.seen));
                    *self.filter.state.borrow_mut() = CacheState::Full(cache);
                }
                None
            }
        }
    }
}

impl Drop for Materialize<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.filter.state.borrow_mut() = CacheState::Empty;
        }
    }
}
