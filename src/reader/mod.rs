//! # Streaming Reader
//!
//! The reader stacks three layers behind one iterator:
//!
//! ```text
//! StdfFile::records()
//!   └─ filter pipeline (order ▸ defaults ▸ summaries ▸ caller ▸ cache)
//!        └─ RecordPump        framing, conversion, seek-based recovery
//!             └─ StreamSource file, gzip, memory, memory map
//! ```
//!
//! The pump is deliberately infallible: stream problems travel in-band as
//! marker records so every filter sees them. Strictness is decided at the
//! boundary instead — [`Records`] turns format-error markers into `Err`
//! items unless the reader was built tolerant.
//!
//! ## Choosing a Configuration
//!
//! | Need | Toggle |
//! |------|--------|
//! | Skip corrupt runs instead of stopping | [`StdfFileBuilder::recovery`] |
//! | Keep iterating past structural errors | [`StdfFileBuilder::tolerant`] |
//! | Iterate the same stream twice | [`StdfFileBuilder::caching`] |
//! | Flag records that break the V4 grammar | [`StdfFileBuilder::validate_order`] |
//! | Fill omitted PTR limits from first execution | [`StdfFileBuilder::propagate_defaults`] |
//! | Reconstruct missing summary records | [`StdfFileBuilder::synthesize_summaries`] |

mod pump;
mod seek;
mod source;

pub use pump::RecordPump;
pub use seek::{HeaderSeeker, SeekAlgorithm, SeekScan};
pub use source::{
    source_for_path, FileSource, GzipFileSource, MappedFileSource, MemorySource, StreamSource,
};

use std::path::Path;
use std::sync::Arc;

use eyre::{eyre, Result};

use crate::codec::Endianness;
use crate::convert::ConverterFactory;
use crate::filters::{
    CachingFilter, DefaultPropagator, OrderValidator, RecordFilter, RecordSeq, SummarySynthesizer,
};
use crate::records::{Record, RecordData};

/// A parsed STDF stream: the record pump plus its filter pipeline.
pub struct StdfFile {
    pump: RecordPump,
    filters: Vec<Box<dyn RecordFilter + Send>>,
    tolerant: bool,
}

impl StdfFile {
    /// Opens `path` with default settings. Gzip inputs are detected by
    /// content, not extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<StdfFile> {
        StdfFileBuilder::new().open(path)
    }

    /// Starts configuring a reader.
    pub fn builder() -> StdfFileBuilder {
        StdfFileBuilder::new()
    }

    /// The records of the stream, run through the configured filters.
    ///
    /// The pump consumes its source, so without caching a second call
    /// resumes where the first stopped and yields nothing once the stream
    /// has ended. With [`StdfFileBuilder::caching`] enabled, later calls
    /// replay the first pass.
    pub fn records(&mut self) -> Records<'_> {
        let base: RecordSeq<'_> = Box::new(&mut self.pump);
        let inner = self
            .filters
            .iter()
            .fold(base, |records, filter| filter.apply(records));
        Records {
            inner,
            tolerant: self.tolerant,
            failed: false,
        }
    }

    /// Byte order of the stream, known once the FAR has been read or an
    /// override was configured.
    pub fn endianness(&self) -> Option<Endianness> {
        self.pump.endianness()
    }

    /// Name of the underlying source, for diagnostics.
    pub fn source_name(&self) -> &str {
        self.pump.source_name()
    }
}

/// Iterator over parsed records.
///
/// In the default strict mode, the first in-band format-error marker
/// becomes an `Err` item and iteration stops. In tolerant mode every
/// marker flows through as `Ok` and the consumer decides what is fatal.
/// Order errors and corrupt-data markers are reports, not failures; they
/// flow through in both modes.
pub struct Records<'a> {
    inner: RecordSeq<'a>,
    tolerant: bool,
    failed: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        if self.failed {
            return None;
        }
        let record = self.inner.next()?;
        if !self.tolerant {
            if let RecordData::FormatError(report) = &record.data {
                self.failed = true;
                return Some(Err(eyre!(
                    "format error at offset {}: {}",
                    record.offset,
                    report.message
                )));
            }
        }
        Some(Ok(record))
    }
}

/// Configures and opens [`StdfFile`] instances.
///
/// ```ignore
/// let mut file = StdfFile::builder()
///     .recovery(true)
///     .validate_order(true)
///     .open("lot.stdf")?;
/// ```
pub struct StdfFileBuilder {
    factory: Option<Arc<ConverterFactory>>,
    endian: Option<Endianness>,
    recover: bool,
    tolerant: bool,
    cache: bool,
    validate_order: bool,
    propagate_defaults: bool,
    synthesize_summaries: bool,
    filters: Vec<Box<dyn RecordFilter + Send>>,
}

impl StdfFileBuilder {
    pub fn new() -> Self {
        Self {
            factory: None,
            endian: None,
            recover: false,
            tolerant: false,
            cache: false,
            validate_order: false,
            propagate_defaults: false,
            synthesize_summaries: false,
            filters: Vec::new(),
        }
    }

    /// Uses `factory` instead of the stock V4 registry. Custom converters
    /// registered here extend both decoding and seek recovery.
    pub fn factory(mut self, factory: Arc<ConverterFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Skips FAR sniffing and reads the stream with a fixed byte order.
    /// For headerless fragments cut out of a larger file.
    pub fn endianness(mut self, endian: Endianness) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Scans forward for the next plausible record after a corrupt run
    /// instead of stopping at it.
    pub fn recovery(mut self, enabled: bool) -> Self {
        self.recover = enabled;
        self
    }

    /// Delivers format-error markers as ordinary records instead of
    /// failing the iterator.
    pub fn tolerant(mut self, enabled: bool) -> Self {
        self.tolerant = enabled;
        self
    }

    /// Materializes the record stream on first play so [`StdfFile::records`]
    /// can be called repeatedly.
    pub fn caching(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Checks records against the V4 file-structure grammar and inserts
    /// order-error markers ahead of offenders.
    pub fn validate_order(mut self, enabled: bool) -> Self {
        self.validate_order = enabled;
        self
    }

    /// Fills omitted PTR limit and format fields from each test's first
    /// execution.
    pub fn propagate_defaults(mut self, enabled: bool) -> Self {
        self.propagate_defaults = enabled;
        self
    }

    /// Reconstructs missing head-255 summary records from per-site ones.
    pub fn synthesize_summaries(mut self, enabled: bool) -> Self {
        self.synthesize_summaries = enabled;
        self
    }

    /// Appends a caller-supplied filter. Caller filters run after the
    /// built-in stages, in the order they were added.
    pub fn filter(mut self, filter: impl RecordFilter + Send + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Opens `path`, sniffing gzip compression by content.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<StdfFile> {
        let source = source_for_path(path)?;
        self.from_source(source)
    }

    /// Builds a reader over any stream source.
    pub fn from_source(self, source: Box<dyn StreamSource>) -> Result<StdfFile> {
        let factory = match self.factory {
            Some(factory) => factory,
            None => Arc::new(ConverterFactory::v4()?),
        };
        let mut pump = RecordPump::new(source, Arc::clone(&factory));
        if let Some(endian) = self.endian {
            pump.force_endianness(endian);
        }
        if self.recover {
            pump.enable_recovery(true);
            pump.add_seeker(Box::new(HeaderSeeker::new(Arc::clone(&factory))));
        }
        // grammar checks must run before summary synthesis so synthesized
        // records are never judged against the file grammar
        let mut filters: Vec<Box<dyn RecordFilter + Send>> = Vec::new();
        if self.validate_order {
            filters.push(Box::new(OrderValidator));
        }
        if self.propagate_defaults {
            filters.push(Box::new(DefaultPropagator));
        }
        if self.synthesize_summaries {
            filters.push(Box::new(SummarySynthesizer));
        }
        filters.extend(self.filters);
        if self.cache {
            filters.push(Box::new(CachingFilter::new()));
        }
        Ok(StdfFile {
            pump,
            filters,
            tolerant: self.tolerant,
        })
    }
}

impl Default for StdfFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
