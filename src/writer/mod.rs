//! # Stream Writer
//!
//! Serializes [`Record`]s back into STDF bytes. The conversion layer
//! produces each body with trailing absent optionals omitted; this module
//! adds the 4-byte frame and enforces the file-level rules:
//!
//! - the first record on the wire is always a FAR; one is injected when
//!   the caller's first record is something else
//! - a FAR whose `cpu_type` disagrees with the writer's byte order is
//!   refused — the file would lie about its own encoding
//! - markers are dropped, except corrupt-data runs whose captured bytes
//!   are copied through verbatim so a read-repair-write pipeline keeps
//!   its input intact
//!
//! [`StdfDirectoryWriter`] splits a marker-delimited record sequence into
//! one file per start/end-of-stream pair, the shape the reader produces
//! when several streams are concatenated or re-cut.

use std::borrow::Borrow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{bail, ensure, Result, WrapErr};
use tracing::{debug, warn};

use crate::codec::Endianness;
use crate::config::{MAX_RECORD_BODY, READ_BUFFER_SIZE, REC_HEADER_SIZE, STDF_VERSION_V4};
use crate::convert::ConverterFactory;
use crate::records::{Far, Record, RecordData, RecordHeader};

/// Frames records into an STDF byte stream.
pub struct StdfWriter<W: Write> {
    sink: W,
    endian: Endianness,
    factory: Arc<ConverterFactory>,
    started: bool,
    records: u64,
    bytes: u64,
}

impl StdfWriter<BufWriter<File>> {
    /// Creates `path` and writes a buffered STDF stream into it.
    pub fn create<P: AsRef<Path>>(path: P, endian: Endianness) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .wrap_err_with(|| format!("failed to create '{}'", path.display()))?;
        Self::from_writer(BufWriter::with_capacity(READ_BUFFER_SIZE, file), endian)
    }
}

impl<W: Write> StdfWriter<W> {
    /// Wraps any byte sink. Bodies are produced by the stock V4 registry;
    /// use [`StdfWriter::factory`] to emit custom kinds.
    pub fn from_writer(sink: W, endian: Endianness) -> Result<Self> {
        Ok(Self {
            sink,
            endian,
            factory: Arc::new(ConverterFactory::v4()?),
            started: false,
            records: 0,
            bytes: 0,
        })
    }

    /// Replaces the conversion registry. Must happen before the first
    /// write.
    pub fn factory(mut self, factory: Arc<ConverterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Byte order this writer emits.
    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    /// Frames one record. Markers carry no wire form and are dropped,
    /// except corrupt-data runs, whose bytes pass through verbatim.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match &record.data {
            RecordData::CorruptData(run) => {
                self.sink
                    .write_all(&run.bytes)
                    .wrap_err("failed to write corrupt run")?;
                self.bytes += run.bytes.len() as u64;
                return Ok(());
            }
            data if data.is_marker() => return Ok(()),
            _ => {}
        }
        if let RecordData::Far(far) = &record.data {
            self.check_far(far)?;
        } else if !self.started {
            debug!(kind = record.data.kind_name(), "injecting a FAR ahead of the first record");
            let far = Far {
                cpu_type: self.endian.cpu_type(),
                stdf_ver: STDF_VERSION_V4,
            };
            self.emit(&RecordData::Far(far))?;
        }
        self.started = true;
        self.emit(&record.data)
    }

    /// Frames every record of `records`, in order.
    pub fn write_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        for record in records {
            self.write_record(record.borrow())?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush().wrap_err("failed to flush stream")?;
        debug!(
            records = self.records,
            bytes = self.bytes,
            "stdf stream flushed"
        );
        Ok(self.sink)
    }

    fn check_far(&self, far: &Far) -> Result<()> {
        ensure!(
            Endianness::from_cpu_type(far.cpu_type) == self.endian,
            "FAR cpu_type {} implies {} but this writer emits {}",
            far.cpu_type,
            Endianness::from_cpu_type(far.cpu_type),
            self.endian
        );
        Ok(())
    }

    fn emit(&mut self, data: &RecordData) -> Result<()> {
        let Some(record_type) = data.record_type() else {
            bail!("{} records have no wire form", data.kind_name());
        };
        let body = self.factory.unconvert(data, self.endian)?;
        ensure!(
            body.len() <= MAX_RECORD_BODY,
            "{} body is {} bytes but REC_LEN is a u16",
            data.kind_name(),
            body.len()
        );
        let header = RecordHeader::new(body.len() as u16, record_type);
        self.sink
            .write_all(&header.to_bytes(self.endian))
            .wrap_err("failed to write record header")?;
        self.sink
            .write_all(&body)
            .wrap_err("failed to write record body")?;
        self.records += 1;
        self.bytes += (REC_HEADER_SIZE + body.len()) as u64;
        Ok(())
    }
}

/// Splits a marker-delimited record sequence into one STDF file per
/// start/end-of-stream pair.
///
/// Files are numbered `lot-0001.stdf`, `lot-0002.stdf`, ... in arrival
/// order. Records arriving outside a pair are an error rather than being
/// dropped silently.
pub struct StdfDirectoryWriter {
    dir: PathBuf,
    endian: Endianness,
    factory: Arc<ConverterFactory>,
    current: Option<StdfWriter<BufWriter<File>>>,
    index: usize,
    written: Vec<PathBuf>,
}

impl StdfDirectoryWriter {
    /// Creates `dir` (and parents) and prepares to write numbered files
    /// into it.
    pub fn create<P: AsRef<Path>>(dir: P, endian: Endianness) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("failed to create '{}'", dir.display()))?;
        Ok(Self {
            dir,
            endian,
            factory: Arc::new(ConverterFactory::v4()?),
            current: None,
            index: 0,
            written: Vec::new(),
        })
    }

    /// Replaces the conversion registry used for every output file.
    pub fn factory(mut self, factory: Arc<ConverterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Routes one record: start markers rotate to a new file, end markers
    /// close the current one, everything else is framed into it.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        match &record.data {
            RecordData::StartOfStream(_) => self.rotate(),
            RecordData::EndOfStream(_) => self.close(),
            RecordData::FormatError(_) | RecordData::OrderError(_) => Ok(()),
            _ => match self.current.as_mut() {
                Some(writer) => writer.write_record(record),
                None => bail!(
                    "record at offset {} arrived before any start-of-stream marker",
                    record.offset
                ),
            },
        }
    }

    /// Routes every record of `records`, in order.
    pub fn write_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        for record in records {
            self.write_record(record.borrow())?;
        }
        Ok(())
    }

    /// Closes any open file and returns the paths written, in order.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        if self.current.is_some() {
            warn!("input ended without an end-of-stream marker; flushing the open file");
            self.close()?;
        }
        Ok(self.written)
    }

    fn rotate(&mut self) -> Result<()> {
        if self.current.is_some() {
            warn!("start-of-stream marker while a file is open; closing the previous one");
            self.close()?;
        }
        self.index += 1;
        let path = self.dir.join(format!("lot-{:04}.stdf", self.index));
        debug!(path = %path.display(), "opening output file");
        let writer =
            StdfWriter::create(&path, self.endian)?.factory(Arc::clone(&self.factory));
        self.current = Some(writer);
        self.written.push(path);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.current.take() {
            writer.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CorruptData, EndOfStream, Pir, StartOfStream, UnknownRecord};
    use crate::records::RecordType;

    fn pir() -> Record {
        Record::new(RecordData::Pir(Pir {
            head_num: Some(1),
            site_num: Some(1),
        }))
    }

    fn little_far_frame() -> Vec<u8> {
        vec![2, 0, 0, 10, 2, 4]
    }

    fn pir_frame() -> Vec<u8> {
        vec![2, 0, 5, 10, 1, 1]
    }

    fn writer() -> StdfWriter<Vec<u8>> {
        StdfWriter::from_writer(Vec::new(), Endianness::Little).unwrap()
    }

    #[test]
    fn a_far_is_injected_ahead_of_the_first_record() {
        let mut w = writer();
        w.write_record(&pir()).unwrap();
        let bytes = w.finish().unwrap();
        let mut expected = little_far_frame();
        expected.extend(pir_frame());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn an_explicit_far_is_not_duplicated() {
        let mut w = writer();
        w.write_record(&Record::new(RecordData::Far(Far {
            cpu_type: 2,
            stdf_ver: 4,
        })))
        .unwrap();
        w.write_record(&pir()).unwrap();
        let bytes = w.finish().unwrap();
        let mut expected = little_far_frame();
        expected.extend(pir_frame());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn a_far_with_a_foreign_byte_order_is_refused() {
        let mut w = writer();
        let err = w
            .write_record(&Record::new(RecordData::Far(Far {
                cpu_type: 0,
                stdf_ver: 4,
            })))
            .unwrap_err();
        assert!(
            err.to_string().contains("cpu_type 0 implies big-endian"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn markers_never_reach_the_wire() {
        let mut w = writer();
        w.write_record(&Record::new(RecordData::StartOfStream(StartOfStream {
            endian: Some(Endianness::Little),
        })))
        .unwrap();
        w.write_record(&pir()).unwrap();
        w.write_record(&Record::new(RecordData::EndOfStream(EndOfStream)))
            .unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn corrupt_runs_are_copied_through_verbatim() {
        let mut w = writer();
        w.write_record(&pir()).unwrap();
        w.write_record(&Record::new(RecordData::CorruptData(CorruptData {
            bytes: vec![0xBA, 0xBA, 0xBA],
            recoverable: true,
        })))
        .unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(&bytes[bytes.len() - 3..], &[0xBA, 0xBA, 0xBA]);
    }

    #[test]
    fn oversized_bodies_are_refused() {
        let raw = UnknownRecord::new(
            RecordType::new(200, 1),
            0,
            Endianness::Little,
            vec![0u8; MAX_RECORD_BODY + 1],
        );
        let mut w = writer();
        let err = w
            .write_record(&Record::new(RecordData::Unknown(raw)))
            .unwrap_err();
        assert!(
            err.to_string().contains("REC_LEN is a u16"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn write_all_frames_every_record() {
        let mut w = writer();
        w.write_all(vec![pir(), pir(), pir()]).unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(bytes.len(), 6 + 3 * 6);
    }

    #[test]
    fn each_marker_pair_becomes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = StdfDirectoryWriter::create(dir.path(), Endianness::Little).unwrap();
        for _ in 0..2 {
            w.write_record(&Record::new(RecordData::StartOfStream(StartOfStream {
                endian: Some(Endianness::Little),
            })))
            .unwrap();
            w.write_record(&pir()).unwrap();
            w.write_record(&Record::new(RecordData::EndOfStream(EndOfStream)))
                .unwrap();
        }
        let written = w.finish().unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("lot-0001.stdf"));
        for path in &written {
            assert_eq!(fs::read(path).unwrap().len(), 12);
        }
    }

    #[test]
    fn records_outside_a_pair_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = StdfDirectoryWriter::create(dir.path(), Endianness::Little).unwrap();
        let err = w.write_record(&pir()).unwrap_err();
        assert!(
            err.to_string()
                .contains("before any start-of-stream marker"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn a_missing_end_marker_still_flushes_the_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = StdfDirectoryWriter::create(dir.path(), Endianness::Little).unwrap();
        w.write_record(&Record::new(RecordData::StartOfStream(StartOfStream {
            endian: Some(Endianness::Little),
        })))
        .unwrap();
        w.write_record(&pir()).unwrap();
        let written = w.finish().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(fs::read(&written[0]).unwrap().len(), 12);
    }
}
