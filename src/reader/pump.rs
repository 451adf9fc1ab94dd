//! # Record Pump
//!
//! [`RecordPump`] turns a byte source into a stream of records. It is an
//! infallible iterator: structural problems become marker records inside
//! the stream rather than iterator errors, so even a badly damaged file
//! plays out to a single end-of-stream marker.
//!
//! ```text
//!   ┌───────┐  sniff FAR   ┌──────┐   clean EOF    ┌─────┐
//!   │ Start │─────────────▶│ Read │───────────────▶│ Eof │──▶ Done
//!   └───────┘              └──────┘                └─────┘
//!       │                    │   ▲                    ▲
//!       │ bad FAR            │   │ resync             │ window spent
//!       ▼          lost      ▼   │                    │
//!     Done         framing ┌──────┐───────────────────┘
//!                          │ Seek │
//!                          └──────┘
//! ```
//!
//! The watermark is the end offset of the last record a registered schema
//! vouched for. Unknown-kind records and decode failures never advance it,
//! so a later rewind re-covers every byte no schema has blessed. Rewinding
//! reopens the source and discards up to the watermark, which works on
//! gzip streams that cannot seek.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;

use eyre::{ensure, eyre, Result, WrapErr};
use tracing::{debug, warn};

use crate::codec::Endianness;
use crate::config::{
    EXPECTED_FAR_LENGTH, FAR_RECORD_SIZE, MAX_SEEK_WINDOW, REC_HEADER_SIZE, SEEK_CHUNK_SIZE,
    STDF_VERSION_V4,
};
use crate::convert::ConverterFactory;
use crate::reader::seek::{SeekAlgorithm, SeekScan};
use crate::reader::source::StreamSource;
use crate::records::{
    CorruptData, EndOfStream, FormatError, Record, RecordData, RecordHeader, RecordType,
    StartOfStream, UnknownRecord,
};

enum PumpState {
    /// Nothing consumed yet; the next step establishes the byte order.
    Start,
    /// Framing is established; read records until the stream ends.
    Read,
    /// Framing is lost; scan a growing window for the next boundary.
    Seek { window: Vec<u8>, exhausted: bool },
    /// Emit the end marker.
    Eof,
    /// The end marker is out.
    Done,
}

/// Streaming record reader over a reopenable byte source.
pub struct RecordPump {
    source: Box<dyn StreamSource>,
    factory: Arc<ConverterFactory>,
    seekers: Vec<Box<dyn SeekAlgorithm>>,
    recover: bool,
    forced_endian: Option<Endianness>,
    endian: Option<Endianness>,
    scope: Option<Box<dyn Read + Send>>,
    /// Bytes pulled past a resync point, replayed before the scope.
    pending: Vec<u8>,
    pending_pos: usize,
    /// Absolute offset of the next byte to deliver.
    offset: u64,
    /// End offset of the last record a registered schema vouched for.
    watermark: u64,
    /// Offset of the last automatic seek trigger. A second trigger at the
    /// same offset falls through to passthrough instead of looping.
    last_trigger: Option<u64>,
    state: PumpState,
    queue: VecDeque<Record>,
}

impl RecordPump {
    pub fn new(source: Box<dyn StreamSource>, factory: Arc<ConverterFactory>) -> Self {
        Self {
            source,
            factory,
            seekers: Vec::new(),
            recover: false,
            forced_endian: None,
            endian: None,
            scope: None,
            pending: Vec::new(),
            pending_pos: 0,
            offset: 0,
            watermark: 0,
            last_trigger: None,
            state: PumpState::Start,
            queue: VecDeque::new(),
        }
    }

    /// Registers a resynchronization strategy. Order matters: earlier
    /// algorithms see the window first.
    pub fn add_seeker(&mut self, seeker: Box<dyn SeekAlgorithm>) {
        self.seekers.push(seeker);
    }

    /// When enabled, a header of a kind nobody registered triggers an
    /// automatic [`rewind_and_seek`](Self::rewind_and_seek) instead of an
    /// unknown-record passthrough. Requires at least one seeker.
    pub fn enable_recovery(&mut self, enabled: bool) {
        self.recover = enabled;
    }

    /// Skips FAR sniffing and reads with a fixed byte order, for stream
    /// fragments that lack their leading FAR.
    pub fn force_endianness(&mut self, endian: Endianness) {
        self.forced_endian = Some(endian);
    }

    /// Byte order of the stream, once established.
    pub fn endianness(&self) -> Option<Endianness> {
        self.endian
    }

    /// End offset of the last record a registered schema vouched for.
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Rewinds to the watermark and scans forward for the next record
    /// boundary. The pump calls this itself when recovery is enabled and
    /// it meets an unregistered header; it is public for callers that
    /// learn about corruption through other channels.
    pub fn rewind_and_seek(&mut self) -> Result<()> {
        ensure!(!self.seekers.is_empty(), "no seek algorithms are registered");
        ensure!(
            self.endian.is_some(),
            "byte order is not established before the first record"
        );
        self.reopen_to(self.watermark)?;
        self.state = PumpState::Seek {
            window: Vec::new(),
            exhausted: false,
        };
        Ok(())
    }

    /// Reads until `buf` is full or the stream ends; returns bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        if self.pending_pos < self.pending.len() {
            let replay = (self.pending.len() - self.pending_pos).min(buf.len());
            buf[..replay]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + replay]);
            self.pending_pos += replay;
            filled = replay;
            if self.pending_pos == self.pending.len() {
                self.pending.clear();
                self.pending_pos = 0;
            }
        }
        let scope = self
            .scope
            .as_mut()
            .ok_or_else(|| eyre!("stream '{}' is not open", self.source.name()))?;
        while filled < buf.len() {
            match scope.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(err)
                        .wrap_err_with(|| format!("read failed on '{}'", self.source.name()))
                }
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Reopens the source and discards bytes up to `target`.
    fn reopen_to(&mut self, target: u64) -> Result<()> {
        self.scope = Some(self.source.open()?);
        self.pending.clear();
        self.pending_pos = 0;
        self.offset = 0;
        let mut chunk = [0u8; SEEK_CHUNK_SIZE];
        while self.offset < target {
            let take = (target - self.offset).min(chunk.len() as u64) as usize;
            let got = self.fill(&mut chunk[..take])?;
            ensure!(
                got == take,
                "source '{}' ended at offset {} before reaching offset {target} on reopen",
                self.source.name(),
                self.offset
            );
        }
        Ok(())
    }

    fn push_marker(&mut self, offset: u64, data: RecordData) {
        self.queue.push_back(Record::at_offset(offset, data));
    }

    /// Validates the six leading bytes and picks the stream byte order.
    fn sniff_far(first: &[u8]) -> Result<Endianness> {
        ensure!(
            first.len() == FAR_RECORD_SIZE,
            "stream ends after {} bytes, too short for a FAR",
            first.len()
        );
        let record_type = RecordType::new(first[2], first[3]);
        ensure!(
            record_type == RecordType::FAR,
            "first record is {record_type}, not a FAR"
        );
        let endian = Endianness::from_cpu_type(first[4]);
        let header = RecordHeader::from_bytes([first[0], first[1], first[2], first[3]], endian);
        ensure!(
            header.length == EXPECTED_FAR_LENGTH,
            "FAR header declares a {}-byte body, expected {}",
            header.length,
            EXPECTED_FAR_LENGTH
        );
        Ok(endian)
    }

    fn step_start(&mut self) -> Result<()> {
        self.scope = Some(self.source.open()?);
        if let Some(endian) = self.forced_endian {
            self.endian = Some(endian);
            self.push_marker(0, RecordData::StartOfStream(StartOfStream { endian: Some(endian) }));
            self.state = PumpState::Read;
            return Ok(());
        }
        let mut first = [0u8; FAR_RECORD_SIZE];
        let got = self.fill(&mut first)?;
        match Self::sniff_far(&first[..got]) {
            Ok(endian) => {
                self.endian = Some(endian);
                self.push_marker(
                    0,
                    RecordData::StartOfStream(StartOfStream { endian: Some(endian) }),
                );
                let raw = UnknownRecord::new(
                    RecordType::FAR,
                    0,
                    endian,
                    first[REC_HEADER_SIZE..].to_vec(),
                );
                let far = self.factory.convert(&raw)?;
                if let RecordData::Far(far) = &far.data {
                    if far.stdf_ver != STDF_VERSION_V4 {
                        warn!(
                            version = far.stdf_ver,
                            "unexpected STDF version; records still parse structurally"
                        );
                    }
                }
                self.queue.push_back(far);
                self.watermark = FAR_RECORD_SIZE as u64;
                self.state = PumpState::Read;
            }
            Err(err) => {
                warn!(source = self.source.name(), "not an STDF stream: {err}");
                self.push_marker(0, RecordData::StartOfStream(StartOfStream { endian: None }));
                self.push_marker(
                    0,
                    RecordData::FormatError(FormatError {
                        message: format!("{err:#}"),
                        recoverable: false,
                    }),
                );
                self.push_marker(self.offset, RecordData::EndOfStream(EndOfStream));
                self.state = PumpState::Done;
            }
        }
        Ok(())
    }

    fn step_read(&mut self) -> Result<()> {
        let endian = self
            .endian
            .ok_or_else(|| eyre!("byte order is not established"))?;
        let record_offset = self.offset;
        let mut header = [0u8; REC_HEADER_SIZE];
        let got = self.fill(&mut header)?;
        if got == 0 {
            self.state = PumpState::Eof;
            return Ok(());
        }
        if got < REC_HEADER_SIZE {
            self.push_marker(
                record_offset,
                RecordData::FormatError(FormatError {
                    message: format!("stream ends inside a record header at offset {record_offset}"),
                    recoverable: false,
                }),
            );
            self.push_marker(
                record_offset,
                RecordData::CorruptData(CorruptData {
                    bytes: header[..got].to_vec(),
                    recoverable: false,
                }),
            );
            self.state = PumpState::Eof;
            return Ok(());
        }
        let parsed = RecordHeader::from_bytes(header, endian);
        if !self.factory.is_registered(parsed.record_type)
            && self.recover
            && !self.seekers.is_empty()
            && self.last_trigger != Some(record_offset)
        {
            warn!(
                offset = record_offset,
                kind = %parsed.record_type,
                "unregistered header; resynchronizing from the watermark"
            );
            self.last_trigger = Some(record_offset);
            self.rewind_and_seek()?;
            return Ok(());
        }
        let mut body = vec![0u8; parsed.length as usize];
        let body_got = self.fill(&mut body)?;
        if body_got < body.len() {
            // keep what arrived so copy pipelines lose nothing
            let mut residue = header.to_vec();
            residue.extend_from_slice(&body[..body_got]);
            self.push_marker(
                record_offset,
                RecordData::FormatError(FormatError {
                    message: format!(
                        "stream ends inside a {} body at offset {record_offset}: {body_got} of {} bytes",
                        parsed.record_type, parsed.length
                    ),
                    recoverable: false,
                }),
            );
            self.push_marker(
                record_offset,
                RecordData::CorruptData(CorruptData {
                    bytes: residue,
                    recoverable: false,
                }),
            );
            self.state = PumpState::Eof;
            return Ok(());
        }
        let raw = UnknownRecord::new(parsed.record_type, record_offset, endian, body);
        match self.factory.convert(&raw) {
            Ok(record) => {
                if self.factory.is_registered(parsed.record_type) {
                    self.watermark = self.offset;
                }
                self.queue.push_back(record);
            }
            Err(err) => {
                self.push_marker(
                    record_offset,
                    RecordData::FormatError(FormatError {
                        message: format!(
                            "failed to decode {} at offset {record_offset}: {err:#}",
                            parsed.record_type
                        ),
                        recoverable: true,
                    }),
                );
                self.push_marker(record_offset, RecordData::Unknown(raw));
            }
        }
        self.state = PumpState::Read;
        Ok(())
    }

    fn step_seek(&mut self, mut window: Vec<u8>, mut exhausted: bool) -> Result<()> {
        let endian = self
            .endian
            .ok_or_else(|| eyre!("byte order is not established"))?;
        if !exhausted {
            let prior = window.len();
            window.resize(prior + SEEK_CHUNK_SIZE, 0);
            let got = self.fill(&mut window[prior..])?;
            window.truncate(prior + got);
            exhausted = got < SEEK_CHUNK_SIZE;
        }
        for seeker in &self.seekers {
            let SeekScan::Resync { at } = seeker.scan(&window, endian, exhausted) else {
                continue;
            };
            debug!(algorithm = seeker.name(), skipped = at, "resynchronized");
            if at > 0 {
                self.queue.push_back(Record::at_offset(
                    self.watermark,
                    RecordData::CorruptData(CorruptData {
                        bytes: window[..at].to_vec(),
                        recoverable: true,
                    }),
                ));
            }
            // hand the window tail back through the replay buffer
            self.pending = window.split_off(at);
            self.pending_pos = 0;
            self.offset = self.watermark + at as u64;
            self.watermark = self.offset;
            self.state = PumpState::Read;
            return Ok(());
        }
        if exhausted || window.len() >= MAX_SEEK_WINDOW {
            let reason = if exhausted {
                "the stream ended"
            } else {
                "the scan window limit was reached"
            };
            warn!(window = window.len(), "resynchronization failed: {reason}");
            let scanned = window.len();
            self.push_marker(
                self.watermark,
                RecordData::CorruptData(CorruptData {
                    bytes: window,
                    recoverable: false,
                }),
            );
            self.push_marker(
                self.offset,
                RecordData::FormatError(FormatError {
                    message: format!(
                        "no record boundary within {scanned} bytes after offset {}; {reason}",
                        self.watermark
                    ),
                    recoverable: false,
                }),
            );
            self.state = PumpState::Eof;
            return Ok(());
        }
        self.state = PumpState::Seek { window, exhausted };
        Ok(())
    }
}

impl Iterator for RecordPump {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(record) = self.queue.pop_front() {
                return Some(record);
            }
            let state = std::mem::replace(&mut self.state, PumpState::Done);
            let stepped = match state {
                PumpState::Start => self.step_start(),
                PumpState::Read => self.step_read(),
                PumpState::Seek { window, exhausted } => self.step_seek(window, exhausted),
                PumpState::Eof => {
                    self.push_marker(self.offset, RecordData::EndOfStream(EndOfStream));
                    self.state = PumpState::Done;
                    Ok(())
                }
                PumpState::Done => return None,
            };
            if let Err(err) = stepped {
                self.push_marker(
                    self.offset,
                    RecordData::FormatError(FormatError {
                        message: format!("{err:#}"),
                        recoverable: false,
                    }),
                );
                self.state = PumpState::Eof;
            }
        }
    }
}
