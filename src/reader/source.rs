//! # Stream Sourcing
//!
//! A [`StreamSource`] is a reopenable origin of bytes. The pump never
//! seeks: when it has to rewind for resynchronization it opens a fresh
//! read scope and discards bytes up to its watermark. That one contract
//! covers plain files, gzip streams that cannot seek at all, in-memory
//! buffers, and memory maps.
//!
//! | Source               | Backing                       | Reopen cost          |
//! |----------------------|-------------------------------|----------------------|
//! | [`FileSource`]       | buffered `File`               | one open(2)          |
//! | [`GzipFileSource`]   | `flate2` multi-member decoder | re-inflate from zero |
//! | [`MemorySource`]     | shared byte buffer            | pointer copy         |
//! | [`MappedFileSource`] | shared read-only map          | pointer copy         |
//!
//! [`source_for_path`] chooses between plain and gzip by sniffing the two
//! gzip magic bytes. The extension never decides; mislabeled files are
//! common on test floors and the content has the final word.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Result, WrapErr};
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;

use crate::config::{GZIP_MAGIC, READ_BUFFER_SIZE};

/// A reopenable origin of stream bytes.
///
/// `open` starts a fresh scope at byte zero every time it is called, so
/// implementations never need to support seeking.
pub trait StreamSource: Send {
    /// Human-readable origin, used in error messages and logs.
    fn name(&self) -> &str;

    /// Opens a fresh read scope positioned at the first byte.
    fn open(&self) -> Result<Box<dyn Read + Send>>;
}

/// Plain file source with buffered reads.
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl StreamSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let file =
            File::open(&self.path).wrap_err_with(|| format!("failed to open '{}'", self.name))?;
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

/// Gzip-compressed file source. Multi-member archives read as one
/// continuous stream. Reopening restarts inflation from the first byte,
/// which is what lets the pump rewind a format with no seek support.
pub struct GzipFileSource {
    path: PathBuf,
    name: String,
}

impl GzipFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl StreamSource for GzipFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let file =
            File::open(&self.path).wrap_err_with(|| format!("failed to open '{}'", self.name))?;
        let buffered = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        Ok(Box::new(MultiGzDecoder::new(buffered)))
    }
}

/// In-memory source. The buffer is shared between scopes, so reopening
/// costs one reference-count bump.
pub struct MemorySource {
    name: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
        }
    }
}

impl StreamSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }
}

/// Memory-mapped file source. The map is created once and shared across
/// scopes, so reopening never touches the filesystem again.
pub struct MappedFileSource {
    name: String,
    map: Arc<Mmap>,
}

impl MappedFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let file = File::open(path).wrap_err_with(|| format!("failed to open '{name}'"))?;
        // SAFETY: Mmap::map is unsafe because the mapping goes stale if the
        // file is truncated or rewritten underneath it. This is safe because:
        // 1. The map is read-only over an input file the crate never writes
        // 2. The Arc ties every read scope to the map's lifetime
        // 3. Record decoding treats the bytes as untrusted and bounds-checks
        let map =
            unsafe { Mmap::map(&file).wrap_err_with(|| format!("failed to memory-map '{name}'"))? };
        Ok(Self {
            name,
            map: Arc::new(map),
        })
    }
}

impl StreamSource for MappedFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(SharedMap(Arc::clone(&self.map)))))
    }
}

/// Byte view of a shared map, so `Cursor` can read it.
struct SharedMap(Arc<Mmap>);

impl AsRef<[u8]> for SharedMap {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Opens the right source for a path by sniffing the gzip magic bytes.
/// Files shorter than the magic are treated as plain.
pub fn source_for_path<P: AsRef<Path>>(path: P) -> Result<Box<dyn StreamSource>> {
    let path = path.as_ref();
    let mut file =
        File::open(path).wrap_err_with(|| format!("failed to open '{}'", path.display()))?;
    let mut probe = [0u8; 2];
    let compressed = match file.read_exact(&mut probe) {
        Ok(()) => probe == GZIP_MAGIC,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(err) => {
            return Err(err).wrap_err_with(|| format!("failed to sniff '{}'", path.display()))
        }
    };
    if compressed {
        Ok(Box::new(GzipFileSource::new(path)))
    } else {
        Ok(Box::new(FileSource::new(path)))
    }
}
