/// Memory-backed streams behind the standard read/write/seek interface.
///
/// This module presents one behavioral contract over several strategies
/// for "a file-like object backed by memory": the canonical hand-rolled
/// growable region ([`MemStream`]), a pass-through over the platform's own
/// growable memory stream ([`NativeStream`]), and a temp-file fallback for
/// hosts with no memory-stream primitive at all ([`TempStream`]). The
/// [`MemFile`] handle wraps any of the three behind an explicit
/// open/materialize/close lifecycle.
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::str::FromStr;

use log::debug;
use thiserror::Error;

use crate::buffer::{StreamState, INITIAL_REGION};

/*---- Errors ----*/

/// Errors surfaced by the memory stream core.
#[derive(Debug, Error)]
pub enum Error {
    /// Arithmetic exceeded the representable range for an offset or a
    /// count, or a seek resolved past the logical end of data.
    #[error("offset or count out of range")]
    Overflow,
    /// Growing the stream region failed to allocate.
    #[error("out of memory while growing the stream region")]
    OutOfMemory,
    /// Unrecognized mode, a direction the mode forbids, or a seek
    /// resolving to a negative offset.
    #[error("invalid argument")]
    InvalidArgument,
    /// Internal consistency fault: the cursor desynchronized from the
    /// logical size. Reads and writes degrade to zero-byte transfers
    /// instead of propagating this.
    #[error("cursor advanced past the logical size")]
    CursorBeyondSize,
    /// The handle has no open stream.
    #[error("stream is not open")]
    Closed,
    /// Temp-file plumbing failure. A concurrent shrink of the backing
    /// file surfaces here as an unexpected-EOF read.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            other => {
                let kind = match other {
                    Error::Overflow | Error::InvalidArgument => io::ErrorKind::InvalidInput,
                    Error::OutOfMemory => io::ErrorKind::OutOfMemory,
                    Error::CursorBeyondSize => io::ErrorKind::InvalidData,
                    Error::Closed => io::ErrorKind::NotConnected,
                    Error::Io(_) => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}

/*---- Open modes ----*/

/// Stream disposition requested at open time.
///
/// Opening always starts from a fresh, empty region regardless of mode;
/// the mode gates which directions the handle accepts afterwards. The
/// cursor logic underneath is mode-blind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
    ReadWrite,
}

impl Mode {
    fn allows_read(self) -> bool {
        matches!(self, Mode::Read | Mode::ReadWrite)
    }

    fn allows_write(self) -> bool {
        matches!(self, Mode::Write | Mode::ReadWrite)
    }
}

impl FromStr for Mode {
    type Err = Error;

    /// Accepts the classic stdio spellings; anything else is an
    /// [`Error::InvalidArgument`].
    fn from_str(mode: &str) -> Result<Self, Error> {
        match mode {
            "r" | "rb" => Ok(Mode::Read),
            "w" | "wb" => Ok(Mode::Write),
            "r+" | "rb+" | "r+b" | "w+" | "wb+" | "w+b" => Ok(Mode::ReadWrite),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/*---- The backend contract ----*/

/// The contract every stream strategy satisfies on top of the standard
/// read/write/seek interface: hand back the current logical content
/// without disturbing the stream.
pub trait Backend: Read + Write + Seek {
    /// Current logical content snapshot. The borrow is valid until the
    /// next write-triggered growth or teardown.
    fn materialize(&mut self) -> Result<&[u8], Error>;
}

/*---- Canonical growable backend ----*/

/// Growable in-memory stream, the canonical strategy.
///
/// A fresh stream owns a 128-byte region and grows it through
/// golden-ratio capacity steps as writes land, keeping amortized append
/// cost constant per byte. Reads stop at the logical size; seeks resolve
/// against it and reject targets beyond it.
///
/// # Example
///
/// ```rust
/// use std::io::{Read, Seek, SeekFrom, Write};
/// use qrdec::memstream::MemStream;
///
/// let mut stream = MemStream::new().unwrap();
/// stream.write_all(b"hello world").unwrap();
/// stream.seek(SeekFrom::Start(6)).unwrap();
///
/// let mut tail = String::new();
/// stream.read_to_string(&mut tail).unwrap();
/// assert_eq!(tail, "world");
/// assert_eq!(stream.contents(), b"hello world");
/// ```
#[derive(Debug)]
pub struct MemStream {
    state: StreamState,
}

impl MemStream {
    /// Opens a fresh stream over an initial 128-byte region.
    pub fn new() -> Result<Self, Error> {
        Ok(MemStream {
            state: StreamState::with_capacity(INITIAL_REGION)?,
        })
    }

    /// The materialized logical content.
    pub fn contents(&self) -> &[u8] {
        self.state.contents()
    }

    /// Logical length in bytes actually written.
    pub fn len(&self) -> usize {
        self.state.size()
    }

    pub fn is_empty(&self) -> bool {
        self.state.size() == 0
    }

    /// Physical allocated capacity of the region.
    pub fn capacity(&self) -> usize {
        self.state.capacity()
    }
}

impl Read for MemStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.state.read(buf))
    }
}

impl Write for MemStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.write(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.state.seek(pos).map_err(io::Error::from)
    }
}

impl Backend for MemStream {
    fn materialize(&mut self) -> Result<&[u8], Error> {
        Ok(self.state.contents())
    }
}

/*---- Native pass-through backend ----*/

/// Strategy delegating to the platform's own growable memory stream,
/// `std::io::Cursor<Vec<u8>>`.
///
/// The golden-ratio growth engine is bypassed entirely; growth and seek
/// semantics are the primitive's own (notably, seeking past the end is
/// permitted and a later write zero-fills the gap).
#[derive(Debug, Default)]
pub struct NativeStream {
    inner: io::Cursor<Vec<u8>>,
}

impl NativeStream {
    pub fn new() -> Self {
        NativeStream {
            inner: io::Cursor::new(Vec::new()),
        }
    }
}

impl Read for NativeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for NativeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for NativeStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Backend for NativeStream {
    fn materialize(&mut self) -> Result<&[u8], Error> {
        Ok(self.inner.get_ref())
    }
}

/*---- Temp-file fallback backend ----*/

/// Temp-file fallback strategy for hosts without a usable memory-stream
/// primitive.
///
/// Writes land in an unlinked on-disk file; [`Backend::materialize`]
/// reads the whole file back into a fresh owned buffer on demand, which
/// is costly and intended only as a fallback. The stream position is
/// saved and restored around the snapshot.
#[derive(Debug)]
pub struct TempStream {
    file: File,
    snapshot: Vec<u8>,
}

impl TempStream {
    pub fn new() -> Result<Self, Error> {
        Ok(TempStream {
            file: tempfile::tempfile()?,
            snapshot: Vec::new(),
        })
    }
}

impl Read for TempStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for TempStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for TempStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Backend for TempStream {
    fn materialize(&mut self) -> Result<&[u8], Error> {
        let pos = self.file.stream_position()?;
        let end = self.file.seek(SeekFrom::End(0))?;
        let len = usize::try_from(end).map_err(|_| Error::Overflow)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
        buf.resize(len, 0);

        self.file.seek(SeekFrom::Start(0))?;
        // read_exact reports a concurrent shrink as UnexpectedEof
        self.file.read_exact(&mut buf)?;
        self.file.seek(SeekFrom::Start(pos))?;

        self.snapshot = buf;
        Ok(&self.snapshot)
    }
}

/*---- The opaque handle ----*/

/// Strategy selector for a [`MemFile`] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Hand-rolled growable region, [`MemStream`].
    #[default]
    Buffered,
    /// Platform growable memory stream, [`NativeStream`].
    Native,
    /// Unlinked temporary file, [`TempStream`].
    TempFile,
}

#[derive(Debug)]
enum Inner {
    Closed,
    Buffered(MemStream),
    Native(NativeStream),
    TempFile(TempStream),
}

/// Opaque stream handle with an explicit open/materialize/close lifecycle.
///
/// A fresh handle allocates nothing. [`MemFile::open`] tears down any
/// previous stream, then builds a new one for the handle's configured
/// strategy; re-opening is therefore idempotent with respect to the owned
/// region. [`MemFile::materialize`] snapshots the logical content without
/// disturbing the stream, and [`MemFile::close`] releases everything; a
/// closed handle is reusable only through another open.
///
/// # Example
///
/// ```rust
/// use std::io::Write;
/// use qrdec::memstream::{MemFile, Mode};
///
/// let mut file = MemFile::new();
/// file.open(Mode::Write).unwrap();
/// file.write_all(b"hello").unwrap();
/// file.write_all(b" world").unwrap();
/// assert_eq!(file.materialize().unwrap(), b"hello world");
/// file.close();
/// ```
#[derive(Debug)]
pub struct MemFile {
    kind: BackendKind,
    mode: Mode,
    inner: Inner,
}

impl MemFile {
    /// Handle over the canonical buffered strategy. Allocates nothing
    /// until opened.
    pub fn new() -> Self {
        Self::with_backend(BackendKind::default())
    }

    /// Handle over an explicitly chosen strategy.
    pub fn with_backend(kind: BackendKind) -> Self {
        MemFile {
            kind,
            mode: Mode::ReadWrite,
            inner: Inner::Closed,
        }
    }

    /// Opens a fresh stream, releasing any prior region first.
    pub fn open(&mut self, mode: Mode) -> Result<(), Error> {
        self.inner = Inner::Closed;
        self.inner = match self.kind {
            BackendKind::Buffered => Inner::Buffered(MemStream::new()?),
            BackendKind::Native => Inner::Native(NativeStream::new()),
            BackendKind::TempFile => Inner::TempFile(TempStream::new()?),
        };
        self.mode = mode;
        debug!("opened {:?} stream in {:?} mode", self.kind, mode);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.inner, Inner::Closed)
    }

    /// Current logical content; empty for a handle that is not open.
    pub fn materialize(&mut self) -> Result<&[u8], Error> {
        match &mut self.inner {
            Inner::Closed => Ok(&[]),
            Inner::Buffered(stream) => stream.materialize(),
            Inner::Native(stream) => stream.materialize(),
            Inner::TempFile(stream) => stream.materialize(),
        }
    }

    /// Releases the stream and its region.
    pub fn close(&mut self) {
        self.inner = Inner::Closed;
    }

    fn backend(&mut self) -> Result<&mut dyn Backend, Error> {
        match &mut self.inner {
            Inner::Closed => Err(Error::Closed),
            Inner::Buffered(stream) => Ok(stream),
            Inner::Native(stream) => Ok(stream),
            Inner::TempFile(stream) => Ok(stream),
        }
    }
}

impl Default for MemFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.allows_read() {
            return Err(Error::InvalidArgument.into());
        }
        self.backend()?.read(buf)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.mode.allows_write() {
            return Err(Error::InvalidArgument.into());
        }
        self.backend()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.backend()?.flush()
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.backend()?.seek(pos)
    }
}

impl Backend for MemFile {
    fn materialize(&mut self) -> Result<&[u8], Error> {
        MemFile::materialize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from_str("r").unwrap(), Mode::Read);
        assert_eq!(Mode::from_str("w").unwrap(), Mode::Write);
        assert_eq!(Mode::from_str("r+").unwrap(), Mode::ReadWrite);
        assert!(matches!(
            Mode::from_str("a"),
            Err(Error::InvalidArgument)
        ));
    }

    #[test]
    fn test_write_then_append_then_materialize() {
        let mut file = MemFile::new();
        file.open(Mode::Write).unwrap();

        file.write_all(b"hello").unwrap();
        assert_eq!(file.materialize().unwrap(), b"hello");

        file.write_all(b" world").unwrap();
        assert_eq!(file.materialize().unwrap(), b"hello world");
    }

    #[test]
    fn test_materialize_leaves_cursor_in_place() {
        let mut file = MemFile::new();
        file.open(Mode::ReadWrite).unwrap();
        file.write_all(b"abcdef").unwrap();
        file.seek(SeekFrom::Start(2)).unwrap();

        assert_eq!(file.materialize().unwrap(), b"abcdef");

        let mut rest = Vec::new();
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"cdef");
    }

    #[test]
    fn test_reopen_discards_previous_region() {
        let mut file = MemFile::new();
        file.open(Mode::Write).unwrap();
        file.write_all(b"first").unwrap();

        file.open(Mode::Write).unwrap();
        assert_eq!(file.materialize().unwrap(), b"");
        file.write_all(b"second").unwrap();
        assert_eq!(file.materialize().unwrap(), b"second");
    }

    #[test]
    fn test_mode_gates_directions() {
        let mut file = MemFile::new();
        file.open(Mode::Read).unwrap();
        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        file.open(Mode::Write).unwrap();
        let mut buf = [0u8; 1];
        let err = file.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_closed_handle_fails_io_but_materializes_empty() {
        let mut file = MemFile::new();
        assert!(!file.is_open());
        assert_eq!(file.materialize().unwrap(), b"");

        let err = file.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        file.open(Mode::Write).unwrap();
        file.write_all(b"data").unwrap();
        file.close();
        assert!(!file.is_open());
        assert_eq!(file.materialize().unwrap(), b"");
    }

    #[test]
    fn test_native_backend_round_trip() {
        let mut file = MemFile::with_backend(BackendKind::Native);
        file.open(Mode::ReadWrite).unwrap();
        file.write_all(b"native bytes").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut back = Vec::new();
        file.read_to_end(&mut back).unwrap();
        assert_eq!(back, b"native bytes");
        assert_eq!(file.materialize().unwrap(), b"native bytes");
    }

    #[test]
    fn test_temp_file_backend_round_trip() {
        let mut file = MemFile::with_backend(BackendKind::TempFile);
        file.open(Mode::ReadWrite).unwrap();
        file.write_all(b"spilled to disk").unwrap();
        assert_eq!(file.materialize().unwrap(), b"spilled to disk");

        // the snapshot must not have disturbed the stream position
        file.write_all(b" and back").unwrap();
        assert_eq!(file.materialize().unwrap(), b"spilled to disk and back");
    }

    #[test]
    fn test_mem_stream_capacity_growth() {
        let mut stream = MemStream::new().unwrap();
        assert_eq!(stream.capacity(), 128);
        stream.write_all(&[0u8; 1000]).unwrap();
        assert_eq!(stream.capacity(), 1418);
        assert_eq!(stream.len(), 1000);
    }
}
