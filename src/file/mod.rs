/*!
 * File Handle Abstraction
 * One owned native handle behind a uniform seek/read/write/lock interface
 */

mod sys;

pub use sys::RawHandle;

use std::io::{self, SeekFrom};
use std::path::Path;
use std::time::SystemTime;

use crate::text::{self, Charset, Endian};
use crate::types::{FileMode, FilePermissions, FsError, FsResult};

/// An owned native file handle
///
/// Created through one of the static openers; closing happens on drop or
/// through an explicit [`close`](File::close), idempotently. The instance is
/// Closed or Open, nothing else; reopening means constructing a new value.
///
/// A `File` owns exactly one handle at every instant and is move-only. It is
/// not synchronized: the cursor lives in the OS, so concurrent method calls
/// on one instance race on it and need external coordination. Separate
/// instances over the same path coordinate only through the `SHARE_*`
/// permission bits given at open time.
#[derive(Debug)]
pub struct File {
    handle: Option<RawHandle>,
}

impl File {
    /// Open a file, translating the uniform mode and permission flags to
    /// the platform's native open semantics
    ///
    /// Write access creates a missing target unless `NOT_CREATE` and
    /// truncates existing content unless `NOT_TRUNCATE`; the `APPEND`
    /// preset makes every write land at the then-current end of file. The
    /// `SHARE_*` permission bits become Win32 share modes and are ignored
    /// on POSIX, which has no open-time sharing control.
    pub fn open(
        path: impl AsRef<Path>,
        mode: FileMode,
        permissions: FilePermissions,
    ) -> FsResult<Self> {
        let handle = sys::open(path.as_ref(), mode, permissions)?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Open with default permissions (read-write classes, no sharing)
    pub fn open_with_mode(path: impl AsRef<Path>, mode: FileMode) -> FsResult<Self> {
        Self::open(path, mode, FilePermissions::default())
    }

    /// Open an existing file for reading, allowing other readers
    pub fn open_for_read(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open(
            path,
            FileMode::READ,
            FilePermissions::default() | FilePermissions::SHARE_READ,
        )
    }

    /// Open for writing: create if missing, truncate if not
    pub fn open_for_write(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open_with_mode(path, FileMode::WRITE)
    }

    /// Open for reading and writing: create if missing, truncate if not
    pub fn open_for_read_write(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open_with_mode(path, FileMode::READ_WRITE)
    }

    /// Open for appending: create if missing, keep content, write at end
    pub fn open_for_append(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open_with_mode(path, FileMode::APPEND)
    }

    /// Open for non-sequential reading and writing, keeping content
    pub fn open_for_random_access(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open_with_mode(path, FileMode::RANDOM_ACCESS)
    }

    /// Open an existing file for non-sequential reading, allowing other
    /// readers
    pub fn open_for_random_read(path: impl AsRef<Path>) -> FsResult<Self> {
        Self::open(
            path,
            FileMode::RANDOM_READ,
            FilePermissions::default() | FilePermissions::SHARE_READ,
        )
    }

    /// Open a raw block or character device
    ///
    /// The path is passed to the OS verbatim (`/dev/sda1`,
    /// `\\.\PhysicalDrive0`, ...); create and truncate semantics do not
    /// apply to devices.
    pub fn open_device(path: impl AsRef<Path>, read: bool, write: bool) -> FsResult<Self> {
        let handle = sys::open_device(path.as_ref(), read, write)?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wrap a handle obtained elsewhere, taking ownership of it
    #[must_use]
    pub fn from_handle(handle: RawHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Check if the instance currently owns an open handle
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The raw native handle, for interop only
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> Option<RawHandle> {
        self.handle
    }

    /// Replace the owned handle with one obtained elsewhere
    ///
    /// A currently owned handle is closed first, so the instance never
    /// holds two.
    pub fn set_handle(&mut self, handle: RawHandle) {
        self.close();
        self.handle = Some(handle);
    }

    /// Give up ownership without closing; the caller becomes responsible
    /// for the returned handle
    pub fn clear_handle(&mut self) -> Option<RawHandle> {
        self.handle.take()
    }

    /// Consume the wrapper, releasing the handle to the caller unclosed
    #[must_use]
    pub fn into_handle(mut self) -> Option<RawHandle> {
        self.handle.take()
    }

    /// Close the handle; further calls are no-ops
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            sys::close(handle);
        }
    }

    fn require(&self) -> FsResult<RawHandle> {
        self.handle.ok_or(FsError::InvalidHandle)
    }

    /// Reposition the cursor
    ///
    /// The cursor is OS state shared by everyone using this handle. Fails
    /// on a closed instance, a resulting negative position, or an
    /// unseekable stream.
    pub fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        sys::seek(self.require()?, pos)
    }

    /// Current cursor position
    pub fn position(&self) -> FsResult<u64> {
        sys::seek(self.require()?, SeekFrom::Current(0))
    }

    /// Read up to `buf.len()` bytes in one OS call
    ///
    /// Returns the count actually transferred; fewer than requested is not
    /// an error, and zero means end-of-stream for a non-empty buffer. A
    /// single call transfers at most 2^31-1 bytes.
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        sys::read(self.require()?, buf)
    }

    /// Write up to `buf.len()` bytes in one OS call
    ///
    /// Returns the count actually transferred; fewer than requested is not
    /// an error. A single call transfers at most 2^31-1 bytes.
    pub fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        sys::write(self.require()?, buf)
    }

    /// Size of the underlying file
    pub fn size(&self) -> FsResult<u64> {
        sys::size(self.require()?)
    }

    /// Truncate or extend the underlying file
    ///
    /// Requires write access. The cursor is left where the OS leaves it
    /// (POSIX does not move it; the Win32 path restores it, clamped to the
    /// new size), so callers continuing to write should seek first.
    pub fn set_size(&mut self, size: u64) -> FsResult<()> {
        sys::set_size(self.require()?, size)
    }

    /// Measure the seekable extent by seeking to the end and back
    ///
    /// Works on raw devices, whose size a plain stat does not report.
    pub fn device_size(&mut self) -> FsResult<u64> {
        let handle = self.require()?;
        let saved = sys::seek(handle, SeekFrom::Current(0))?;
        let end = sys::seek(handle, SeekFrom::End(0))?;
        sys::seek(handle, SeekFrom::Start(saved))?;
        Ok(end)
    }

    /// Flush file data and metadata to storage
    pub fn sync(&mut self) -> FsResult<()> {
        sys::sync(self.require()?)
    }

    /// Try to take a whole-file exclusive lock, without blocking
    ///
    /// Advisory on POSIX (only cooperating processes notice it), mandatory
    /// regional locking on Windows. Contention reports `AccessDenied`,
    /// filesystems without locking report `Unsupported`; both mean "could
    /// not acquire" and are never fatal.
    pub fn lock(&mut self) -> FsResult<()> {
        sys::lock(self.require()?)
    }

    /// Release a lock taken by [`lock`](File::lock)
    pub fn unlock(&mut self) -> FsResult<()> {
        sys::unlock(self.require()?)
    }

    /// Last-modification timestamp of the open file
    pub fn modified_time(&self) -> FsResult<SystemTime> {
        Ok(sys::times(self.require()?)?.0)
    }

    /// Last-access timestamp of the open file
    pub fn accessed_time(&self) -> FsResult<SystemTime> {
        Ok(sys::times(self.require()?)?.1)
    }

    /// Creation timestamp of the open file
    ///
    /// POSIX systems without a birth time report the status-change time.
    pub fn created_time(&self) -> FsResult<SystemTime> {
        Ok(sys::times(self.require()?)?.2)
    }

    /// Read the whole file from the start, up to `max_size` bytes
    ///
    /// Loops over partial transfers until `min(max_size, file size)` bytes
    /// arrived or the stream ended early.
    pub fn read_all_bytes(&mut self, max_size: usize) -> FsResult<Vec<u8>> {
        let total = self.size()?;
        let wanted = usize::try_from(total).unwrap_or(usize::MAX).min(max_size);

        self.seek(SeekFrom::Start(0))?;
        let mut data = vec![0u8; wanted];
        let mut filled = 0;
        while filled < wanted {
            let n = self.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data.truncate(filled);
        Ok(data)
    }

    /// Read the whole file as UTF-8 text, dropping a leading mark
    pub fn read_all_text_utf8(&mut self, max_size: usize) -> FsResult<String> {
        let data = self.read_all_bytes(max_size)?;
        let body = data
            .strip_prefix(&text::BOM_UTF8[..])
            .unwrap_or(&data);
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    /// Read the whole file as UTF-16 text of the given endianness,
    /// dropping a matching leading mark
    pub fn read_all_text_utf16(&mut self, endian: Endian, max_size: usize) -> FsResult<String> {
        let data = self.read_all_bytes(max_size)?;
        let bom: &[u8] = match endian {
            Endian::Little => &text::BOM_UTF16LE,
            Endian::Big => &text::BOM_UTF16BE,
        };
        let body = data.strip_prefix(bom).unwrap_or(&data);
        Ok(text::decode_utf16(body, endian))
    }

    /// Read the whole file as text, sniffing the encoding from a leading
    /// mark and defaulting to UTF-8
    ///
    /// Returns the decoded text and the charset it was decoded as.
    pub fn read_all_text(&mut self, max_size: usize) -> FsResult<(String, Charset)> {
        let data = self.read_all_bytes(max_size)?;
        let (charset, skip) = text::detect_bom(&data).unwrap_or((Charset::Utf8, 0));
        Ok((text::decode(&data[skip..], charset), charset))
    }

    /// Switch a descriptor between blocking and non-blocking I/O
    #[cfg(unix)]
    pub fn set_non_blocking(handle: RawHandle, flag: bool) -> FsResult<()> {
        sys::set_non_blocking(handle, flag)
    }
}

impl Drop for File {
    fn drop(&mut self) {
        self.close();
    }
}

impl io::Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        File::read(self, buf).map_err(Into::into)
    }
}

impl io::Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        File::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sync().map_err(Into::into)
    }
}

impl io::Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        File::seek(self, pos).map_err(Into::into)
    }
}

pub(crate) mod platform {
    //! Path-level platform calls shared with the operations module

    pub(crate) use super::sys::set_created_time;

    #[cfg(windows)]
    pub(crate) use super::sys::{is_hidden, set_hidden};
}
