/*!
 * POSIX Syscall Layer
 * Raw fd operations behind the uniform handle interface
 */

use std::ffi::CString;
use std::io::SeekFrom;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::{FileMode, FilePermissions, FsError, FsResult};

/// Native file handle: a POSIX file descriptor
pub type RawHandle = libc::c_int;

/// Largest byte count transferred by one read/write call
const MAX_RW: usize = i32::MAX as usize;

fn cstring(path: &Path) -> FsResult<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        FsError::InvalidArgument(format!("path contains a NUL byte: {}", path.display()))
    })
}

fn last_error(context: impl Into<String>) -> FsError {
    FsError::from_io(std::io::Error::last_os_error(), context)
}

fn timestamp(sec: i64, nsec: i64) -> SystemTime {
    if sec >= 0 {
        UNIX_EPOCH + Duration::new(sec as u64, nsec as u32)
    } else {
        UNIX_EPOCH
    }
}

pub(crate) fn open(path: &Path, mode: FileMode, perms: FilePermissions) -> FsResult<RawHandle> {
    mode.validate()?;
    let cpath = cstring(path)?;

    let mut flags = match (mode.is_readable(), mode.is_writable()) {
        (true, true) => libc::O_RDWR,
        (false, true) => libc::O_WRONLY,
        _ => libc::O_RDONLY,
    };
    flags |= libc::O_CLOEXEC;
    if mode.will_create() {
        flags |= libc::O_CREAT;
    }
    if mode.will_truncate() {
        flags |= libc::O_TRUNC;
    }
    if mode.is_append() {
        flags |= libc::O_APPEND;
    }

    let unix_mode = perms.to_unix_mode() as libc::c_uint;
    let fd = unsafe { libc::open(cpath.as_ptr(), flags, unix_mode) };
    if fd < 0 {
        return Err(last_error(format!("open {}", path.display())));
    }

    // O_APPEND already positions every write; a bare seek-to-end request
    // (e.g. read-only with SEEK_TO_END) needs one explicit seek.
    if mode.contains(FileMode::SEEK_TO_END) && !mode.is_append() {
        if unsafe { libc::lseek(fd, 0, libc::SEEK_END) } < 0 {
            let err = last_error(format!("seek to end of {}", path.display()));
            unsafe { libc::close(fd) };
            return Err(err);
        }
    }

    #[cfg(target_os = "linux")]
    if mode.contains(FileMode::HINT_RANDOM_ACCESS) {
        // advisory; ignore failure
        unsafe {
            libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_RANDOM);
        }
    }

    Ok(fd)
}

pub(crate) fn open_device(path: &Path, read: bool, write: bool) -> FsResult<RawHandle> {
    if !read && !write {
        return Err(FsError::InvalidArgument(
            "device open requests neither read nor write access".into(),
        ));
    }
    let cpath = cstring(path)?;
    let access = match (read, write) {
        (true, true) => libc::O_RDWR,
        (false, true) => libc::O_WRONLY,
        _ => libc::O_RDONLY,
    };

    let fd = unsafe { libc::open(cpath.as_ptr(), access | libc::O_CLOEXEC) };
    if fd < 0 {
        return Err(last_error(format!("open device {}", path.display())));
    }
    Ok(fd)
}

pub(crate) fn close(handle: RawHandle) {
    // Nothing useful can be done about a failed close; the fd is gone
    // either way.
    unsafe {
        libc::close(handle);
    }
}

pub(crate) fn seek(handle: RawHandle, pos: SeekFrom) -> FsResult<u64> {
    let (offset, whence) = match pos {
        SeekFrom::Start(n) => (n as i64, libc::SEEK_SET),
        SeekFrom::Current(n) => (n, libc::SEEK_CUR),
        SeekFrom::End(n) => (n, libc::SEEK_END),
    };
    let rc = unsafe { libc::lseek(handle, offset as libc::off_t, whence) };
    if rc < 0 {
        return Err(last_error("seek"));
    }
    Ok(rc as u64)
}

pub(crate) fn read(handle: RawHandle, buf: &mut [u8]) -> FsResult<usize> {
    let len = buf.len().min(MAX_RW);
    let rc = unsafe { libc::read(handle, buf.as_mut_ptr() as *mut libc::c_void, len) };
    if rc < 0 {
        return Err(last_error("read"));
    }
    Ok(rc as usize)
}

pub(crate) fn write(handle: RawHandle, buf: &[u8]) -> FsResult<usize> {
    let len = buf.len().min(MAX_RW);
    let rc = unsafe { libc::write(handle, buf.as_ptr() as *const libc::c_void, len) };
    if rc < 0 {
        return Err(last_error("write"));
    }
    Ok(rc as usize)
}

pub(crate) fn size(handle: RawHandle) -> FsResult<u64> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(handle, &mut st) } < 0 {
        return Err(last_error("stat"));
    }
    Ok(st.st_size as u64)
}

pub(crate) fn set_size(handle: RawHandle, size: u64) -> FsResult<()> {
    if unsafe { libc::ftruncate(handle, size as libc::off_t) } < 0 {
        return Err(last_error("truncate"));
    }
    Ok(())
}

pub(crate) fn sync(handle: RawHandle) -> FsResult<()> {
    if unsafe { libc::fsync(handle) } < 0 {
        return Err(last_error("sync"));
    }
    Ok(())
}

pub(crate) fn lock(handle: RawHandle) -> FsResult<()> {
    if unsafe { libc::flock(handle, libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EWOULDBLOCK || code == libc::EAGAIN => Err(
            FsError::AccessDenied("file is locked by another handle".into()),
        ),
        Some(code) if code == libc::ENOTSUP || code == libc::EINVAL => Err(FsError::Unsupported(
            "locking is not available on this filesystem".into(),
        )),
        _ => Err(FsError::from_io(err, "lock")),
    }
}

pub(crate) fn unlock(handle: RawHandle) -> FsResult<()> {
    if unsafe { libc::flock(handle, libc::LOCK_UN) } < 0 {
        return Err(last_error("unlock"));
    }
    Ok(())
}

/// Modified, accessed, and created timestamps of an open handle
///
/// POSIX has no portable creation time; the status-change time stands in
/// for it except on macOS, which records a birth time.
pub(crate) fn times(handle: RawHandle) -> FsResult<(SystemTime, SystemTime, SystemTime)> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(handle, &mut st) } < 0 {
        return Err(last_error("stat"));
    }

    let modified = timestamp(st.st_mtime as i64, st.st_mtime_nsec as i64);
    let accessed = timestamp(st.st_atime as i64, st.st_atime_nsec as i64);

    #[cfg(target_os = "macos")]
    let created = timestamp(st.st_birthtime as i64, st.st_birthtime_nsec as i64);
    #[cfg(not(target_os = "macos"))]
    let created = timestamp(st.st_ctime as i64, st.st_ctime_nsec as i64);

    Ok((modified, accessed, created))
}

pub(crate) fn set_non_blocking(handle: RawHandle, flag: bool) -> FsResult<()> {
    let current = unsafe { libc::fcntl(handle, libc::F_GETFL) };
    if current < 0 {
        return Err(last_error("get descriptor flags"));
    }
    let updated = if flag {
        current | libc::O_NONBLOCK
    } else {
        current & !libc::O_NONBLOCK
    };
    if unsafe { libc::fcntl(handle, libc::F_SETFL, updated) } < 0 {
        return Err(last_error("set descriptor flags"));
    }
    Ok(())
}

/// Setting a creation time is not expressible through POSIX
pub(crate) fn set_created_time(_path: &Path, _time: SystemTime) -> FsResult<()> {
    Err(FsError::Unsupported(
        "creation time cannot be set on this platform".into(),
    ))
}
