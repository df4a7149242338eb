/*!
 * Win32 Syscall Layer
 * Raw HANDLE operations behind the uniform handle interface
 */

use std::io::SeekFrom;
use std::path::Path;
use std::ptr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use winapi::shared::minwindef::{DWORD, FILETIME, LPCVOID, LPVOID};
use winapi::shared::winerror::ERROR_LOCK_VIOLATION;
use winapi::um::fileapi::{
    CreateFileW, FlushFileBuffers, GetFileAttributesW, GetFileSizeEx, GetFileTime, LockFileEx,
    ReadFile, SetEndOfFile, SetFileAttributesW, SetFilePointerEx, SetFileTime, UnlockFileEx,
    WriteFile, CREATE_ALWAYS, INVALID_FILE_ATTRIBUTES, OPEN_ALWAYS, OPEN_EXISTING,
    TRUNCATE_EXISTING,
};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::minwinbase::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, OVERLAPPED};
use winapi::um::winbase::{
    FILE_BEGIN, FILE_CURRENT, FILE_END, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_RANDOM_ACCESS,
};
use winapi::um::winnt::{
    FILE_APPEND_DATA, FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_DELETE,
    FILE_SHARE_READ, FILE_SHARE_WRITE, FILE_WRITE_ATTRIBUTES, GENERIC_READ, GENERIC_WRITE, HANDLE,
    LARGE_INTEGER,
};

use crate::types::{FileMode, FilePermissions, FsError, FsResult};

/// Native file handle: a Win32 HANDLE, carried as an integer so the wrapper
/// stays thread-transferable
pub type RawHandle = isize;

/// Largest byte count transferred by one read/write call
const MAX_RW: usize = i32::MAX as usize;

/// Seconds between the Win32 epoch (1601) and the Unix epoch (1970)
const FILETIME_UNIX_DIFF_SECS: u64 = 11_644_473_600;

fn wide(path: &Path) -> FsResult<Vec<u16>> {
    use std::os::windows::ffi::OsStrExt;
    let units: Vec<u16> = path.as_os_str().encode_wide().collect();
    if units.contains(&0) {
        return Err(FsError::InvalidArgument(format!(
            "path contains a NUL unit: {}",
            path.display()
        )));
    }
    Ok(units.into_iter().chain(std::iter::once(0)).collect())
}

fn last_error(context: impl Into<String>) -> FsError {
    FsError::from_io(std::io::Error::last_os_error(), context)
}

fn share_mode(perms: FilePermissions) -> DWORD {
    let mut share = 0;
    if perms.contains(FilePermissions::SHARE_READ) {
        share |= FILE_SHARE_READ;
    }
    if perms.contains(FilePermissions::SHARE_WRITE) {
        share |= FILE_SHARE_WRITE;
    }
    if perms.contains(FilePermissions::SHARE_DELETE) {
        share |= FILE_SHARE_DELETE;
    }
    share
}

fn filetime_to_system(ft: FILETIME) -> SystemTime {
    let ticks = ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64;
    let secs = ticks / 10_000_000;
    let nanos = (ticks % 10_000_000) * 100;
    if secs >= FILETIME_UNIX_DIFF_SECS {
        UNIX_EPOCH + Duration::new(secs - FILETIME_UNIX_DIFF_SECS, nanos as u32)
    } else {
        UNIX_EPOCH
    }
}

fn system_to_filetime(time: SystemTime) -> FILETIME {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    let ticks = (since_epoch.as_secs() + FILETIME_UNIX_DIFF_SECS) * 10_000_000
        + u64::from(since_epoch.subsec_nanos()) / 100;
    FILETIME {
        dwLowDateTime: ticks as DWORD,
        dwHighDateTime: (ticks >> 32) as DWORD,
    }
}

pub(crate) fn open(path: &Path, mode: FileMode, perms: FilePermissions) -> FsResult<RawHandle> {
    mode.validate()?;
    let wpath = wide(path)?;

    let mut access: DWORD = 0;
    if mode.is_readable() {
        access |= GENERIC_READ;
    }
    if mode.is_writable() {
        // FILE_APPEND_DATA without FILE_WRITE_DATA gives atomic
        // append-at-end on every write.
        if mode.is_append() {
            access |= FILE_APPEND_DATA;
        } else {
            access |= GENERIC_WRITE;
        }
    }

    let disposition = if mode.is_writable() {
        match (mode.will_create(), mode.will_truncate()) {
            (true, true) => CREATE_ALWAYS,
            (true, false) => OPEN_ALWAYS,
            (false, true) => TRUNCATE_EXISTING,
            (false, false) => OPEN_EXISTING,
        }
    } else {
        OPEN_EXISTING
    };

    let mut flags = FILE_ATTRIBUTE_NORMAL;
    if mode.contains(FileMode::HINT_RANDOM_ACCESS) {
        flags |= FILE_FLAG_RANDOM_ACCESS;
    }

    let handle = unsafe {
        CreateFileW(
            wpath.as_ptr(),
            access,
            share_mode(perms),
            ptr::null_mut(),
            disposition,
            flags,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(last_error(format!("open {}", path.display())));
    }

    if mode.contains(FileMode::SEEK_TO_END) && !mode.is_append() {
        if let Err(e) = seek(handle as RawHandle, SeekFrom::End(0)) {
            unsafe { CloseHandle(handle) };
            return Err(e);
        }
    }

    Ok(handle as RawHandle)
}

pub(crate) fn open_device(path: &Path, read: bool, write: bool) -> FsResult<RawHandle> {
    if !read && !write {
        return Err(FsError::InvalidArgument(
            "device open requests neither read nor write access".into(),
        ));
    }
    let wpath = wide(path)?;

    let mut access: DWORD = 0;
    if read {
        access |= GENERIC_READ;
    }
    if write {
        access |= GENERIC_WRITE;
    }

    let handle = unsafe {
        CreateFileW(
            wpath.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            ptr::null_mut(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(last_error(format!("open device {}", path.display())));
    }
    Ok(handle as RawHandle)
}

pub(crate) fn close(handle: RawHandle) {
    unsafe {
        CloseHandle(handle as HANDLE);
    }
}

pub(crate) fn seek(handle: RawHandle, pos: SeekFrom) -> FsResult<u64> {
    let (offset, method) = match pos {
        SeekFrom::Start(n) => (n as i64, FILE_BEGIN),
        SeekFrom::Current(n) => (n, FILE_CURRENT),
        SeekFrom::End(n) => (n, FILE_END),
    };

    let mut distance: LARGE_INTEGER = unsafe { std::mem::zeroed() };
    unsafe { *distance.QuadPart_mut() = offset };
    let mut new_pos: LARGE_INTEGER = unsafe { std::mem::zeroed() };

    let ok = unsafe { SetFilePointerEx(handle as HANDLE, distance, &mut new_pos, method) };
    if ok == 0 {
        return Err(last_error("seek"));
    }
    Ok(unsafe { *new_pos.QuadPart() } as u64)
}

pub(crate) fn read(handle: RawHandle, buf: &mut [u8]) -> FsResult<usize> {
    let len = buf.len().min(MAX_RW) as DWORD;
    let mut transferred: DWORD = 0;
    let ok = unsafe {
        ReadFile(
            handle as HANDLE,
            buf.as_mut_ptr() as LPVOID,
            len,
            &mut transferred,
            ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(last_error("read"));
    }
    Ok(transferred as usize)
}

pub(crate) fn write(handle: RawHandle, buf: &[u8]) -> FsResult<usize> {
    let len = buf.len().min(MAX_RW) as DWORD;
    let mut transferred: DWORD = 0;
    let ok = unsafe {
        WriteFile(
            handle as HANDLE,
            buf.as_ptr() as LPCVOID,
            len,
            &mut transferred,
            ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(last_error("write"));
    }
    Ok(transferred as usize)
}

pub(crate) fn size(handle: RawHandle) -> FsResult<u64> {
    let mut size: LARGE_INTEGER = unsafe { std::mem::zeroed() };
    if unsafe { GetFileSizeEx(handle as HANDLE, &mut size) } == 0 {
        return Err(last_error("size"));
    }
    Ok(unsafe { *size.QuadPart() } as u64)
}

pub(crate) fn set_size(handle: RawHandle, size: u64) -> FsResult<()> {
    let saved = seek(handle, SeekFrom::Current(0))?;
    seek(handle, SeekFrom::Start(size))?;
    if unsafe { SetEndOfFile(handle as HANDLE) } == 0 {
        let err = last_error("truncate");
        // restore the cursor even on failure; both positions are valid
        let _ = seek(handle, SeekFrom::Start(saved.min(size)));
        return Err(err);
    }
    seek(handle, SeekFrom::Start(saved.min(size)))?;
    Ok(())
}

pub(crate) fn sync(handle: RawHandle) -> FsResult<()> {
    if unsafe { FlushFileBuffers(handle as HANDLE) } == 0 {
        return Err(last_error("sync"));
    }
    Ok(())
}

pub(crate) fn lock(handle: RawHandle) -> FsResult<()> {
    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
    let ok = unsafe {
        LockFileEx(
            handle as HANDLE,
            LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
            0,
            DWORD::MAX,
            DWORD::MAX,
            &mut overlapped,
        )
    };
    if ok != 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
        return Err(FsError::AccessDenied(
            "file is locked by another handle".into(),
        ));
    }
    Err(FsError::from_io(err, "lock"))
}

pub(crate) fn unlock(handle: RawHandle) -> FsResult<()> {
    let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
    let ok = unsafe {
        UnlockFileEx(
            handle as HANDLE,
            0,
            DWORD::MAX,
            DWORD::MAX,
            &mut overlapped,
        )
    };
    if ok == 0 {
        return Err(last_error("unlock"));
    }
    Ok(())
}

/// Modified, accessed, and created timestamps of an open handle
pub(crate) fn times(handle: RawHandle) -> FsResult<(SystemTime, SystemTime, SystemTime)> {
    let mut created = FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    };
    let mut accessed = created;
    let mut modified = created;
    let ok = unsafe {
        GetFileTime(
            handle as HANDLE,
            &mut created,
            &mut accessed,
            &mut modified,
        )
    };
    if ok == 0 {
        return Err(last_error("file times"));
    }
    Ok((
        filetime_to_system(modified),
        filetime_to_system(accessed),
        filetime_to_system(created),
    ))
}

pub(crate) fn set_created_time(path: &Path, time: SystemTime) -> FsResult<()> {
    let wpath = wide(path)?;
    let handle = unsafe {
        CreateFileW(
            wpath.as_ptr(),
            FILE_WRITE_ATTRIBUTES,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            ptr::null_mut(),
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(last_error(format!("open {}", path.display())));
    }

    let ft = system_to_filetime(time);
    let ok = unsafe { SetFileTime(handle, &ft, ptr::null(), ptr::null()) };
    unsafe { CloseHandle(handle) };
    if ok == 0 {
        return Err(last_error(format!("set created time of {}", path.display())));
    }
    Ok(())
}

/// Raw attribute word of a path, if it can be queried at all
pub(crate) fn file_attributes(path: &Path) -> Option<DWORD> {
    let wpath = wide(path).ok()?;
    let attrs = unsafe { GetFileAttributesW(wpath.as_ptr()) };
    if attrs == INVALID_FILE_ATTRIBUTES {
        None
    } else {
        Some(attrs)
    }
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    file_attributes(path).is_some_and(|attrs| attrs & FILE_ATTRIBUTE_HIDDEN != 0)
}

pub(crate) fn set_hidden(path: &Path, hidden: bool) -> FsResult<()> {
    let wpath = wide(path)?;
    let attrs = file_attributes(path)
        .ok_or_else(|| FsError::NotFound(format!("attributes of {}", path.display())))?;
    let updated = if hidden {
        attrs | FILE_ATTRIBUTE_HIDDEN
    } else {
        attrs & !FILE_ATTRIBUTE_HIDDEN
    };
    if unsafe { SetFileAttributesW(wpath.as_ptr(), updated) } == 0 {
        return Err(last_error(format!("set attributes of {}", path.display())));
    }
    Ok(())
}
