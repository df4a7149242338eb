/*!
 * File and Directory Operations
 * Stateless whole-file, directory, and attribute helpers
 */

mod walk;

pub use walk::{DirWalker, WalkEntry};

use log::trace;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::file::{platform, File};
use crate::text::{self, Charset, Endian};
use crate::types::{FileAttributes, FsError, FsResult};

/// Write a slice completely, looping over partial transfers
fn write_fully(file: &mut File, mut data: &[u8], context: &Path) -> FsResult<()> {
    while !data.is_empty() {
        let n = file.write(data)?;
        if n == 0 {
            return Err(FsError::Io(format!(
                "write to {} stalled with {} bytes left",
                context.display(),
                data.len()
            )));
        }
        data = &data[n..];
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole-file reads
// ---------------------------------------------------------------------------

/// Read up to `max_size` bytes of a file
///
/// Pass `usize::MAX` for no limit. A file larger than the limit yields
/// exactly `max_size` bytes.
pub fn read_all_bytes(path: impl AsRef<Path>, max_size: usize) -> FsResult<Vec<u8>> {
    File::open_for_read(path)?.read_all_bytes(max_size)
}

/// Read a file as UTF-8 text, dropping a leading byte-order mark
pub fn read_all_text_utf8(path: impl AsRef<Path>, max_size: usize) -> FsResult<String> {
    File::open_for_read(path)?.read_all_text_utf8(max_size)
}

/// Read a file as UTF-16 text of the given endianness
pub fn read_all_text_utf16(
    path: impl AsRef<Path>,
    endian: Endian,
    max_size: usize,
) -> FsResult<String> {
    File::open_for_read(path)?.read_all_text_utf16(endian, max_size)
}

/// Read a file as text, sniffing the encoding from a leading mark and
/// defaulting to UTF-8; returns the text and the detected charset
pub fn read_all_text(path: impl AsRef<Path>, max_size: usize) -> FsResult<(String, Charset)> {
    File::open_for_read(path)?.read_all_text(max_size)
}

// ---------------------------------------------------------------------------
// Whole-file writes
// ---------------------------------------------------------------------------

/// Replace a file's content
pub fn write_all_bytes(path: impl AsRef<Path>, data: &[u8]) -> FsResult<()> {
    let path = path.as_ref();
    let mut file = File::open_for_write(path)?;
    write_fully(&mut file, data, path)?;
    trace!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Append to a file, creating it if missing
pub fn append_all_bytes(path: impl AsRef<Path>, data: &[u8]) -> FsResult<()> {
    let path = path.as_ref();
    let mut file = File::open_for_append(path)?;
    write_fully(&mut file, data, path)
}

/// Replace a file's content with UTF-8 text
///
/// No byte-order mark is written unless `with_bom` asks for one.
pub fn write_all_text_utf8(path: impl AsRef<Path>, text: &str, with_bom: bool) -> FsResult<()> {
    let mut data = Vec::with_capacity(text.len() + text::BOM_UTF8.len());
    if with_bom {
        data.extend_from_slice(&text::BOM_UTF8);
    }
    data.extend_from_slice(text.as_bytes());
    write_all_bytes(path, &data)
}

/// Replace a file's content with UTF-16LE text
pub fn write_all_text_utf16le(path: impl AsRef<Path>, text: &str, with_bom: bool) -> FsResult<()> {
    let mut data = Vec::new();
    if with_bom {
        data.extend_from_slice(&text::BOM_UTF16LE);
    }
    data.extend_from_slice(&text::encode_utf16(text, Endian::Little));
    write_all_bytes(path, &data)
}

/// Replace a file's content with UTF-16BE text
pub fn write_all_text_utf16be(path: impl AsRef<Path>, text: &str, with_bom: bool) -> FsResult<()> {
    let mut data = Vec::new();
    if with_bom {
        data.extend_from_slice(&text::BOM_UTF16BE);
    }
    data.extend_from_slice(&text::encode_utf16(text, Endian::Big));
    write_all_bytes(path, &data)
}

/// Append UTF-8 text to a file
pub fn append_all_text_utf8(path: impl AsRef<Path>, text: &str) -> FsResult<()> {
    append_all_bytes(path, text.as_bytes())
}

/// Append UTF-16LE text to a file
pub fn append_all_text_utf16le(path: impl AsRef<Path>, text: &str) -> FsResult<()> {
    append_all_bytes(path, &text::encode_utf16(text, Endian::Little))
}

/// Append UTF-16BE text to a file
pub fn append_all_text_utf16be(path: impl AsRef<Path>, text: &str) -> FsResult<()> {
    append_all_bytes(path, &text::encode_utf16(text, Endian::Big))
}

// ---------------------------------------------------------------------------
// Directory operations
// ---------------------------------------------------------------------------

/// Names of the immediate children of a directory
pub fn get_files(dir: impl AsRef<Path>) -> FsResult<Vec<String>> {
    let dir = dir.as_ref();
    let metadata =
        fs::metadata(dir).map_err(|e| FsError::from_io(e, format!("list {}", dir.display())))?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(dir.display().to_string()));
    }

    let entries =
        fs::read_dir(dir).map_err(|e| FsError::from_io(e, format!("list {}", dir.display())))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| FsError::from_io(e, format!("list {}", dir.display())))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Relative paths of every descendant file of a directory
///
/// Directories are traversed but not listed; symbolic links are listed but
/// never followed. For a steppable traversal (e.g. with cancellation
/// between entries) use [`DirWalker`] directly.
pub fn get_all_descendant_files(dir: impl AsRef<Path>) -> FsResult<Vec<String>> {
    Ok(DirWalker::new(dir)?
        .filter(|entry| !entry.is_dir)
        .map(|entry| entry.relative_path)
        .collect())
}

/// Delete a directory tree, children before parents
///
/// Best-effort: entries that cannot be deleted are skipped and the
/// aggregate failure is reported as `Partial` after everything deletable
/// has been removed.
pub fn delete_directory_recursively(dir: impl AsRef<Path>) -> FsResult<()> {
    let dir = dir.as_ref();
    trace!("deleting tree at {}", dir.display());
    walk::delete_tree(dir)
}

/// Create one directory
///
/// An already-existing directory is an error only when
/// `error_if_exists` asks for it.
pub fn create_directory(path: impl AsRef<Path>, error_if_exists: bool) -> FsResult<()> {
    let path = path.as_ref();
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && !error_if_exists => {
            if is_directory(path) {
                Ok(())
            } else {
                Err(FsError::AlreadyExists(path.display().to_string()))
            }
        }
        Err(e) => Err(FsError::from_io(e, format!("create {}", path.display()))),
    }
}

/// Create a directory and every missing ancestor
///
/// Succeeds when the whole chain already exists.
pub fn create_directories(path: impl AsRef<Path>) -> FsResult<()> {
    let path = path.as_ref();
    fs::create_dir_all(path)
        .map_err(|e| FsError::from_io(e, format!("create {}", path.display())))
}

/// Delete one file
///
/// A missing file is an error only when `error_if_missing` asks for it.
pub fn delete_file(path: impl AsRef<Path>, error_if_missing: bool) -> FsResult<()> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !error_if_missing => Ok(()),
        Err(e) => Err(FsError::from_io(e, format!("delete {}", path.display()))),
    }
}

/// Move a file or directory to a new path
///
/// Never replaces an existing destination; callers needing atomic
/// replacement want a different primitive. The existence check and the
/// rename are two steps, so a concurrent creation can still win the race.
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> FsResult<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if attributes(to).exists() {
        return Err(FsError::AlreadyExists(to.display().to_string()));
    }
    fs::rename(from, to).map_err(|e| {
        FsError::from_io(e, format!("rename {} to {}", from.display(), to.display()))
    })
}

// ---------------------------------------------------------------------------
// Attribute and timestamp queries
// ---------------------------------------------------------------------------

/// Discovered attributes of a path
///
/// A path that cannot be queried yields `NOT_EXIST`, never the empty set.
#[must_use]
pub fn attributes(path: impl AsRef<Path>) -> FileAttributes {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(metadata) => {
            let mut attrs = FileAttributes::default();
            if metadata.is_dir() {
                attrs |= FileAttributes::DIRECTORY;
            }
            if hidden_by_platform(path) {
                attrs |= FileAttributes::HIDDEN;
            }
            attrs
        }
        Err(_) => FileAttributes::NOT_EXIST,
    }
}

#[cfg(unix)]
fn hidden_by_platform(path: &Path) -> bool {
    // Dot-name convention
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(windows)]
fn hidden_by_platform(path: &Path) -> bool {
    platform::is_hidden(path)
}

/// Check if a path names anything at all
#[must_use]
pub fn exists(path: impl AsRef<Path>) -> bool {
    attributes(path).exists()
}

/// Check if a path names a regular file
#[must_use]
pub fn is_file(path: impl AsRef<Path>) -> bool {
    attributes(path).is_file()
}

/// Check if a path names a directory
#[must_use]
pub fn is_directory(path: impl AsRef<Path>) -> bool {
    attributes(path).is_directory()
}

/// Check if a path names a hidden entry
#[must_use]
pub fn is_hidden(path: impl AsRef<Path>) -> bool {
    attributes(path).is_hidden()
}

/// Mark or unmark an entry as hidden
///
/// Windows flips the hidden attribute. On Unix hiddenness is a naming
/// convention, and renaming from an attribute setter is not this crate's
/// call, so the operation reports `Unsupported` there.
#[cfg(windows)]
pub fn set_hidden(path: impl AsRef<Path>, hidden: bool) -> FsResult<()> {
    platform::set_hidden(path.as_ref(), hidden)
}

#[cfg(not(windows))]
pub fn set_hidden(path: impl AsRef<Path>, _hidden: bool) -> FsResult<()> {
    let _ = path;
    Err(FsError::Unsupported(
        "hidden is a naming convention on this platform".into(),
    ))
}

/// Size of a file in bytes
pub fn get_size(path: impl AsRef<Path>) -> FsResult<u64> {
    let path = path.as_ref();
    fs::metadata(path)
        .map(|md| md.len())
        .map_err(|e| FsError::from_io(e, format!("size of {}", path.display())))
}

fn metadata_of(path: &Path) -> FsResult<fs::Metadata> {
    fs::metadata(path).map_err(|e| FsError::from_io(e, format!("stat {}", path.display())))
}

/// Last-modification timestamp of a path
pub fn modified_time(path: impl AsRef<Path>) -> FsResult<SystemTime> {
    let path = path.as_ref();
    metadata_of(path)?
        .modified()
        .map_err(|e| FsError::from_io(e, format!("modified time of {}", path.display())))
}

/// Last-access timestamp of a path
pub fn accessed_time(path: impl AsRef<Path>) -> FsResult<SystemTime> {
    let path = path.as_ref();
    metadata_of(path)?
        .accessed()
        .map_err(|e| FsError::from_io(e, format!("accessed time of {}", path.display())))
}

/// Creation timestamp of a path, where the platform records one
pub fn created_time(path: impl AsRef<Path>) -> FsResult<SystemTime> {
    let path = path.as_ref();
    metadata_of(path)?
        .created()
        .map_err(|e| FsError::from_io(e, format!("created time of {}", path.display())))
}

/// Set the last-modification timestamp of a path
pub fn set_modified_time(path: impl AsRef<Path>, time: SystemTime) -> FsResult<()> {
    let path = path.as_ref();
    filetime::set_file_mtime(path, filetime::FileTime::from_system_time(time))
        .map_err(|e| FsError::from_io(e, format!("set modified time of {}", path.display())))
}

/// Set the last-access timestamp of a path
pub fn set_accessed_time(path: impl AsRef<Path>, time: SystemTime) -> FsResult<()> {
    let path = path.as_ref();
    filetime::set_file_atime(path, filetime::FileTime::from_system_time(time))
        .map_err(|e| FsError::from_io(e, format!("set accessed time of {}", path.display())))
}

/// Set the creation timestamp of a path
///
/// Only Windows exposes this; elsewhere the operation reports
/// `Unsupported`.
pub fn set_created_time(path: impl AsRef<Path>, time: SystemTime) -> FsResult<()> {
    platform::set_created_time(path.as_ref(), time)
}

// ---------------------------------------------------------------------------
// Path queries that touch the filesystem
// ---------------------------------------------------------------------------

/// Resolve symlinks and relative components to a canonical absolute path
pub fn real_path(path: impl AsRef<Path>) -> FsResult<PathBuf> {
    let path = path.as_ref();
    fs::canonicalize(path)
        .map_err(|e| FsError::from_io(e, format!("canonicalize {}", path.display())))
}

/// Walk upward from `base` until a directory containing `file` is found
///
/// Checks `base` itself first, then at most `max_depth` parents. Returns
/// the containing directory, or `None` when the chain is exhausted.
#[must_use]
pub fn find_parent_path_containing_file(
    base: impl AsRef<Path>,
    file: impl AsRef<Path>,
    max_depth: u32,
) -> Option<PathBuf> {
    let mut current = base.as_ref();
    let file = file.as_ref();

    for _ in 0..=max_depth {
        if current.join(file).exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");

        write_all_bytes(&path, b"payload").unwrap();
        assert_eq!(read_all_bytes(&path, usize::MAX).unwrap(), b"payload");

        // Rewrites replace, appends extend
        write_all_bytes(&path, b"fresh").unwrap();
        append_all_bytes(&path, b"+more").unwrap();
        assert_eq!(read_all_bytes(&path, usize::MAX).unwrap(), b"fresh+more");
    }

    #[test]
    fn test_read_all_bytes_cap() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        write_all_bytes(&path, b"0123456789").unwrap();

        assert_eq!(read_all_bytes(&path, 4).unwrap(), b"0123");
        assert_eq!(read_all_bytes(&path, 100).unwrap(), b"0123456789");
    }

    #[test]
    fn test_utf8_text_round_trip_without_bom() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("text.txt");

        write_all_text_utf8(&path, "hello", false).unwrap();
        let raw = read_all_bytes(&path, usize::MAX).unwrap();
        assert_eq!(raw, b"hello");
        assert_eq!(read_all_text_utf8(&path, usize::MAX).unwrap(), "hello");
    }

    #[test]
    fn test_utf8_text_bom_on_request() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("text.txt");

        write_all_text_utf8(&path, "hello", true).unwrap();
        let raw = read_all_bytes(&path, usize::MAX).unwrap();
        assert_eq!(&raw[..3], &[0xEF, 0xBB, 0xBF]);
        // The mark is transparent to the text reader
        assert_eq!(read_all_text_utf8(&path, usize::MAX).unwrap(), "hello");
    }

    #[test]
    fn test_utf16_text_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wide.txt");

        write_all_text_utf16le(&path, "héllo", true).unwrap();
        assert_eq!(
            read_all_text_utf16(&path, Endian::Little, usize::MAX).unwrap(),
            "héllo"
        );

        write_all_text_utf16be(&path, "wörld", true).unwrap();
        assert_eq!(
            read_all_text_utf16(&path, Endian::Big, usize::MAX).unwrap(),
            "wörld"
        );
    }

    #[test]
    fn test_charset_sniffing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("text.txt");

        write_all_text_utf16le(&path, "wide", true).unwrap();
        let (content, charset) = read_all_text(&path, usize::MAX).unwrap();
        assert_eq!(content, "wide");
        assert_eq!(charset, Charset::Utf16Le);

        write_all_text_utf8(&path, "narrow", false).unwrap();
        let (content, charset) = read_all_text(&path, usize::MAX).unwrap();
        assert_eq!(content, "narrow");
        assert_eq!(charset, Charset::Utf8);
    }

    #[test]
    fn test_append_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.txt");

        append_all_text_utf8(&path, "one").unwrap();
        append_all_text_utf8(&path, ",two").unwrap();
        assert_eq!(read_all_text_utf8(&path, usize::MAX).unwrap(), "one,two");
    }

    #[test]
    fn test_get_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"x").unwrap();
        fs::write(temp.path().join("b.txt"), b"x").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let mut names = get_files(temp.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);

        assert!(matches!(
            get_files(temp.path().join("a.txt")),
            Err(FsError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_get_all_descendant_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("x/y")).unwrap();
        fs::write(temp.path().join("top"), b"1").unwrap();
        fs::write(temp.path().join("x/mid"), b"2").unwrap();
        fs::write(temp.path().join("x/y/leaf"), b"3").unwrap();

        let mut files = get_all_descendant_files(temp.path()).unwrap();
        files.sort();
        assert_eq!(files, vec!["top", "x/mid", "x/y/leaf"]);
    }

    #[test]
    fn test_create_directory_flags() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fresh");

        create_directory(&dir, false).unwrap();
        // Tolerated by default, an error on request
        create_directory(&dir, false).unwrap();
        assert!(matches!(
            create_directory(&dir, true),
            Err(FsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_create_directories_chain() {
        let temp = TempDir::new().unwrap();
        let deep = temp.path().join("a/b/c");

        create_directories(&deep).unwrap();
        assert!(is_directory(&deep));
        // The whole chain existing already is fine
        create_directories(&deep).unwrap();
    }

    #[test]
    fn test_delete_file_flags() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("victim");
        fs::write(&path, b"x").unwrap();

        delete_file(&path, false).unwrap();
        assert!(!exists(&path));
        // Missing is tolerated by default, an error on request
        delete_file(&path, false).unwrap();
        assert!(matches!(
            delete_file(&path, true),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_never_replaces() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from");
        let to = temp.path().join("to");
        fs::write(&from, b"source").unwrap();
        fs::write(&to, b"target").unwrap();

        assert!(matches!(rename(&from, &to), Err(FsError::AlreadyExists(_))));
        assert_eq!(fs::read(&to).unwrap(), b"target");

        fs::remove_file(&to).unwrap();
        rename(&from, &to).unwrap();
        assert!(!exists(&from));
        assert_eq!(fs::read(&to).unwrap(), b"source");
    }

    #[test]
    fn test_attributes_sentinel() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let attrs = attributes(&missing);
        assert_eq!(attrs, FileAttributes::NOT_EXIST);
        assert_ne!(attrs, FileAttributes::default());
        assert!(!exists(&missing));
        assert!(!is_file(&missing));
        assert!(!is_directory(&missing));

        let file = temp.path().join("present");
        fs::write(&file, b"x").unwrap();
        assert!(is_file(&file));
        assert!(!is_directory(&file));
        assert!(is_directory(temp.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_hidden_dot_convention() {
        let temp = TempDir::new().unwrap();
        let hidden = temp.path().join(".secret");
        let plain = temp.path().join("visible");
        fs::write(&hidden, b"x").unwrap();
        fs::write(&plain, b"x").unwrap();

        assert!(is_hidden(&hidden));
        assert!(!is_hidden(&plain));
        assert!(matches!(
            set_hidden(&plain, true),
            Err(FsError::Unsupported(_))
        ));
    }

    #[test]
    fn test_timestamp_setters() {
        use std::time::{Duration, UNIX_EPOCH};

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dated");
        fs::write(&path, b"x").unwrap();

        let past = UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        set_modified_time(&path, past).unwrap();
        assert_eq!(modified_time(&path).unwrap(), past);

        set_accessed_time(&path, past).unwrap();
        assert_eq!(accessed_time(&path).unwrap(), past);
    }

    #[test]
    fn test_get_size() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sized");
        fs::write(&path, b"12345").unwrap();

        assert_eq!(get_size(&path).unwrap(), 5);
        assert!(get_size(temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_find_parent_path_containing_file() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("marker.toml"), b"x").unwrap();

        let found = find_parent_path_containing_file(&nested, "marker.toml", 10).unwrap();
        assert_eq!(real_path(found).unwrap(), real_path(temp.path()).unwrap());

        assert!(find_parent_path_containing_file(&nested, "marker.toml", 1).is_none());
        assert!(find_parent_path_containing_file(&nested, "no-such-file", 10).is_none());
    }

    #[test]
    fn test_real_path_resolves_dots() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sub");
        fs::create_dir(&dir).unwrap();

        let indirect = dir.join("..").join("sub");
        assert_eq!(
            real_path(indirect).unwrap(),
            real_path(&dir).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_directory_recursively_best_effort() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path().join("tree");
        fs::create_dir_all(root.join("open")).unwrap();
        fs::create_dir_all(root.join("sealed")).unwrap();
        fs::write(root.join("open/a"), b"x").unwrap();
        fs::write(root.join("sealed/b"), b"x").unwrap();
        fs::write(root.join("c"), b"x").unwrap();

        // Read+execute but no write: children cannot be unlinked
        fs::set_permissions(root.join("sealed"), fs::Permissions::from_mode(0o555)).unwrap();

        let result = delete_directory_recursively(&root);
        assert!(matches!(result, Err(FsError::Partial(_))));

        // Everything deletable went away
        assert!(!root.join("open").exists());
        assert!(!root.join("c").exists());
        assert!(root.join("sealed/b").exists());

        // Restore and finish the job
        fs::set_permissions(root.join("sealed"), fs::Permissions::from_mode(0o755)).unwrap();
        delete_directory_recursively(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_delete_directory_recursively_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = delete_directory_recursively(temp.path().join("missing"));
        assert!(matches!(result, Err(FsError::NotFound(_))));
    }
}
