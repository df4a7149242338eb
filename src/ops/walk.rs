/*!
 * Directory Traversal
 * Work-list based descent with symlink-cycle protection
 */

use log::warn;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{FsError, FsResult};

/// One entry produced by a [`DirWalker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the walk root, `/`-separated
    pub relative_path: String,
    /// Whether the entry is a real subdirectory (symlinks are never
    /// reported as directories, since the walk does not follow them)
    pub is_dir: bool,
}

/// Iterative descendant traversal of one directory tree
///
/// The walker keeps an explicit work-list instead of recursing, so depth is
/// bounded by the tree and not the call stack, and each `next()` is a
/// natural cancellation point: dropping the iterator abandons the rest of
/// the walk.
///
/// Symbolic links are reported but never entered, and already-visited real
/// paths are skipped, so link cycles cannot loop the traversal. Unreadable
/// subdirectories are logged and skipped rather than ending the walk.
#[derive(Debug)]
pub struct DirWalker {
    pending: Vec<(PathBuf, String)>,
    ready: VecDeque<WalkEntry>,
    visited: HashSet<PathBuf>,
}

impl DirWalker {
    /// Start a walk over the descendants of `root`
    pub fn new(root: impl AsRef<Path>) -> FsResult<Self> {
        let root = root.as_ref();
        let metadata = fs::metadata(root)
            .map_err(|e| FsError::from_io(e, format!("walk {}", root.display())))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory(root.display().to_string()));
        }

        let mut visited = HashSet::new();
        if let Ok(real) = fs::canonicalize(root) {
            visited.insert(real);
        }

        Ok(Self {
            pending: vec![(root.to_path_buf(), String::new())],
            ready: VecDeque::new(),
            visited,
        })
    }

    fn expand(&mut self, dir: &Path, prefix: &str) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("skipping unreadable directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            let is_real_dir = entry
                .file_type()
                .map(|t| t.is_dir() && !t.is_symlink())
                .unwrap_or(false);

            if is_real_dir {
                let path = entry.path();
                let already_seen = match fs::canonicalize(&path) {
                    Ok(real) => !self.visited.insert(real),
                    Err(_) => false,
                };
                if already_seen {
                    warn!("skipping already-visited directory {}", path.display());
                } else {
                    self.pending.push((path, relative.clone()));
                }
            }

            self.ready.push_back(WalkEntry {
                relative_path: relative,
                is_dir: is_real_dir,
            });
        }
    }
}

impl Iterator for DirWalker {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(entry);
            }
            let (dir, prefix) = self.pending.pop()?;
            self.expand(&dir, &prefix);
        }
    }
}

/// Depth-first deletion of a whole tree with an explicit work-list
///
/// Children go before their parent. Failures are counted and skipped, not
/// fatal: everything deletable is deleted, and the aggregate is reported at
/// the end. Symbolic links are removed without following them.
pub(crate) fn delete_tree(root: &Path) -> FsResult<()> {
    if fs::symlink_metadata(root).is_err() {
        return Err(FsError::NotFound(root.display().to_string()));
    }

    let mut failed: usize = 0;
    let mut first_failure: Option<String> = None;
    let mut note_failure = |what: String, failed: &mut usize| {
        warn!("could not delete {}", what);
        if first_failure.is_none() {
            first_failure = Some(what);
        }
        *failed += 1;
    };

    // (path, children_done)
    let mut stack: Vec<(PathBuf, bool)> = vec![(root.to_path_buf(), false)];

    while let Some((path, children_done)) = stack.pop() {
        if children_done {
            if let Err(e) = fs::remove_dir(&path) {
                note_failure(format!("{}: {}", path.display(), e), &mut failed);
            }
            continue;
        }

        let is_real_dir = fs::symlink_metadata(&path)
            .map(|md| md.is_dir())
            .unwrap_or(false);

        if is_real_dir {
            stack.push((path.clone(), true));
            match fs::read_dir(&path) {
                Ok(entries) => {
                    for entry in entries {
                        match entry {
                            Ok(entry) => stack.push((entry.path(), false)),
                            Err(e) => note_failure(
                                format!("{}: {}", path.display(), e),
                                &mut failed,
                            ),
                        }
                    }
                }
                Err(e) => note_failure(format!("{}: {}", path.display(), e), &mut failed),
            }
        } else if let Err(e) = fs::remove_file(&path) {
            note_failure(format!("{}: {}", path.display(), e), &mut failed);
        }
    }

    match (failed, first_failure) {
        (0, _) => Ok(()),
        (n, Some(first)) => Err(FsError::Partial(format!(
            "{} entries could not be deleted, first: {}",
            n, first
        ))),
        (n, None) => Err(FsError::Partial(format!(
            "{} entries could not be deleted",
            n
        ))),
    }
}
