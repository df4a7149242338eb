/*!
 * unifs
 * Uniform file and path abstraction over POSIX and Win32 primitives
 */

pub mod file;
pub mod ops;
pub mod path;
pub mod text;
pub mod types;

// Re-exports
pub use file::{File, RawHandle};
pub use ops::{DirWalker, WalkEntry};
pub use path::PathSegments;
pub use text::{Charset, Endian};
pub use types::{FileAttributes, FileMode, FilePermissions, FsError, FsResult};
