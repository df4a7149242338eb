/*!
 * File Attributes
 * Discovered state of a filesystem entry
 */

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Discovered state of a filesystem entry
    ///
    /// The empty set describes a visible regular file. A path that cannot be
    /// queried at all yields `NOT_EXIST`, which every caller must check
    /// before trusting the other bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileAttributes: u32 {
        const DIRECTORY = 0x0001;
        const HIDDEN = 0x0002;
        /// The path could not be queried
        const NOT_EXIST = 0x8000;
    }
}

impl FileAttributes {
    /// Check if the entry exists
    #[inline]
    #[must_use]
    pub const fn exists(&self) -> bool {
        !self.contains(Self::NOT_EXIST)
    }

    /// Check if the entry is a directory
    #[inline]
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.contains(Self::DIRECTORY) && self.exists()
    }

    /// Check if the entry is a visible or hidden regular file
    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.exists() && !self.contains(Self::DIRECTORY)
    }

    /// Check if the entry is hidden
    #[inline]
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.contains(Self::HIDDEN) && self.exists()
    }
}

impl Default for FileAttributes {
    /// A visible regular file
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for FileAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for FileAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid attribute bits: {:#x}", bits))
        })
    }
}
