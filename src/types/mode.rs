/*!
 * File Open Mode
 * Access and positioning semantics requested when opening a file
 */

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::FsError;

bitflags! {
    /// Requested access and positioning semantics for opening a file
    ///
    /// `READ` and `WRITE` combine freely. The remaining bits adjust the
    /// create/truncate/positioning behavior that `WRITE` implies by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileMode: u32 {
        const READ = 1;
        const WRITE = 2;

        /// Fail instead of creating a missing target
        const NOT_CREATE = 0x0000_1000;
        /// Keep existing content instead of truncating on open
        const NOT_TRUNCATE = 0x0000_2000;
        /// Position the cursor at end-of-file after open
        const SEEK_TO_END = 0x1000_0000;
        /// Advisory: the caller will access the file non-sequentially
        const HINT_RANDOM_ACCESS = 0x2000_0000;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        /// Every write lands at the then-current end of file
        const APPEND =
            Self::WRITE.bits() | Self::NOT_TRUNCATE.bits() | Self::SEEK_TO_END.bits();
        const RANDOM_ACCESS = Self::READ.bits()
            | Self::WRITE.bits()
            | Self::NOT_TRUNCATE.bits()
            | Self::HINT_RANDOM_ACCESS.bits();
        const RANDOM_READ = Self::READ.bits() | Self::HINT_RANDOM_ACCESS.bits();
    }
}

impl FileMode {
    /// Check if read access is requested
    #[inline]
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.contains(Self::READ)
    }

    /// Check if write access is requested
    #[inline]
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Check if opening may create a missing target
    #[inline]
    #[must_use]
    pub const fn will_create(&self) -> bool {
        self.contains(Self::WRITE) && !self.contains(Self::NOT_CREATE)
    }

    /// Check if opening truncates existing content
    #[inline]
    #[must_use]
    pub const fn will_truncate(&self) -> bool {
        self.contains(Self::WRITE) && !self.contains(Self::NOT_TRUNCATE)
    }

    /// Check if writes always land at end-of-file (the `APPEND` preset)
    #[inline]
    #[must_use]
    pub const fn is_append(&self) -> bool {
        self.contains(Self::APPEND)
    }

    /// Validate flag combinations
    #[must_use = "validation result must be checked"]
    pub fn validate(&self) -> Result<(), FsError> {
        if !self.intersects(Self::READ_WRITE) {
            return Err(FsError::InvalidArgument(
                "mode requests neither read nor write access".into(),
            ));
        }
        // Truncation and append-at-end are mutually exclusive semantics
        if self.contains(Self::SEEK_TO_END) && self.will_truncate() {
            return Err(FsError::InvalidArgument(
                "seek-to-end requires not-truncate".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FileMode {
    fn default() -> Self {
        Self::READ
    }
}

impl Serialize for FileMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid file mode bits: {:#x}", bits))
        })
    }
}
