/*!
 * File Permissions
 * Per-class access rights plus Win32 sharing bits
 */

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Access rights over three principal classes, plus sharing bits
    ///
    /// The `SHARE_*` bits control whether other processes may concurrently
    /// open the same file while a handle opened with these permissions is
    /// live. They translate to Win32 share modes; POSIX has no equivalent
    /// and ignores them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FilePermissions: u32 {
        const READ_BY_OTHERS = 0x0001;
        const WRITE_BY_OTHERS = 0x0002;
        const EXECUTE_BY_OTHERS = 0x0004;
        const OTHERS = Self::READ_BY_OTHERS.bits()
            | Self::WRITE_BY_OTHERS.bits()
            | Self::EXECUTE_BY_OTHERS.bits();

        const READ_BY_GROUP = 0x0008;
        const WRITE_BY_GROUP = 0x0010;
        const EXECUTE_BY_GROUP = 0x0020;
        const GROUP = Self::READ_BY_GROUP.bits()
            | Self::WRITE_BY_GROUP.bits()
            | Self::EXECUTE_BY_GROUP.bits();

        const READ_BY_USER = 0x0040;
        const WRITE_BY_USER = 0x0080;
        const EXECUTE_BY_USER = 0x0100;
        const USER = Self::READ_BY_USER.bits()
            | Self::WRITE_BY_USER.bits()
            | Self::EXECUTE_BY_USER.bits();

        const READ = Self::READ_BY_USER.bits()
            | Self::READ_BY_GROUP.bits()
            | Self::READ_BY_OTHERS.bits();
        const WRITE = Self::WRITE_BY_USER.bits()
            | Self::WRITE_BY_GROUP.bits()
            | Self::WRITE_BY_OTHERS.bits();
        const EXECUTE = Self::EXECUTE_BY_USER.bits()
            | Self::EXECUTE_BY_GROUP.bits()
            | Self::EXECUTE_BY_OTHERS.bits();

        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::EXECUTE.bits();

        const SHARE_READ = 0x1000;
        const SHARE_WRITE = 0x2000;
        const SHARE_READ_WRITE = Self::SHARE_READ.bits() | Self::SHARE_WRITE.bits();
        const SHARE_DELETE = 0x4000;
        const SHARE_ALL = Self::SHARE_READ.bits()
            | Self::SHARE_WRITE.bits()
            | Self::SHARE_DELETE.bits();
    }
}

impl FilePermissions {
    /// No rights at all
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self::empty()
    }

    /// Convert the permission classes to a Unix `mode_t` value
    ///
    /// Sharing bits have no Unix representation and are dropped.
    #[must_use]
    pub fn to_unix_mode(&self) -> u32 {
        let mut mode = 0;
        if self.contains(Self::READ_BY_USER) {
            mode |= 0o400;
        }
        if self.contains(Self::WRITE_BY_USER) {
            mode |= 0o200;
        }
        if self.contains(Self::EXECUTE_BY_USER) {
            mode |= 0o100;
        }
        if self.contains(Self::READ_BY_GROUP) {
            mode |= 0o040;
        }
        if self.contains(Self::WRITE_BY_GROUP) {
            mode |= 0o020;
        }
        if self.contains(Self::EXECUTE_BY_GROUP) {
            mode |= 0o010;
        }
        if self.contains(Self::READ_BY_OTHERS) {
            mode |= 0o004;
        }
        if self.contains(Self::WRITE_BY_OTHERS) {
            mode |= 0o002;
        }
        if self.contains(Self::EXECUTE_BY_OTHERS) {
            mode |= 0o001;
        }
        mode
    }

    /// Build permission classes from a Unix `mode_t` value
    ///
    /// Only the nine rwx bits are read; file-type and setuid bits are ignored.
    #[must_use]
    pub fn from_unix_mode(mode: u32) -> Self {
        let mut perms = Self::empty();
        if mode & 0o400 != 0 {
            perms |= Self::READ_BY_USER;
        }
        if mode & 0o200 != 0 {
            perms |= Self::WRITE_BY_USER;
        }
        if mode & 0o100 != 0 {
            perms |= Self::EXECUTE_BY_USER;
        }
        if mode & 0o040 != 0 {
            perms |= Self::READ_BY_GROUP;
        }
        if mode & 0o020 != 0 {
            perms |= Self::WRITE_BY_GROUP;
        }
        if mode & 0o010 != 0 {
            perms |= Self::EXECUTE_BY_GROUP;
        }
        if mode & 0o004 != 0 {
            perms |= Self::READ_BY_OTHERS;
        }
        if mode & 0o002 != 0 {
            perms |= Self::WRITE_BY_OTHERS;
        }
        if mode & 0o001 != 0 {
            perms |= Self::EXECUTE_BY_OTHERS;
        }
        perms
    }
}

impl Default for FilePermissions {
    /// Read-write for every class (before any process umask), no sharing
    fn default() -> Self {
        Self::READ | Self::WRITE
    }
}

impl Serialize for FilePermissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for FilePermissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid permission bits: {:#x}", bits))
        })
    }
}
