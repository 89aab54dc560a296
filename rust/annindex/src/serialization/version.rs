//! Versioning support for snapshots.

/// Current snapshot format version (major 1, minor 0).
pub const CURRENT_VERSION: u32 = SerializationVersion::current().to_u32();

/// Snapshot format version information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationVersion {
    pub major: u16,
    pub minor: u16,
}

impl SerializationVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub const fn current() -> Self {
        Self::new(1, 0)
    }

    pub const fn to_u32(self) -> u32 {
        ((self.major as u32) << 16) | (self.minor as u32)
    }

    pub fn from_u32(value: u32) -> Self {
        Self {
            major: (value >> 16) as u16,
            minor: (value & 0xFFFF) as u16,
        }
    }

    pub fn is_compatible(self, other: Self) -> bool {
        // Major version must match for compatibility
        self.major == other.major
    }
}

impl Default for SerializationVersion {
    fn default() -> Self {
        Self::current()
    }
}
