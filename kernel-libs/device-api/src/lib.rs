#![no_std]

use core::fmt;

pub mod permissions;

pub use permissions::Permissions;

/// A (major, minor) device number pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

impl DeviceId {
    pub const MINOR_BITS: u32 = 20;
    pub const MINOR_MASK: u32 = (1 << Self::MINOR_BITS) - 1;
    pub const MAJOR_MAX: u32 = (1 << 12) - 1;

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Packs the pair into the userspace `dev_t` layout.
    ///
    /// The low 8 bits of the minor come first, then 12 bits of major, then the
    /// rest of the minor, and the remaining major bits go above bit 32.
    pub const fn encode(self) -> u64 {
        let major = self.major as u64;
        let minor = self.minor as u64;
        (minor & 0xff)
            | ((major & 0xfff) << 8)
            | ((minor & !0xff) << 12)
            | ((major & !0xfff) << 32)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// `count` consecutive minors under a single major, starting at `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceRange {
    base: DeviceId,
    count: u32,
}

impl DeviceRange {
    pub const fn new(base: DeviceId, count: u32) -> Self {
        Self { base, count }
    }

    pub const fn base(&self) -> DeviceId {
        self.base
    }

    pub const fn major(&self) -> u32 {
        self.base.major
    }

    pub const fn count(&self) -> u32 {
        self.count
    }

    /// One past the last minor of the range.
    pub const fn end_minor(&self) -> u64 {
        self.base.minor as u64 + self.count as u64
    }

    pub const fn contains(&self, id: DeviceId) -> bool {
        id.major == self.base.major
            && id.minor >= self.base.minor
            && (id.minor as u64) < self.end_minor()
    }

    pub const fn overlaps(&self, other: &DeviceRange) -> bool {
        self.base.major == other.base.major
            && (self.base.minor as u64) < other.end_minor()
            && (other.base.minor as u64) < self.end_minor()
    }

    pub fn iter(&self) -> impl Iterator<Item = DeviceId> + use<> {
        let major = self.base.major;
        (self.base.minor..(self.end_minor() as u32)).map(move |minor| DeviceId::new(major, minor))
    }
}

impl fmt::Display for DeviceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.base, self.count)
    }
}

/// What a class policy gets to see about a node right before it becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo<'a> {
    pub name: &'a str,
    pub id: DeviceId,
}

/// Decides the access mode of every node created under a class.
pub type DevnodePolicy = fn(&NodeInfo) -> Permissions;
