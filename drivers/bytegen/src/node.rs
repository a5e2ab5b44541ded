//! Node names: `0x00` to `0xff`, living under `bytegen/`.

use core::fmt;

use alloc::{format, string::String};

use crate::DRIVER_NAME;

/// The name of the node that emits a given byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeName(u8);

impl NodeName {
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Path relative to the device root, e.g. `bytegen/0x41`.
    pub fn path(self) -> String {
        format!("{DRIVER_NAME}/{self}")
    }

    /// Parses `0xNN` with exactly two lowercase hex digits.
    pub fn parse(name: &str) -> Option<Self> {
        let digits = name.strip_prefix("0x")?;
        let lower_hex = |b: u8| b.is_ascii_digit() || (b'a'..=b'f').contains(&b);
        if digits.len() != 2 || !digits.bytes().all(lower_hex) {
            return None;
        }
        u8::from_str_radix(digits, 16).ok().map(Self)
    }

    /// Accepts a bare name or any path ending in `bytegen/0xNN`.
    pub fn from_path(path: &str) -> Option<Self> {
        let Some((dir, name)) = path.rsplit_once('/') else {
            return Self::parse(path);
        };
        match dir.rsplit('/').next() {
            Some(DRIVER_NAME) => Self::parse(name),
            _ => None,
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}
