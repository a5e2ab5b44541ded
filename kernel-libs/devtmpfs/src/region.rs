use core::ops::RangeInclusive;

use alloc::{string::String, vec::Vec};
use device_api::{DeviceId, DeviceRange};
use io_error::IOError;

/// Majors handed out by dynamic allocation, each searched from the top down.
pub const DYNAMIC_MAJORS: [RangeInclusive<u32>; 2] = [234..=254, 384..=511];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: String,
    pub range: DeviceRange,
}

#[derive(Default)]
pub(crate) struct RegionTable {
    regions: Vec<RegionInfo>,
}

impl RegionTable {
    fn major_in_use(&self, major: u32) -> bool {
        self.regions.iter().any(|r| r.range.major() == major)
    }

    pub(crate) fn alloc_dynamic(
        &mut self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceRange, IOError> {
        let major = DYNAMIC_MAJORS
            .iter()
            .flat_map(|majors| majors.clone().rev())
            .find(|major| !self.major_in_use(*major))
            .ok_or(IOError::Busy)?;

        let range = DeviceRange::new(DeviceId::new(major, first_minor), count);
        self.regions.push(RegionInfo {
            name: name.into(),
            range,
        });
        Ok(range)
    }

    pub(crate) fn register(&mut self, range: DeviceRange, name: &str) -> Result<(), IOError> {
        if self.regions.iter().any(|r| r.range.overlaps(&range)) {
            return Err(IOError::Busy);
        }
        self.regions.push(RegionInfo {
            name: name.into(),
            range,
        });
        Ok(())
    }

    /// Returns the released entry, or `None` if `range` was never registered as is.
    pub(crate) fn release(&mut self, range: DeviceRange) -> Option<RegionInfo> {
        let idx = self.regions.iter().position(|r| r.range == range)?;
        Some(self.regions.remove(idx))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RegionInfo> {
        self.regions.iter()
    }
}
