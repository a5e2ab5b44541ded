//! Failure injection for exercising driver error paths.

use alloc::{collections::btree_map::BTreeMap, string::String};
use io_error::IOError;
use kdriver_api::UserBuffer;

/// Which kernel calls should fail, and with what.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    pub region: Option<IOError>,
    pub class: Option<IOError>,
    pub cdev: Option<IOError>,
    /// Keyed by the node name passed to `device_create`.
    pub nodes: BTreeMap<String, IOError>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_region(mut self, error: IOError) -> Self {
        self.region = Some(error);
        self
    }

    pub fn fail_class(mut self, error: IOError) -> Self {
        self.class = Some(error);
        self
    }

    pub fn fail_cdev(mut self, error: IOError) -> Self {
        self.cdev = Some(error);
        self
    }

    pub fn fail_node(mut self, name: impl Into<String>, error: IOError) -> Self {
        self.nodes.insert(name.into(), error);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.class.is_none()
            && self.cdev.is_none()
            && self.nodes.is_empty()
    }
}

/// A user buffer whose first `mapped` bytes are valid and the rest unmapped.
pub struct PartiallyMapped<'a> {
    data: &'a mut [u8],
    mapped: usize,
}

impl<'a> PartiallyMapped<'a> {
    pub fn new(data: &'a mut [u8], mapped: usize) -> Self {
        Self { data, mapped }
    }
}

impl UserBuffer for PartiallyMapped<'_> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), IOError> {
        let end = offset.checked_add(src.len()).ok_or(IOError::Fault)?;
        if end > self.mapped.min(self.data.len()) {
            return Err(IOError::Fault);
        }
        self.data[offset..end].copy_from_slice(src);
        Ok(())
    }
}
