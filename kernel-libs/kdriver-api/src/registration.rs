//! Owned registrations. Each one gives its resource back to the kernel when
//! dropped, so a setup sequence written with `?` unwinds in reverse order.

use device_api::{DeviceId, DeviceRange, DevnodePolicy};
use log::trace;

use crate::{CdevHandle, ClassHandle, FileOperations, IOError, KernelInterface};

pub struct ChrdevRegion<'k, K: KernelInterface + ?Sized> {
    kernel: &'k K,
    range: DeviceRange,
}

impl<'k, K: KernelInterface + ?Sized> ChrdevRegion<'k, K> {
    pub fn alloc(kernel: &'k K, first_minor: u32, count: u32, name: &str) -> Result<Self, IOError> {
        let range = kernel.alloc_chrdev_region(first_minor, count, name)?;
        trace!("allocated chrdev region {range} for {name}");
        Ok(Self { kernel, range })
    }

    pub const fn range(&self) -> DeviceRange {
        self.range
    }
}

impl<K: KernelInterface + ?Sized> Drop for ChrdevRegion<'_, K> {
    fn drop(&mut self) {
        trace!("releasing chrdev region {}", self.range);
        self.kernel.unregister_chrdev_region(self.range);
    }
}

pub struct Class<'k, K: KernelInterface + ?Sized> {
    kernel: &'k K,
    handle: ClassHandle,
}

impl<'k, K: KernelInterface + ?Sized> Class<'k, K> {
    pub fn create(
        kernel: &'k K,
        name: &str,
        devnode: Option<DevnodePolicy>,
    ) -> Result<Self, IOError> {
        let handle = kernel.class_create(name, devnode)?;
        trace!("created class {name} ({handle:?})");
        Ok(Self { kernel, handle })
    }
}

impl<K: KernelInterface + ?Sized> Drop for Class<'_, K> {
    fn drop(&mut self) {
        trace!("destroying class {:?}", self.handle);
        self.kernel.class_destroy(self.handle);
    }
}

pub struct Cdev<'k, K: KernelInterface + ?Sized> {
    kernel: &'k K,
    handle: CdevHandle,
    range: DeviceRange,
}

impl<'k, K: KernelInterface + ?Sized> Cdev<'k, K> {
    pub fn add(
        kernel: &'k K,
        range: DeviceRange,
        fops: &'static FileOperations,
    ) -> Result<Self, IOError> {
        let handle = kernel.cdev_add(range, fops)?;
        trace!("bound cdev {handle:?} to {range}");
        Ok(Self {
            kernel,
            handle,
            range,
        })
    }

    pub const fn range(&self) -> DeviceRange {
        self.range
    }
}

impl<K: KernelInterface + ?Sized> Drop for Cdev<'_, K> {
    fn drop(&mut self) {
        trace!("removing cdev {:?}", self.handle);
        self.kernel.cdev_del(self.handle);
    }
}

/// A visible device node. Holds the class by handle only, the owner is
/// responsible for dropping every `Device` before its `Class`.
pub struct Device<'k, K: KernelInterface + ?Sized> {
    kernel: &'k K,
    class: ClassHandle,
    id: DeviceId,
}

impl<'k, K: KernelInterface + ?Sized> Device<'k, K> {
    pub fn create(class: &Class<'k, K>, id: DeviceId, name: &str) -> Result<Self, IOError> {
        class.kernel.device_create(class.handle, id, name)?;
        Ok(Self {
            kernel: class.kernel,
            class: class.handle,
            id,
        })
    }

    pub const fn id(&self) -> DeviceId {
        self.id
    }
}

impl<K: KernelInterface + ?Sized> Drop for Device<'_, K> {
    fn drop(&mut self) {
        self.kernel.device_destroy(self.class, self.id);
    }
}
