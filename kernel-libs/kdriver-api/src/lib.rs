#![no_std]

use core::{marker::PhantomData, ops::Deref};

use device_api::{DeviceId, DeviceRange, DevnodePolicy};
use log::info;

pub mod fops;
pub mod registration;
pub mod user;

pub use device_api;
pub use fops::{File, FileOperations, INode};
pub use io_error::IOError;
pub use user::{UserBuffer, UserSlice};

/// Opaque reference to a device class owned by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassHandle(pub u64);

/// Opaque reference to a bound cdev.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CdevHandle(pub u64);

/// The kernel services a character device driver is allowed to use.
pub trait KernelInterface {
    /// Reserves `count` minors under a dynamically chosen major.
    fn alloc_chrdev_region(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceRange, IOError>;

    /// Reserves an exact range, failing with [`IOError::Busy`] if any part of it is taken.
    fn register_chrdev_region(&self, range: DeviceRange, name: &str) -> Result<(), IOError>;

    fn unregister_chrdev_region(&self, range: DeviceRange);

    /// Creates a class. `devnode` decides the mode of every node created under it.
    fn class_create(
        &self,
        name: &str,
        devnode: Option<DevnodePolicy>,
    ) -> Result<ClassHandle, IOError>;

    fn class_destroy(&self, class: ClassHandle);

    /// Binds `fops` to every device number in `range`.
    fn cdev_add(
        &self,
        range: DeviceRange,
        fops: &'static FileOperations,
    ) -> Result<CdevHandle, IOError>;

    fn cdev_del(&self, cdev: CdevHandle);

    /// Makes a node called `name` for `id` visible under `class`.
    fn device_create(&self, class: ClassHandle, id: DeviceId, name: &str) -> Result<(), IOError>;

    /// Removes the node for `id`. Unknown ids are ignored.
    fn device_destroy(&self, class: ClassHandle, id: DeviceId);
}

/// Static metadata every driver exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub license: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub alias: &'static str,
}

/// A loadable driver. `init` either returns a fully set up module or releases
/// everything it acquired before failing.
pub trait Module<'k, K: KernelInterface + ?Sized + 'k>: Sized {
    const INFO: ModuleInfo;

    type Error: core::error::Error + Send + Sync + 'static;

    fn init(kernel: &'k K) -> Result<Self, Self::Error>;

    fn exit(self);
}

/// A module that has been started. Dropping it stops the module.
pub struct LoadedModule<'k, K, M>
where
    K: KernelInterface + ?Sized + 'k,
    M: Module<'k, K>,
{
    /// Only `None` while the module is being stopped.
    module: Option<M>,
    _kernel: PhantomData<&'k K>,
}

impl<'k, K, M> LoadedModule<'k, K, M>
where
    K: KernelInterface + ?Sized + 'k,
    M: Module<'k, K>,
{
    pub const fn info(&self) -> ModuleInfo {
        M::INFO
    }

    pub fn rmmod(self) {
        drop(self)
    }
}

impl<'k, K, M> Deref for LoadedModule<'k, K, M>
where
    K: KernelInterface + ?Sized + 'k,
    M: Module<'k, K>,
{
    type Target = M;

    fn deref(&self) -> &Self::Target {
        match &self.module {
            Some(module) => module,
            None => unreachable!("module used while stopping"),
        }
    }
}

impl<'k, K, M> Drop for LoadedModule<'k, K, M>
where
    K: KernelInterface + ?Sized + 'k,
    M: Module<'k, K>,
{
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            info!("Stopping driver [{}:{}]", M::INFO.name, M::INFO.version);
            module.exit();
        }
    }
}

/// Starts `M` against `kernel`.
pub fn insmod<'k, K, M>(kernel: &'k K) -> Result<LoadedModule<'k, K, M>, M::Error>
where
    K: KernelInterface + ?Sized + 'k,
    M: Module<'k, K>,
{
    info!("Starting driver [{}:{}]", M::INFO.name, M::INFO.version);
    let module = M::init(kernel)?;
    Ok(LoadedModule {
        module: Some(module),
        _kernel: PhantomData,
    })
}
