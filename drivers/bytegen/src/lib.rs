//! `bytegen`: 256 read-only character devices, `bytegen/0x00` to
//! `bytegen/0xff`. Reading any of them yields its own byte value, forever.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use device_api::{DeviceId, DeviceRange, NodeInfo, Permissions};
use kdriver_api::{
    KernelInterface, Module, ModuleInfo,
    registration::{Cdev, ChrdevRegion, Class, Device},
};
use log::{error, info, trace, warn};

mod error;
mod fops;
pub mod node;
mod state;

pub use error::LoadError;
pub use fops::BYTEGEN_FOPS;
pub use node::NodeName;
pub use state::LoadState;

pub const DRIVER_NAME: &str = "bytegen";
/// One device per byte value.
pub const DEVICE_COUNT: u32 = 256;
pub const NODE_MODE: Permissions = Permissions::READ_ALL;

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    name: DRIVER_NAME,
    version: "1.0",
    license: "GPL",
    author: "Julius Deane <cloud-svc@juliusdeane.com>",
    description: "Character device to emit a byte based in its name.",
    alias: "dev:bytegen",
};

/// Class devnode policy: every node is `r--r--r--`, whoever creates it.
pub fn bytegen_devnode(_: &NodeInfo) -> Permissions {
    NODE_MODE
}

/// The loaded driver. Fields are dropped in declaration order, which is the
/// reverse of the order they were acquired in.
pub struct ByteGen<'k, K: KernelInterface + ?Sized> {
    nodes: Vec<Device<'k, K>>,
    cdev: Cdev<'k, K>,
    class: Class<'k, K>,
    region: ChrdevRegion<'k, K>,
    missing: Vec<NodeName>,
}

fn advance(state: &mut LoadState, next: LoadState) {
    trace!("[bytegen]: {state} -> {next}");
    *state = next;
}

fn fail(state: LoadState, err: LoadError) -> LoadError {
    error!(
        "[bytegen]: FAILURE, {err} ({}), unwinding from {state}",
        err.errno()
    );
    err
}

impl<'k, K: KernelInterface + ?Sized> ByteGen<'k, K> {
    pub fn load(kernel: &'k K) -> Result<Self, LoadError> {
        let mut state = LoadState::Unloaded;
        advance(&mut state, LoadState::Allocating);

        let region = ChrdevRegion::alloc(kernel, 0, DEVICE_COUNT, DRIVER_NAME)
            .map_err(|e| fail(state, LoadError::Allocation(e)))?;

        let class = Class::create(kernel, DRIVER_NAME, Some(bytegen_devnode))
            .map_err(|e| fail(state, LoadError::ClassCreation(e)))?;
        advance(&mut state, LoadState::ClassReady);

        let cdev = Cdev::add(kernel, region.range(), &BYTEGEN_FOPS)
            .map_err(|e| fail(state, LoadError::Binding(e)))?;
        advance(&mut state, LoadState::BindingReady);

        let range = region.range();
        let major = range.major();
        let mut nodes = Vec::with_capacity(DEVICE_COUNT as usize);
        let mut missing = Vec::new();
        for (id, byte) in range.iter().zip(0..=u8::MAX) {
            let name = NodeName::new(byte);
            match Device::create(&class, id, &name.path()) {
                Ok(device) => nodes.push(device),
                Err(e) => {
                    warn!("[bytegen]: FAILURE, cannot create device for {name}: {e}");
                    missing.push(name);
                }
            }
        }
        advance(&mut state, LoadState::NodesReady(nodes.len() as u32));

        advance(&mut state, LoadState::Loaded);
        info!(
            "[bytegen]: SUCCESS, byte generator loaded. MAJOR: {major}. Nodes at /dev/{DRIVER_NAME}/0x00..0xff"
        );

        Ok(Self {
            nodes,
            cdev,
            class,
            region,
            missing,
        })
    }

    /// Tears everything down in reverse order. Never fails; the kernel logs
    /// anything unexpected.
    pub fn unload(self) {
        let mut state = LoadState::Loaded;
        advance(&mut state, LoadState::Unloading);
        let Self {
            nodes,
            cdev,
            class,
            region,
            missing: _,
        } = self;

        drop(nodes);
        drop(cdev);
        drop(class);
        drop(region);

        advance(&mut state, LoadState::Unloaded);
        info!("[bytegen]: byte generator UNLOADED [OK].");
    }

    pub const fn range(&self) -> DeviceRange {
        self.region.range()
    }

    pub const fn major(&self) -> u32 {
        self.region.range().major()
    }

    /// Device numbers of the nodes that were actually created.
    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.nodes.iter().map(Device::id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that could not be created at load time.
    pub fn missing(&self) -> &[NodeName] {
        &self.missing
    }

    pub const fn binding(&self) -> DeviceRange {
        self.cdev.range()
    }
}

impl<'k, K: KernelInterface + ?Sized + 'k> Module<'k, K> for ByteGen<'k, K> {
    const INFO: ModuleInfo = MODULE_INFO;

    type Error = LoadError;

    fn init(kernel: &'k K) -> Result<Self, Self::Error> {
        Self::load(kernel)
    }

    fn exit(self) {
        self.unload()
    }
}
