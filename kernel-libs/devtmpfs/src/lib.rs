//! An in-memory device filesystem that plays the kernel for character
//! device drivers: it hands out device numbers, keeps classes and cdev
//! bindings, materializes nodes, and lets callers open and read them.

#![no_std]

extern crate alloc;

use alloc::{collections::btree_map::BTreeMap, string::String, vec::Vec};
use device_api::{DeviceId, DeviceRange, DevnodePolicy, NodeInfo, Permissions};
use io_error::IOError;
use kdriver_api::{CdevHandle, ClassHandle, File, FileOperations, INode, KernelInterface};
use lock_api::{RawRwLock, RwLock};
use log::{debug, trace, warn};
use slotmap::{Key, KeyData, SlotMap};

mod events;
pub mod faults;
pub mod file;
mod region;

pub use events::HostEvent;
pub use faults::{FaultPlan, PartiallyMapped};
pub use file::OpenFile;
pub use region::{DYNAMIC_MAJORS, RegionInfo};

/// Mode given to nodes whose class has no devnode policy, before the umask.
pub const DEFAULT_NODE_MODE: Permissions = Permissions::OWNER_READ.union(Permissions::OWNER_WRITE);

slotmap::new_key_type! {
    struct ClassKey;
    struct CdevKey;
}

struct ClassEntry {
    name: String,
    devnode: Option<DevnodePolicy>,
}

struct CdevEntry {
    range: DeviceRange,
    fops: &'static FileOperations,
}

struct NodeEntry {
    id: DeviceId,
    class: ClassKey,
    permissions: Permissions,
}

/// What `stat` reports about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStat {
    pub path: String,
    pub rdev: DeviceId,
    pub permissions: Permissions,
    /// `None` once the owning class is gone.
    pub class: Option<String>,
}

#[derive(Default)]
struct State {
    regions: region::RegionTable,
    classes: SlotMap<ClassKey, ClassEntry>,
    cdevs: SlotMap<CdevKey, CdevEntry>,
    nodes: BTreeMap<String, NodeEntry>,
    faults: FaultPlan,
    umask: Permissions,
    events: Vec<HostEvent>,
}

impl State {
    fn stat(&self, path: &str, node: &NodeEntry) -> NodeStat {
        NodeStat {
            path: path.into(),
            rdev: node.id,
            permissions: node.permissions,
            class: self.classes.get(node.class).map(|c| c.name.clone()),
        }
    }
}

fn class_key(handle: ClassHandle) -> ClassKey {
    ClassKey::from(KeyData::from_ffi(handle.0))
}

fn cdev_key(handle: CdevHandle) -> CdevKey {
    CdevKey::from(KeyData::from_ffi(handle.0))
}

/// Accepts `bytegen/0x41`, `/bytegen/0x41` and `/dev/bytegen/0x41`.
fn normalize(path: &str) -> &str {
    let path = path.strip_prefix("/dev/").unwrap_or(path);
    path.trim_start_matches('/')
}

pub struct DevFs<R: RawRwLock + Send + Sync> {
    state: RwLock<R, State>,
}

impl<R: RawRwLock + Send + Sync> DevFs<R> {
    pub fn new() -> Self {
        Self::with_umask(Permissions::empty())
    }

    /// A host whose default node mode is trimmed by `umask`. Modes chosen by
    /// a class devnode policy are used as is.
    pub fn with_umask(umask: Permissions) -> Self {
        Self {
            state: RwLock::new(State {
                umask,
                ..State::default()
            }),
        }
    }

    /// Replaces the current failure plan.
    pub fn set_faults(&self, plan: FaultPlan) {
        if !plan.is_empty() {
            debug!("injecting faults: {plan:?}");
        }
        self.state.write().faults = plan;
    }

    pub fn open(&self, path: &str) -> Result<OpenFile, IOError> {
        let path = normalize(path);
        let lock = self.state.read();
        let node = lock.nodes.get(path).ok_or(IOError::NotFound)?;
        let fops = lock
            .cdevs
            .values()
            .find(|cdev| cdev.range.contains(node.id))
            .map(|cdev| cdev.fops)
            .ok_or(IOError::NoDevice)?;
        let inode = INode { rdev: node.id };
        drop(lock);

        let file = File { inode, pos: 0 };
        if let Some(open) = fops.open {
            open(&inode, &file)?;
        }
        Ok(OpenFile::new(path.into(), file, fops))
    }

    pub fn stat(&self, path: &str) -> Result<NodeStat, IOError> {
        let path = normalize(path);
        let lock = self.state.read();
        let node = lock.nodes.get(path).ok_or(IOError::NotFound)?;
        Ok(lock.stat(path, node))
    }

    /// Every node, sorted by path.
    pub fn nodes(&self) -> Vec<NodeStat> {
        let lock = self.state.read();
        lock.nodes
            .iter()
            .map(|(path, node)| lock.stat(path, node))
            .collect()
    }

    pub fn classes(&self) -> Vec<String> {
        self.state
            .read()
            .classes
            .values()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn regions(&self) -> Vec<RegionInfo> {
        self.state.read().regions.iter().cloned().collect()
    }

    pub fn bindings(&self) -> Vec<DeviceRange> {
        self.state
            .read()
            .cdevs
            .values()
            .map(|cdev| cdev.range)
            .collect()
    }

    /// Everything done on behalf of drivers so far, oldest first.
    pub fn events(&self) -> Vec<HostEvent> {
        self.state.read().events.clone()
    }

    /// Like [`DevFs::events`], but also clears the log.
    pub fn take_events(&self) -> Vec<HostEvent> {
        core::mem::take(&mut self.state.write().events)
    }
}

impl<R: RawRwLock + Send + Sync> Default for DevFs<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RawRwLock + Send + Sync> KernelInterface for DevFs<R> {
    fn alloc_chrdev_region(
        &self,
        first_minor: u32,
        count: u32,
        name: &str,
    ) -> Result<DeviceRange, IOError> {
        if count == 0 || first_minor as u64 + count as u64 > DeviceId::MINOR_MASK as u64 + 1 {
            return Err(IOError::InvalidOperation);
        }
        let mut lock = self.state.write();
        if let Some(error) = lock.faults.region {
            return Err(error);
        }
        let range = lock.regions.alloc_dynamic(first_minor, count, name)?;
        trace!("region {range} -> {name}");
        lock.events.push(HostEvent::RegionReserved(range));
        Ok(range)
    }

    fn register_chrdev_region(&self, range: DeviceRange, name: &str) -> Result<(), IOError> {
        if range.count() == 0
            || range.major() > DeviceId::MAJOR_MAX
            || range.end_minor() > DeviceId::MINOR_MASK as u64 + 1
        {
            return Err(IOError::InvalidOperation);
        }
        let mut lock = self.state.write();
        lock.regions.register(range, name)?;
        lock.events.push(HostEvent::RegionReserved(range));
        Ok(())
    }

    fn unregister_chrdev_region(&self, range: DeviceRange) {
        let mut lock = self.state.write();
        if lock.regions.release(range).is_none() {
            warn!("unregistering unknown region {range}");
            return;
        }
        if lock.cdevs.values().any(|cdev| cdev.range.overlaps(&range)) {
            warn!("region {range} released with a cdev still bound");
        }
        lock.events.push(HostEvent::RegionReleased(range));
    }

    fn class_create(
        &self,
        name: &str,
        devnode: Option<DevnodePolicy>,
    ) -> Result<ClassHandle, IOError> {
        let mut lock = self.state.write();
        if let Some(error) = lock.faults.class {
            return Err(error);
        }
        if lock.classes.values().any(|c| c.name == name) {
            return Err(IOError::AlreadyExists);
        }
        let key = lock.classes.insert(ClassEntry {
            name: name.into(),
            devnode,
        });
        lock.events.push(HostEvent::ClassCreated(name.into()));
        Ok(ClassHandle(key.data().as_ffi()))
    }

    fn class_destroy(&self, class: ClassHandle) {
        let mut lock = self.state.write();
        let key = class_key(class);
        let Some(entry) = lock.classes.remove(key) else {
            warn!("destroying unknown class {class:?}");
            return;
        };
        let orphans = lock.nodes.values().filter(|n| n.class == key).count();
        if orphans > 0 {
            warn!(
                "class {} destroyed with {orphans} nodes still present",
                entry.name
            );
        }
        lock.events.push(HostEvent::ClassDestroyed(entry.name));
    }

    fn cdev_add(
        &self,
        range: DeviceRange,
        fops: &'static FileOperations,
    ) -> Result<CdevHandle, IOError> {
        let mut lock = self.state.write();
        if let Some(error) = lock.faults.cdev {
            return Err(error);
        }
        if lock.cdevs.values().any(|cdev| cdev.range.overlaps(&range)) {
            return Err(IOError::Busy);
        }
        let key = lock.cdevs.insert(CdevEntry { range, fops });
        lock.events.push(HostEvent::CdevAdded(range));
        Ok(CdevHandle(key.data().as_ffi()))
    }

    fn cdev_del(&self, cdev: CdevHandle) {
        let mut lock = self.state.write();
        match lock.cdevs.remove(cdev_key(cdev)) {
            Some(entry) => lock.events.push(HostEvent::CdevRemoved(entry.range)),
            None => warn!("removing unknown cdev {cdev:?}"),
        }
    }

    fn device_create(&self, class: ClassHandle, id: DeviceId, name: &str) -> Result<(), IOError> {
        let mut lock = self.state.write();
        let key = class_key(class);
        let devnode = lock
            .classes
            .get(key)
            .ok_or(IOError::InvalidOperation)?
            .devnode;
        if let Some(error) = lock.faults.nodes.get(name) {
            return Err(*error);
        }
        if lock.nodes.contains_key(name) {
            return Err(IOError::AlreadyExists);
        }

        let permissions = match devnode {
            Some(policy) => policy(&NodeInfo { name, id }),
            None => DEFAULT_NODE_MODE.masked(lock.umask),
        };
        trace!("node {name} ({id}) mode {permissions}");
        lock.nodes.insert(
            name.into(),
            NodeEntry {
                id,
                class: key,
                permissions,
            },
        );
        lock.events.push(HostEvent::NodeCreated(name.into()));
        Ok(())
    }

    fn device_destroy(&self, class: ClassHandle, id: DeviceId) {
        let key = class_key(class);
        let mut lock = self.state.write();
        let found = lock
            .nodes
            .iter()
            .find(|(_, node)| node.class == key && node.id == id)
            .map(|(path, _)| path.clone());
        if let Some(path) = found {
            lock.nodes.remove(&path);
            lock.events.push(HostEvent::NodeRemoved(path));
        }
    }
}
