use alloc::string::String;
use device_api::DeviceRange;

/// A change the host made to its tables, recorded in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RegionReserved(DeviceRange),
    RegionReleased(DeviceRange),
    ClassCreated(String),
    ClassDestroyed(String),
    CdevAdded(DeviceRange),
    CdevRemoved(DeviceRange),
    /// Node path, e.g. `bytegen/0x41`.
    NodeCreated(String),
    NodeRemoved(String),
}
