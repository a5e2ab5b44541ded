use device_api::DeviceId;

use crate::{IOError, user::UserBuffer};

/// The parts of an inode a character device handler can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct INode {
    pub rdev: DeviceId,
}

impl INode {
    pub const fn minor(&self) -> u32 {
        self.rdev.minor
    }
}

/// An open file as passed to the handlers. The position is owned by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct File {
    pub inode: INode,
    pub pos: u64,
}

pub type OpenFn = fn(&INode, &File) -> Result<(), IOError>;
pub type ReleaseFn = fn(&INode, &File) -> Result<(), IOError>;
pub type ReadFn = fn(&File, &mut dyn UserBuffer) -> Result<usize, IOError>;
pub type WriteFn = fn(&File, &[u8]) -> Result<usize, IOError>;

/// Handlers bound to a range of device numbers. A missing handler means the
/// operation is not supported and the kernel answers it on the driver's behalf.
#[derive(Debug, Clone, Copy)]
pub struct FileOperations {
    pub open: Option<OpenFn>,
    pub release: Option<ReleaseFn>,
    pub read: Option<ReadFn>,
    pub write: Option<WriteFn>,
}

impl FileOperations {
    pub const EMPTY: Self = Self {
        open: None,
        release: None,
        read: None,
        write: None,
    };
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::EMPTY
    }
}
