use alloc::string::String;
use device_api::DeviceId;
use io_error::IOError;
use kdriver_api::{File, FileOperations, UserBuffer, UserSlice};
use log::warn;

/// A node opened through [`crate::DevFs::open`]. Closing happens on drop if
/// [`OpenFile::close`] is not called.
pub struct OpenFile {
    path: String,
    file: File,
    fops: &'static FileOperations,
    released: bool,
}

impl OpenFile {
    pub(crate) fn new(path: String, file: File, fops: &'static FileOperations) -> Self {
        Self {
            path,
            file,
            fops,
            released: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn rdev(&self) -> DeviceId {
        self.file.inode.rdev
    }

    pub const fn pos(&self) -> u64 {
        self.file.pos
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, IOError> {
        self.read_into(&mut UserSlice::new(buf))
    }

    /// Reads into an arbitrary user buffer, which may fault.
    pub fn read_into(&mut self, buf: &mut dyn UserBuffer) -> Result<usize, IOError> {
        let read = self.fops.read.ok_or(IOError::InvalidOperation)?;
        let bytes = read(&self.file, buf)?;
        self.file.pos = self.file.pos.saturating_add(bytes as u64);
        Ok(bytes)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize, IOError> {
        let write = self.fops.write.ok_or(IOError::InvalidOperation)?;
        let bytes = write(&self.file, data)?;
        self.file.pos = self.file.pos.saturating_add(bytes as u64);
        Ok(bytes)
    }

    pub fn close(mut self) -> Result<(), IOError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), IOError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match self.fops.release {
            Some(release) => release(&self.file.inode, &self.file),
            None => Ok(()),
        }
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("release of {} failed: {e}", self.path);
        }
    }
}

impl core::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpenFile")
            .field("path", &self.path)
            .field("rdev", &self.file.inode.rdev)
            .field("pos", &self.file.pos)
            .finish()
    }
}
