use io_error::IOError;
use kdriver_api::{File, FileOperations, INode, UserBuffer};
use log::{debug, trace};

/// Handlers shared by all 256 nodes. There is no write handler, so the
/// kernel rejects writes itself.
pub static BYTEGEN_FOPS: FileOperations = FileOperations {
    open: Some(bytegen_open),
    release: Some(bytegen_release),
    read: Some(bytegen_read),
    write: None,
};

/// The byte a node emits is its minor number.
const fn byte_of(inode: &INode) -> u8 {
    inode.minor() as u8
}

fn bytegen_open(inode: &INode, _: &File) -> Result<(), IOError> {
    debug!("[bytegen]: OPEN => byte {:#04x}", byte_of(inode));
    Ok(())
}

fn bytegen_release(inode: &INode, _: &File) -> Result<(), IOError> {
    debug!("[bytegen]: CLOSE => byte {:#04x}", byte_of(inode));
    Ok(())
}

/// Fills the whole request with the node's byte, one byte per copy.
///
/// A faulting destination fails the call outright; bytes copied before the
/// fault are not reported.
fn bytegen_read(file: &File, buf: &mut dyn UserBuffer) -> Result<usize, IOError> {
    if buf.is_empty() {
        return Ok(0);
    }
    let byte = byte_of(&file.inode);
    let count = buf.len();
    trace!("[bytegen]: READ {count} x {byte:#04x}");

    let mut sent = 0;
    while sent < count {
        buf.copy_to_user(sent, &[byte])?;
        sent += 1;
    }

    Ok(sent)
}

#[cfg(test)]
mod tests {
    use device_api::DeviceId;
    use kdriver_api::UserSlice;

    use super::*;

    fn file(minor: u32) -> File {
        File {
            inode: INode {
                rdev: DeviceId::new(250, minor),
            },
            pos: 0,
        }
    }

    struct FaultAfter<'a> {
        data: &'a mut [u8],
        mapped: usize,
        copies: usize,
    }

    impl UserBuffer for FaultAfter<'_> {
        fn len(&self) -> usize {
            self.data.len()
        }

        fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), IOError> {
            self.copies += 1;
            if offset + src.len() > self.mapped {
                return Err(IOError::Fault);
            }
            self.data[offset..offset + src.len()].copy_from_slice(src);
            Ok(())
        }
    }

    #[test]
    fn read_fills_request() {
        let mut data = [0u8; 64];
        let read = BYTEGEN_FOPS.read.unwrap();
        assert_eq!(read(&file(0x41), &mut UserSlice::new(&mut data)), Ok(64));
        assert!(data.iter().all(|b| *b == 0x41));
    }

    #[test]
    fn read_of_nothing() {
        let read = BYTEGEN_FOPS.read.unwrap();
        assert_eq!(read(&file(7), &mut UserSlice::new(&mut [])), Ok(0));
    }

    #[test]
    fn copies_one_byte_at_a_time() {
        let mut data = [0u8; 10];
        let mut buf = FaultAfter {
            data: &mut data,
            mapped: 10,
            copies: 0,
        };
        assert_eq!(bytegen_read(&file(1), &mut buf), Ok(10));
        assert_eq!(buf.copies, 10);
    }

    #[test]
    fn fault_fails_whole_read() {
        let mut data = [0u8; 10];
        let mut buf = FaultAfter {
            data: &mut data,
            mapped: 3,
            copies: 0,
        };
        assert_eq!(bytegen_read(&file(0xff), &mut buf), Err(IOError::Fault));
        assert_eq!(buf.copies, 4);
        assert_eq!(&data[..4], &[0xff, 0xff, 0xff, 0]);
    }

    #[test]
    fn open_and_release_always_succeed() {
        let f = file(0);
        assert_eq!(bytegen_open(&f.inode, &f), Ok(()));
        assert_eq!(bytegen_release(&f.inode, &f), Ok(()));
        assert!(BYTEGEN_FOPS.write.is_none());
    }
}
