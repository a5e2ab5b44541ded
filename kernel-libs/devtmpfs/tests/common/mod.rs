use devtmpfs::DevFs;
use io_error::IOError;
use kdriver_api::{File, FileOperations, UserBuffer};

pub type Host = DevFs<spin::RwLock<()>>;

fn fill_read(_: &File, buf: &mut dyn UserBuffer) -> Result<usize, IOError> {
    let data = vec![0xaa; buf.len()];
    buf.copy_to_user(0, &data)?;
    Ok(data.len())
}

fn sink_write(_: &File, data: &[u8]) -> Result<usize, IOError> {
    Ok(data.len())
}

/// Reads return 0xaa, writes are swallowed.
pub static FILL_FOPS: FileOperations = FileOperations {
    open: None,
    release: None,
    read: Some(fill_read),
    write: Some(sink_write),
};

/// No handlers at all.
pub static EMPTY_FOPS: FileOperations = FileOperations::EMPTY;
