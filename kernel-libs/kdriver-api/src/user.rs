use crate::IOError;

/// A destination buffer owned by the caller of a read.
///
/// Every copy may fail with [`IOError::Fault`], in which case nothing is
/// written for that copy.
pub trait UserBuffer {
    /// The number of bytes the caller asked for.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `src` to `offset..offset + src.len()`.
    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), IOError>;
}

/// A plain mapped buffer. Copies past the end fault.
#[derive(Debug)]
pub struct UserSlice<'a> {
    data: &'a mut [u8],
}

impl<'a> UserSlice<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }
}

impl UserBuffer for UserSlice<'_> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn copy_to_user(&mut self, offset: usize, src: &[u8]) -> Result<(), IOError> {
        let end = offset.checked_add(src.len()).ok_or(IOError::Fault)?;
        let dst = self.data.get_mut(offset..end).ok_or(IOError::Fault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}
