use io_error::IOError;
use thiserror::Error;

/// A load step that could not complete. Everything acquired before it has
/// already been released when this is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error("device number assignment failed: {0}")]
    Allocation(#[source] IOError),
    #[error("device class creation failed: {0}")]
    ClassCreation(#[source] IOError),
    #[error("adding cdev failed: {0}")]
    Binding(#[source] IOError),
}

impl LoadError {
    pub const fn cause(&self) -> IOError {
        match self {
            Self::Allocation(e) | Self::ClassCreation(e) | Self::Binding(e) => *e,
        }
    }

    /// The negative errno a module init would return.
    pub const fn errno(&self) -> i32 {
        -self.cause().errno()
    }
}
