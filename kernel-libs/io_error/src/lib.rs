#![no_std]

use thiserror::Error;

/// Errors returned across the driver/kernel boundary. The discriminant is the
/// Linux errno.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum IOError {
    #[error("Not found")]
    NotFound = 2,
    #[error("No such device")]
    NoDevice = 6,
    #[error("Out of memory")]
    OutOfMemory = 12,
    #[error("Bad address")]
    Fault = 14,
    #[error("Device or resource busy")]
    Busy = 16,
    #[error("Already exists")]
    AlreadyExists = 17,
    #[error("Invalid operation")]
    InvalidOperation = 22,
}

impl IOError {
    /// The Linux errno for this error, as a positive value.
    pub const fn errno(self) -> i32 {
        self as i32
    }
}
