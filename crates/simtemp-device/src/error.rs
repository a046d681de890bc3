//! Device error types

use thiserror::Error;

/// errno values mirrored into the statistics' `last_error` field
pub mod errno {
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// Try again
    pub const EAGAIN: i32 = 11;
    /// Interrupted call
    pub const EINTR: i32 = 4;
}

/// Errors surfaced by the read gateway and the configuration surface
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// Malformed or out-of-range input; device state is unchanged
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller buffer cannot hold one whole record; rejected before any
    /// data movement
    #[error("buffer too small for one record: got {got} bytes, need {need}")]
    BufferTooSmall { got: usize, need: usize },

    /// Buffer empty in non-blocking mode; not a failure, retry later
    #[error("no sample available, try again")]
    WouldBlock,

    /// Blocking wait aborted by device detach
    #[error("read interrupted")]
    Interrupted,
}

impl DeviceError {
    /// errno-style code for this error
    pub fn code(&self) -> i32 {
        match self {
            DeviceError::InvalidArgument(_) | DeviceError::BufferTooSmall { .. } => errno::EINVAL,
            DeviceError::WouldBlock => errno::EAGAIN,
            DeviceError::Interrupted => errno::EINTR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DeviceError::InvalidArgument("x".into()).code(), 22);
        assert_eq!(DeviceError::BufferTooSmall { got: 3, need: 16 }.code(), 22);
        assert_eq!(DeviceError::WouldBlock.code(), 11);
        assert_eq!(DeviceError::Interrupted.code(), 4);
    }
}
