//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    /// The transport was closed by the session and can no longer be used
    #[error("Transport closed")]
    Closed,

    /// The HID layer accepted fewer bytes than the report carried
    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Payload longer than the 32-bit length field of a frame header
    #[error("Payload too large: {len} bytes")]
    PayloadTooLarge { len: usize },

    // HID-specific errors
    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}
