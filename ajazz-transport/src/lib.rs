//! Transport layer for Ajazz macro-key display panels
//!
//! This crate owns everything between a typed panel command and the bytes on
//! the HID pipe:
//!
//! - CRT command frames and their wire constants
//! - key index translation between scan order and logical order
//! - chunking of payloads into fixed-size reports
//! - the serialized, retrying command channel
//! - HID backends (hidapi for hardware, an in-memory mock for tests)

pub mod command;
pub mod error;
pub mod flow_control;
pub mod keymap;
pub mod mock;
pub mod protocol;
pub mod report;
pub mod types;

mod hid_wired;

pub use command::{
    encode_frame, BatchHeader, ClearSlot, DeckCommand, Exit, FrameHeader, Hang, LogoHeader,
    SetLight, SlotTarget, Stop,
};
pub use error::TransportError;
pub use flow_control::{FlowControlTransport, RetryPolicy};
pub use hid_wired::HidWiredTransport;
pub use keymap::{ajazz_to_elgato, elgato_to_ajazz, key_number_to_slot};
pub use mock::MockTransport;
pub use report::ReportWriter;
pub use types::{ReportMode, TransportDeviceInfo};

use std::sync::Arc;

/// Raw HID primitives every backend implements
///
/// Backends move single reports and nothing else. Framing, chunking and
/// retries live in `FlowControlTransport`. All methods take `&self` so the
/// command path and the key reader thread can share one backend.
pub trait HidTransport: Send + Sync {
    /// Write one output report, returning the bytes the HID layer accepted
    fn write(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read one input report
    ///
    /// Returns `Ok(0)` when nothing arrived within `timeout_ms`.
    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError>;

    /// Read a feature report; `buf[0]` carries the report ID
    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Release the device; later calls fail with `TransportError::Closed`
    fn close(&self) -> Result<(), TransportError>;
}

/// Shared handle to a backend
pub type BoxedTransport = Arc<dyn HidTransport>;
