//! Common types for transport layer

use serde::{Deserialize, Serialize};

use crate::protocol::REPORT_SIZE;

/// How each report window is framed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    /// Window is written as-is, exactly `REPORT_SIZE` bytes
    Plain,
    /// Window is prefixed with report ID 0x00, `REPORT_SIZE + 1` bytes
    ReportId,
}

impl ReportMode {
    /// Framing expected by the HID stack of the platform we were built for.
    pub fn native() -> Self {
        if cfg!(target_os = "windows") {
            Self::Plain
        } else {
            Self::ReportId
        }
    }

    /// Number of bytes written before the window data
    pub fn prefix_len(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::ReportId => 1,
        }
    }

    /// Total bytes handed to the HID write primitive per window
    pub fn report_len(self) -> usize {
        REPORT_SIZE + self.prefix_len()
    }
}

impl Default for ReportMode {
    fn default() -> Self {
        Self::native()
    }
}

/// Device identification information
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Device path or identifier (transport-specific)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

impl TransportDeviceInfo {
    /// Stable identifier for the session: the device path, or VID:PID when
    /// the transport has no path.
    pub fn id(&self) -> String {
        if self.device_path.is_empty() {
            format!("{:04x}:{:04x}", self.vid, self.pid)
        } else {
            self.device_path.clone()
        }
    }
}
