//! HID transport for a panel on a direct USB connection

use std::ffi::{CStr, CString};

use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::types::TransportDeviceInfo;
use crate::HidTransport;

/// Raw HID I/O over hidapi.
///
/// Output and feature reports go through one handle. Input reports are read
/// from a second handle on the same device path when the platform allows it,
/// so a blocked read never holds up a write. Without one, both share the
/// output handle and reads are bounded by their timeout.
pub struct HidWiredTransport {
    /// Output and feature reports
    output: Mutex<Option<HidDevice>>,
    /// Input reports (key scans), if a second handle could be opened
    input: Mutex<Option<HidDevice>>,
    has_input: bool,
    info: TransportDeviceInfo,
}

impl HidWiredTransport {
    /// Wrap already-open devices
    pub fn new(output: HidDevice, input: Option<HidDevice>, info: TransportDeviceInfo) -> Self {
        let has_input = input.is_some();
        Self {
            output: Mutex::new(Some(output)),
            input: Mutex::new(input),
            has_input,
            info,
        }
    }

    /// Open the first interface matching `vid:pid`
    pub fn open(api: &HidApi, vid: u16, pid: u16) -> Result<Self, TransportError> {
        let output = api.open(vid, pid).map_err(|e| match TransportError::from(e) {
            TransportError::HidError(msg) => {
                TransportError::DeviceNotFound(format!("{vid:04x}:{pid:04x} ({msg})"))
            }
            other => other,
        })?;
        let path = output
            .get_device_info()
            .map(|d| d.path().to_owned())
            .ok();
        let input = path.as_deref().and_then(|p| Self::open_input(api, p));
        let device_path = path
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let info = Self::describe(&output, vid, pid, device_path);
        debug!("Opened HID device {:04x}:{:04x}", vid, pid);
        Ok(Self::new(output, input, info))
    }

    /// Open a specific hidraw / platform device path
    pub fn open_path(api: &HidApi, path: &str) -> Result<Self, TransportError> {
        let c_path = CString::new(path).map_err(|e| TransportError::Internal(e.to_string()))?;
        let output = api.open_path(&c_path)?;
        let (vid, pid) = output
            .get_device_info()
            .map(|d| (d.vendor_id(), d.product_id()))
            .unwrap_or((0, 0));
        let input = Self::open_input(api, &c_path);

        let info = Self::describe(&output, vid, pid, path.to_string());
        debug!("Opened HID device at {}", path);
        Ok(Self::new(output, input, info))
    }

    fn open_input(api: &HidApi, path: &CStr) -> Option<HidDevice> {
        match api.open_path(path) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("No separate input handle ({}), sharing the output handle", e);
                None
            }
        }
    }

    fn describe(device: &HidDevice, vid: u16, pid: u16, device_path: String) -> TransportDeviceInfo {
        TransportDeviceInfo {
            vid,
            pid,
            device_path,
            serial: device.get_serial_number_string().ok().flatten(),
            product_name: device.get_product_string().ok().flatten(),
        }
    }

    fn with_device<T>(
        slot: &Mutex<Option<HidDevice>>,
        f: impl FnOnce(&HidDevice) -> Result<T, hidapi::HidError>,
    ) -> Result<T, TransportError> {
        let guard = slot.lock();
        let device = guard.as_ref().ok_or(TransportError::Closed)?;
        Ok(f(device)?)
    }
}

impl HidTransport for HidWiredTransport {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        Self::with_device(&self.output, |d| d.write(data))
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError> {
        let slot = if self.has_input { &self.input } else { &self.output };
        Self::with_device(slot, |d| d.read_timeout(buf, timeout_ms))
    }

    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        Self::with_device(&self.output, |d| d.get_feature_report(buf))
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&self) -> Result<(), TransportError> {
        // HidDevice closes on drop
        self.input.lock().take();
        if self.output.lock().take().is_some() {
            debug!("Closed HID device {}", self.info.id());
        }
        Ok(())
    }
}
