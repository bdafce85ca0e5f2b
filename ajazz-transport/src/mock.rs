//! In-memory transport
//!
//! Records every report written, replays scripted input reports and can be
//! told to fail specific writes. Used by the test suites and by the CLI's
//! dry-run mode, where frames are logged instead of reaching hardware.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::command::FrameHeader;
use crate::error::TransportError;
use crate::types::TransportDeviceInfo;
use crate::HidTransport;

/// Longest a `read_timeout` call idles when no input is queued
const IDLE_READ_CAP_MS: u64 = 5;

#[derive(Default)]
struct MockState {
    writes: Vec<Vec<u8>>,
    write_attempts: usize,
    fail_at: HashSet<usize>,
    write_limit: Option<usize>,
    inputs: VecDeque<Vec<u8>>,
    disconnect_when_drained: bool,
    feature_report: Vec<u8>,
    closed: bool,
}

/// Scriptable `HidTransport` that never touches a device.
pub struct MockTransport {
    info: TransportDeviceInfo,
    state: Mutex<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_info(TransportDeviceInfo {
            vid: 0x0300,
            pid: 0x1001,
            device_path: "mock".into(),
            serial: Some("MOCK0001".into()),
            product_name: Some("Mock panel".into()),
        })
    }

    pub fn with_info(info: TransportDeviceInfo) -> Self {
        Self {
            info,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Reports written successfully, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Every write call, including failed ones
    pub fn write_attempts(&self) -> usize {
        self.state.lock().write_attempts
    }

    pub fn clear_writes(&self) {
        let mut state = self.state.lock();
        state.writes.clear();
        state.write_attempts = 0;
        state.fail_at.clear();
    }

    /// Fail the write calls with these 0-based attempt numbers (counted
    /// from the last `clear_writes`)
    pub fn fail_writes_at(&self, attempts: &[usize]) {
        self.state.lock().fail_at.extend(attempts.iter().copied());
    }

    /// Report at most `limit` bytes written per call
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.lock().write_limit = limit;
    }

    /// Queue an input report for the reader
    pub fn push_input(&self, report: Vec<u8>) {
        self.state.lock().inputs.push_back(report);
    }

    /// Once queued input runs out, reads fail as if the device was unplugged
    pub fn disconnect_when_drained(&self) {
        self.state.lock().disconnect_when_drained = true;
    }

    pub fn pending_inputs(&self) -> usize {
        self.state.lock().inputs.len()
    }

    pub fn set_feature_report(&self, data: Vec<u8>) {
        self.state.lock().feature_report = data;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl HidTransport for MockTransport {
    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let attempt = state.write_attempts;
        state.write_attempts += 1;
        if state.fail_at.contains(&attempt) {
            return Err(TransportError::HidError(format!("injected failure on write {attempt}")));
        }
        if let Some(header) = FrameHeader::parse(data).or_else(|| data.get(1..).and_then(FrameHeader::parse)) {
            debug!("mock write #{}: {}", attempt, header);
        }
        state.writes.push(data.to_vec());
        Ok(state.write_limit.map_or(data.len(), |limit| limit.min(data.len())))
    }

    fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, TransportError> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TransportError::Closed);
            }
            if let Some(report) = state.inputs.pop_front() {
                let n = report.len().min(buf.len());
                buf[..n].copy_from_slice(&report[..n]);
                return Ok(n);
            }
            if state.disconnect_when_drained {
                return Err(TransportError::Disconnected);
            }
        }
        let idle = (timeout_ms.max(0) as u64).min(IDLE_READ_CAP_MS);
        std::thread::sleep(Duration::from_millis(idle));
        Ok(0)
    }

    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let n = state.feature_report.len().min(buf.len());
        buf[..n].copy_from_slice(&state.feature_report[..n]);
        Ok(n)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&self) -> Result<(), TransportError> {
        self.state.lock().closed = true;
        Ok(())
    }
}
