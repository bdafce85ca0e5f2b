//! Chunked report writer
//!
//! Splits a byte stream into fixed 512-byte report windows, zero-pads the
//! last one and hands each to the HID write primitive. A failed or short
//! write stops the transfer; repairing whatever the panel received so far is
//! the caller's job.

use tracing::{debug, trace};

use crate::error::TransportError;
use crate::protocol::{REPORT_BUFFER_SIZE, REPORT_SIZE};
use crate::types::ReportMode;
use crate::HidTransport;

/// Reusable staging buffer for one outgoing report.
pub struct ReportWriter {
    mode: ReportMode,
    staging: Box<[u8; REPORT_BUFFER_SIZE]>,
}

impl ReportWriter {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            staging: Box::new([0u8; REPORT_BUFFER_SIZE]),
        }
    }

    /// Number of reports needed for `len` bytes of data
    pub fn chunk_count(len: usize) -> usize {
        len.div_ceil(REPORT_SIZE)
    }

    /// Stage one window (at most `REPORT_SIZE` bytes) and return the exact
    /// slice to write: report-ID prefix if the mode wants one, data, zeros.
    fn stage(&mut self, window: &[u8]) -> &[u8] {
        debug_assert!(window.len() <= REPORT_SIZE);
        let prefix = self.mode.prefix_len();
        let report = &mut self.staging[..self.mode.report_len()];
        report[..prefix].fill(0);
        report[prefix..prefix + window.len()].copy_from_slice(window);
        report[prefix + window.len()..].fill(0);
        report
    }

    /// Write `data` as consecutive report windows.
    ///
    /// Returns the number of reports written. Empty input writes nothing.
    pub fn send(&mut self, transport: &dyn HidTransport, data: &[u8]) -> Result<usize, TransportError> {
        let total = Self::chunk_count(data.len());
        for (index, window) in data.chunks(REPORT_SIZE).enumerate() {
            let report = self.stage(window);
            let expected = report.len();
            let written = transport.write(report).inspect_err(|e| {
                debug!("Report {}/{} failed: {}", index + 1, total, e);
            })?;
            // Some stacks do not count the report ID, so only the data
            // portion has to be accepted in full.
            if written < REPORT_SIZE {
                return Err(TransportError::ShortWrite { expected, written });
            }
            trace!("Report {}/{} written ({} bytes)", index + 1, total, written);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn test_single_short_payload_is_padded() {
        let mock = MockTransport::new();
        let mut writer = ReportWriter::new(ReportMode::Plain);
        let n = writer.send(&mock, &[1, 2, 3]).unwrap();
        assert_eq!(n, 1);
        let writes = mock.writes();
        assert_eq!(writes[0].len(), 512);
        assert_eq!(&writes[0][..3], &[1, 2, 3]);
        assert!(writes[0][3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_report_id_prefix() {
        let mock = MockTransport::new();
        let mut writer = ReportWriter::new(ReportMode::ReportId);
        writer.send(&mock, &[0x43; 10]).unwrap();
        let writes = mock.writes();
        assert_eq!(writes[0].len(), 513);
        assert_eq!(writes[0][0], 0x00);
        assert_eq!(&writes[0][1..11], &[0x43; 10]);
        assert!(writes[0][11..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_multi_window_split() {
        let mock = MockTransport::new();
        let mut writer = ReportWriter::new(ReportMode::Plain);
        let data: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8 + 1).collect();
        assert_eq!(writer.send(&mock, &data).unwrap(), 3);

        let writes = mock.writes();
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|w| w.len() == 512));
        assert_eq!(&writes[0][..], &data[..512]);
        assert_eq!(&writes[1][..], &data[512..1024]);
        assert_eq!(&writes[2][..276], &data[1024..]);
        assert!(writes[2][276..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_stale_bytes_do_not_leak_between_windows() {
        let mock = MockTransport::new();
        let mut writer = ReportWriter::new(ReportMode::Plain);
        writer.send(&mock, &[0xFF; 512]).unwrap();
        writer.send(&mock, &[0x01]).unwrap();
        let writes = mock.writes();
        assert!(writes[1][1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_failure_aborts_remaining_windows() {
        let mock = MockTransport::new();
        mock.fail_writes_at(&[1]);
        let mut writer = ReportWriter::new(ReportMode::Plain);
        let result = writer.send(&mock, &[0u8; 2000]);
        assert!(result.is_err());
        // First window went out, second failed, rest never attempted
        assert_eq!(mock.writes().len(), 1);
        assert_eq!(mock.write_attempts(), 2);
    }

    #[test]
    fn test_short_write_detected() {
        let mock = MockTransport::new();
        mock.set_write_limit(Some(100));
        let mut writer = ReportWriter::new(ReportMode::Plain);
        let err = writer.send(&mock, &[7u8; 20]).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortWrite {
                expected: 512,
                written: 100
            }
        ));
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(ReportWriter::chunk_count(0), 0);
        assert_eq!(ReportWriter::chunk_count(1), 1);
        assert_eq!(ReportWriter::chunk_count(512), 1);
        assert_eq!(ReportWriter::chunk_count(513), 2);
    }
}
