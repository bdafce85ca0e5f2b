//! Flow-control transport layer
//!
//! `FlowControlTransport` wraps a raw `HidTransport` (which only moves single
//! reports) and adds command semantics: frame encoding into the shared
//! transmit buffer, chunked payload streaming, serialization of all outbound
//! traffic, and bounded retries.
//!
//! ```text
//! [HidWired / Mock]            ← implements HidTransport (raw I/O)
//!          |
//! [FlowControlTransport]       ← frames, chunking, lock, retries
//!          |
//!      [DeckDevice]
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::command::{encode_frame, DeckCommand, FrameHeader};
use crate::error::TransportError;
use crate::protocol::{timing, FIRMWARE_REPORT_ID, REPORT_SIZE};
use crate::report::ReportWriter;
use crate::types::ReportMode;
use crate::HidTransport;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded, immediate retry of a fallible operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(timing::SEND_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `op` until it succeeds or the attempts are used up.
    pub fn run<T, E: fmt::Display>(
        &self,
        label: &str,
        op: impl FnMut() -> Result<T, E>,
    ) -> Result<T, E> {
        self.run_with_repair(label, op, |_, _| {})
    }

    /// Like `run`, but calls `repair` before every retry.
    ///
    /// Operations with partial side effects (a half-uploaded image) pass a
    /// repair step that puts the device back into a known state first.
    pub fn run_with_repair<T, E: fmt::Display>(
        &self,
        label: &str,
        mut op: impl FnMut() -> Result<T, E>,
        mut repair: impl FnMut(u32, &E),
    ) -> Result<T, E> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => {
                    warn!("{} failed after {} attempts: {}", label, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} attempt {}/{} failed: {}", label, attempt, self.attempts, e);
                    repair(attempt, &e);
                    attempt += 1;
                }
            }
        }
    }
}

// ============================================================================
// FlowControlTransport
// ============================================================================

/// Session-owned transmit buffers; only touched under the transmit lock.
struct TxBuffers {
    frame: Box<[u8; REPORT_SIZE]>,
    writer: ReportWriter,
}

/// Serialized command channel on top of a raw transport.
pub struct FlowControlTransport {
    inner: Arc<dyn HidTransport>,
    tx: Mutex<TxBuffers>,
    retry: RetryPolicy,
}

impl FlowControlTransport {
    pub fn new(inner: Arc<dyn HidTransport>, mode: ReportMode, retry: RetryPolicy) -> Self {
        Self {
            inner,
            tx: Mutex::new(TxBuffers {
                frame: Box::new([0u8; REPORT_SIZE]),
                writer: ReportWriter::new(mode),
            }),
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Send one command frame, then `payload` as report windows.
    ///
    /// The transmit lock is held for the frame and every payload window, so
    /// no other command can interleave with a multi-report transfer.
    pub fn send_with_payload<C: DeckCommand>(&self, cmd: &C, payload: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.tx.lock();
        let TxBuffers { frame, writer } = &mut *guard;

        encode_frame(cmd, &mut frame[..]);
        if let Some(header) = FrameHeader::parse(&frame[..]) {
            debug!("Sending {} (+{} payload bytes)", header, payload.len());
        }
        writer.send(self.inner.as_ref(), &frame[..])?;

        if !payload.is_empty() {
            let chunks = writer.send(self.inner.as_ref(), payload)?;
            debug!("Streamed {} payload reports", chunks);
        }
        Ok(())
    }

    /// Send one command frame without payload.
    pub fn send<C: DeckCommand>(&self, cmd: &C) -> Result<(), TransportError> {
        self.send_with_payload(cmd, &[])
    }

    /// `send` under the retry policy.
    pub fn send_retry<C: DeckCommand>(&self, label: &str, cmd: &C) -> Result<(), TransportError> {
        self.retry.run(label, || self.send(cmd))
    }

    /// `send_with_payload` under the retry policy, running `repair` before
    /// each retry to undo a partially delivered payload.
    pub fn upload_retry<C: DeckCommand>(
        &self,
        label: &str,
        cmd: &C,
        payload: &[u8],
        mut repair: impl FnMut(&Self) -> Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        self.retry.run_with_repair(
            label,
            || self.send_with_payload(cmd, payload),
            |attempt, _| {
                if let Err(e) = repair(self) {
                    warn!("{} repair before retry {} failed: {}", label, attempt + 1, e);
                }
            },
        )
    }

    /// Read the firmware version feature report.
    ///
    /// Serialized with outbound commands; returns the raw report bytes
    /// after the report ID.
    pub fn read_firmware_report(&self) -> Result<Vec<u8>, TransportError> {
        let _guard = self.tx.lock();
        let mut buf = vec![0u8; REPORT_SIZE];
        buf[0] = FIRMWARE_REPORT_ID;
        let n = self.inner.get_feature_report(&mut buf)?;
        Ok(buf[..n.min(buf.len())].get(1..).unwrap_or_default().to_vec())
    }

    /// Close the raw transport once no command is in flight.
    pub fn close(&self) -> Result<(), TransportError> {
        let _guard = self.tx.lock();
        self.inner.close()
    }
}
