//! Key event reader
//!
//! The panel only reports that a key was activated, never how long it is
//! held, so every scan report becomes a press immediately followed by a
//! release.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ajazz_transport::protocol::{offset, timing, INPUT_REPORT_SIZE};
use ajazz_transport::{ajazz_to_elgato, BoxedTransport};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace, warn};

use crate::error::DeckError;
use crate::Inner;

/// Buffered key events before the reader thread stalls
pub const KEY_CHANNEL_CAPACITY: usize = 64;

/// Retry interval while the channel is full
const FULL_CHANNEL_BACKOFF: Duration = Duration::from_millis(5);

/// A logical key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    /// 0-based, row-major from the top-left key
    pub index: u8,
    pub pressed: bool,
}

/// Scan code of the activated key, if the report carries one
pub fn decode_scan(report: &[u8]) -> Option<u8> {
    report.get(offset::KEY_SCAN).copied().filter(|&scan| scan != 0)
}

/// Handle to a running reader thread
pub(crate) struct KeyReader {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl KeyReader {
    pub fn spawn(
        inner: Weak<Inner>,
        transport: BoxedTransport,
    ) -> Result<(Self, mpsc::Receiver<KeyEvent>), DeckError> {
        let (tx, rx) = mpsc::channel(KEY_CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("deck-key-reader".into())
            .spawn(move || run_key_reader_loop(transport, inner, tx, shutdown_clone))
            .map_err(|e| DeckError::Spawn("key reader", e))?;

        Ok((Self { shutdown, handle }, rx))
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Ask the thread to exit after its current read
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read scan reports until shutdown, a read error, or the receiver goes away.
///
/// Returning drops `tx`, which closes the consumer's stream. The session is
/// only upgraded for the power bookkeeping of each report.
fn run_key_reader_loop(
    transport: BoxedTransport,
    inner: Weak<Inner>,
    tx: mpsc::Sender<KeyEvent>,
    shutdown: Arc<AtomicBool>,
) {
    debug!("Key reader thread started");
    let mut buf = [0u8; INPUT_REPORT_SIZE];

    while !shutdown.load(Ordering::Acquire) {
        // Short timeout so the shutdown flag is seen while idle
        let len = match transport.read_timeout(&mut buf, timing::READ_TIMEOUT_MS) {
            Ok(0) => continue,
            Ok(len) => len,
            Err(e) => {
                warn!("Key reader stopped: {}", e);
                break;
            }
        };
        trace!("Input report ({} bytes): {:02X?}", len, &buf[..len.min(16)]);

        let Some(inner) = inner.upgrade() else {
            break;
        };

        // A key press while asleep only wakes the panel
        if inner.power.note_activity() {
            debug!("Key activity while asleep, waking");
            if let Err(e) = inner.wake() {
                warn!("Wake on key press failed: {}", e);
            }
            continue;
        }

        drop(inner);

        let Some(scan) = decode_scan(&buf[..len]) else {
            continue;
        };
        let index = ajazz_to_elgato(scan);
        debug!("Key scan 0x{:02x} -> key {}", scan, index);

        for pressed in [true, false] {
            if !deliver(&tx, KeyEvent { index, pressed }, &shutdown) {
                debug!("Key reader thread exiting");
                return;
            }
        }
    }

    debug!("Key reader thread exiting");
}

/// Queue one event, waiting while the channel is full.
///
/// Returns `false` once the receiver is gone or shutdown was requested, so
/// an undrained stream cannot keep the thread alive past `close`.
fn deliver(tx: &mpsc::Sender<KeyEvent>, mut event: KeyEvent, shutdown: &AtomicBool) -> bool {
    loop {
        match tx.try_send(event) {
            Ok(()) => return true,
            Err(TrySendError::Closed(_)) => {
                debug!("Key event receiver dropped");
                return false;
            }
            Err(TrySendError::Full(pending)) => {
                if shutdown.load(Ordering::Acquire) {
                    debug!("Shutdown with a full key channel, dropping events");
                    return false;
                }
                event = pending;
                thread::sleep(FULL_CHANNEL_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scan() {
        let mut report = [0u8; 512];
        assert_eq!(decode_scan(&report), None);
        report[9] = 0x0d;
        assert_eq!(decode_scan(&report), Some(0x0d));
        assert_eq!(decode_scan(&report[..9]), None);
    }

    #[test]
    fn test_event_serializes_for_json_output() {
        let event = KeyEvent {
            index: 4,
            pressed: true,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"index":4,"pressed":true}"#
        );
    }
}
