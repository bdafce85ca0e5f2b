//! Device session for Ajazz AKP153-class key panels
//!
//! `DeckDevice` is the one session object per physical panel. It owns the
//! serialized command channel, the sleep/wake/brightness state and the two
//! background threads (key reader, idle timer), and exposes the typed panel
//! API on top of any `HidTransport`.

pub mod codec;
pub mod commands;
pub mod error;
pub mod info;
pub mod keys;

mod power;

pub use codec::{ImageCodec, ImageTransform, JpegCodec};
pub use commands::CommandSet;
pub use error::DeckError;
pub use info::{PanelInfo, PanelModel};
pub use keys::KeyEvent;

// Re-exported so consumers need only this crate for the common types
pub use ajazz_transport::{
    BoxedTransport, HidTransport, HidWiredTransport, MockTransport, ReportMode, RetryPolicy,
    SlotTarget, TransportDeviceInfo, TransportError,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ajazz_transport::protocol::{logo, timing, MAX_BRIGHTNESS};
use ajazz_transport::FlowControlTransport;
use image::{DynamicImage, GenericImageView};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::keys::KeyReader;
use crate::power::{IdleTimer, PowerState};

/// State shared with the background threads
pub(crate) struct Inner {
    pub(crate) commands: CommandSet,
    pub(crate) power: PowerState,
}

/// Session parameters
pub struct DeckOptions {
    pub panel: PanelInfo,
    pub report_mode: ReportMode,
    pub retry: RetryPolicy,
    pub codec: Box<dyn ImageCodec>,
    /// Interval between fade steps
    pub fade_tick: Duration,
    /// Interval at which the idle timer checks for inactivity
    pub idle_tick: Duration,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            panel: PanelInfo::default(),
            report_mode: ReportMode::native(),
            retry: RetryPolicy::default(),
            codec: Box::new(JpegCodec::default()),
            fade_tick: timing::FADE_TICK,
            idle_tick: timing::IDLE_TICK,
        }
    }
}

/// An open panel session
///
/// Dropping the session closes it.
pub struct DeckDevice {
    inner: Arc<Inner>,
    transport: BoxedTransport,
    id: String,
    serial: String,
    panel: PanelInfo,
    codec: Box<dyn ImageCodec>,
    idle_tick: Duration,
    idle_timer: Mutex<Option<IdleTimer>>,
    reader: Mutex<Option<KeyReader>>,
    closed: AtomicBool,
}

impl DeckDevice {
    /// Open a session and put the panel into a known state.
    ///
    /// Reads the firmware version, then sends stop, full brightness and
    /// clear-all (each retried).
    pub fn open(transport: BoxedTransport, options: DeckOptions) -> Result<Self, DeckError> {
        let info = transport.device_info().clone();
        let flow = FlowControlTransport::new(transport.clone(), options.report_mode, options.retry);
        let commands = CommandSet::new(flow);

        let version = commands.firmware_version()?;
        info!("Firmware version: {}", version);

        commands.stop()?;
        commands.set_light(MAX_BRIGHTNESS)?;
        commands.clear_slot(SlotTarget::All)?;

        let device = Self {
            inner: Arc::new(Inner {
                commands,
                power: PowerState::new(MAX_BRIGHTNESS, options.fade_tick),
            }),
            transport,
            id: info.id(),
            serial: info.serial.clone().unwrap_or_default(),
            panel: options.panel,
            codec: options.codec,
            idle_tick: options.idle_tick,
            idle_timer: Mutex::new(None),
            reader: Mutex::new(None),
            closed: AtomicBool::new(false),
        };
        info!(
            "Opened panel {} ({}x{}, {} keys)",
            device.id, device.panel.columns, device.panel.rows, device.panel.keys
        );
        Ok(device)
    }

    /// Stop background work, return the panel to its logo screen and release
    /// the HID handle. Later calls do nothing.
    pub fn close(&self) -> Result<(), DeckError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(timer) = self.idle_timer.lock().take() {
            timer.cancel();
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.stop();
        }

        let exit = self.inner.commands.exit();
        if let Err(e) = &exit {
            warn!("Exit command failed: {}", e);
        }
        self.inner.commands.close()?;
        info!("Closed panel {}", self.id);
        exit
    }

    /// Raw command access (clear a single slot, stop, ...)
    pub fn commands(&self) -> &CommandSet {
        &self.inner.commands
    }

    pub fn firmware_version(&self) -> Result<String, DeckError> {
        self.inner.commands.firmware_version()
    }

    /// Stop, full brightness, clear every slot
    pub fn reset(&self) -> Result<(), DeckError> {
        self.inner.commands.stop()?;
        self.inner.commands.set_light(MAX_BRIGHTNESS)?;
        self.inner.commands.clear_slot(SlotTarget::All)
    }

    /// Black image on every key
    pub fn clear(&self) -> Result<(), DeckError> {
        let black = codec::black(self.panel.pixels);
        for index in 0..self.panel.keys {
            self.set_image(index, &black)?;
        }
        Ok(())
    }

    /// Commit pending images
    pub fn flush(&self) -> Result<(), DeckError> {
        self.inner.commands.stop()
    }

    /// Standby until the next host session
    pub fn hang(&self) -> Result<(), DeckError> {
        self.inner.commands.hang()
    }

    // === Key events ===

    /// Start the key reader and return its event stream.
    ///
    /// The stream ends when the panel disconnects or the session closes.
    pub fn read_keys(&self) -> Result<mpsc::Receiver<KeyEvent>, DeckError> {
        let mut reader = self.reader.lock();
        if reader.as_ref().is_some_and(KeyReader::is_running) {
            return Err(DeckError::ReaderAlreadyRunning);
        }
        let (handle, rx) = KeyReader::spawn(Arc::downgrade(&self.inner), self.transport.clone())?;
        *reader = Some(handle);
        Ok(rx)
    }

    // === Power ===

    /// Fade to dark; the next key press wakes the panel
    pub fn sleep(&self) -> Result<(), DeckError> {
        self.inner.sleep()
    }

    pub fn wake(&self) -> Result<(), DeckError> {
        self.inner.wake()
    }

    pub fn asleep(&self) -> bool {
        self.inner.power.asleep()
    }

    /// Fade length used by sleep and wake (zero switches instantly)
    pub fn set_sleep_fade_duration(&self, duration: Duration) {
        self.inner.power.set_fade_duration(duration);
    }

    /// Sleep after `timeout` without key activity; zero disables.
    ///
    /// Replaces any previous timeout.
    pub fn set_sleep_timeout(&self, timeout: Duration) -> Result<(), DeckError> {
        let mut timer = self.idle_timer.lock();
        if let Some(previous) = timer.take() {
            previous.cancel();
        }
        if timeout.is_zero() {
            debug!("Idle timer disabled");
            return Ok(());
        }
        *timer = Some(IdleTimer::start(
            Arc::downgrade(&self.inner),
            timeout,
            self.idle_tick,
        )?);
        Ok(())
    }

    pub fn fade(&self, start: u8, end: u8, duration: Duration) -> Result<(), DeckError> {
        self.inner.fade(start, end, duration)
    }

    /// Set brightness in percent, clamped to 100.
    ///
    /// While asleep the level is remembered for wake and the panel stays dark.
    pub fn set_brightness(&self, percent: u8) -> Result<(), DeckError> {
        self.inner.set_brightness(percent)
    }

    pub fn brightness(&self) -> u8 {
        self.inner.power.brightness()
    }

    // === Images ===

    /// Show `image` on the key at logical `index` (0 is top-left).
    ///
    /// The image must already be `pixels` x `pixels`.
    pub fn set_image(&self, index: u8, image: &DynamicImage) -> Result<(), DeckError> {
        self.check_key(index)?;
        let (width, height) = image.dimensions();
        if width != self.panel.pixels || height != self.panel.pixels {
            return Err(DeckError::InvalidImageSize {
                expected: self.panel.pixels,
                width,
                height,
            });
        }
        let data = self.codec.encode(&self.codec.flip(image))?;
        self.inner.commands.upload_key_image(index, &data)
    }

    /// Upload pre-encoded image bytes for the key at logical `index`
    pub fn set_key_image_bytes(&self, index: u8, data: &[u8]) -> Result<(), DeckError> {
        self.check_key(index)?;
        self.inner.commands.upload_key_image(index, data)
    }

    /// Replace the boot logo with a raw 854x480 RGB frame
    pub fn set_logo(&self, rgb: &[u8]) -> Result<(), DeckError> {
        self.inner.commands.upload_logo(rgb)
    }

    fn check_key(&self, index: u8) -> Result<(), DeckError> {
        if index >= self.panel.keys {
            return Err(DeckError::InvalidKey {
                index,
                keys: self.panel.keys,
            });
        }
        Ok(())
    }

    // === Geometry ===

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn keys(&self) -> u8 {
        self.panel.keys
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pixels(&self) -> u32 {
        self.panel.pixels
    }

    pub fn dpi(&self) -> u32 {
        self.panel.dpi
    }

    pub fn padding(&self) -> u32 {
        self.panel.padding
    }

    pub fn columns(&self) -> u8 {
        self.panel.columns
    }

    pub fn rows(&self) -> u8 {
        self.panel.rows
    }

    /// Logo screen size in pixels
    pub fn logo_size(&self) -> (u32, u32) {
        (logo::WIDTH as u32, logo::HEIGHT as u32)
    }
}

impl Drop for DeckDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Closing panel {} on drop: {}", self.id, e);
        }
    }
}
