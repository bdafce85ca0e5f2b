//! Sleep, wake and brightness
//!
//! The asleep flag and the last-activity instant live under one `RwLock` so
//! a reader never pairs a fresh flag with a stale timestamp. `sleep` and
//! `wake` hold its write lock for the whole fade. Brightness levels sit
//! behind their own mutex, which is never held across I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use ajazz_transport::protocol::MAX_BRIGHTNESS;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::DeckError;
use crate::Inner;

pub(crate) struct SleepState {
    pub asleep: bool,
    pub last_activity: Instant,
}

struct Levels {
    current: u8,
    /// Restored on wake
    pre_sleep: u8,
}

pub(crate) struct PowerState {
    sleep: RwLock<SleepState>,
    levels: Mutex<Levels>,
    fade_duration: Mutex<Duration>,
    fade_tick: Duration,
}

impl PowerState {
    pub fn new(brightness: u8, fade_tick: Duration) -> Self {
        Self {
            sleep: RwLock::new(SleepState {
                asleep: false,
                last_activity: Instant::now(),
            }),
            levels: Mutex::new(Levels {
                current: brightness,
                pre_sleep: brightness,
            }),
            fade_duration: Mutex::new(Duration::ZERO),
            fade_tick,
        }
    }

    pub fn asleep(&self) -> bool {
        self.sleep.read().asleep
    }

    pub fn set_fade_duration(&self, duration: Duration) {
        *self.fade_duration.lock() = duration;
    }

    pub fn fade_duration(&self) -> Duration {
        *self.fade_duration.lock()
    }

    /// Current brightness; waits out a running sleep/wake fade
    pub fn brightness(&self) -> u8 {
        let _state = self.sleep.read();
        self.levels.lock().current
    }

    /// Record key activity.
    ///
    /// Returns `true` when the panel is asleep; the activity clock is left
    /// alone and the caller is expected to wake the panel instead.
    pub fn note_activity(&self) -> bool {
        let mut state = self.sleep.write();
        if state.asleep {
            return true;
        }
        state.last_activity = Instant::now();
        false
    }

}

impl Inner {
    /// Fade to dark and enter the asleep state. No-op when already asleep.
    pub(crate) fn sleep(&self) -> Result<(), DeckError> {
        let mut state = self.power.sleep.write();
        if state.asleep {
            debug!("Sleep requested while asleep");
            return Ok(());
        }
        self.enter_sleep(&mut state)
    }

    /// Sleep only if awake with no activity for at least `timeout`.
    ///
    /// The idle check and the transition share one write lock. Returns
    /// whether the panel went to sleep.
    pub(crate) fn sleep_if_idle(&self, timeout: Duration) -> Result<bool, DeckError> {
        let mut state = self.power.sleep.write();
        if state.asleep || state.last_activity.elapsed() < timeout {
            return Ok(false);
        }
        debug!("Idle for {:?}, sleeping", timeout);
        self.enter_sleep(&mut state)?;
        Ok(true)
    }

    fn enter_sleep(&self, state: &mut SleepState) -> Result<(), DeckError> {
        let current = {
            let mut levels = self.power.levels.lock();
            levels.pre_sleep = levels.current;
            levels.current
        };
        self.fade_steps(current, 0, self.power.fade_duration(), false)?;

        state.asleep = true;
        info!("Panel asleep (was {}%)", current);
        self.apply_brightness(0, true)
    }

    /// Leave the asleep state and fade back to the remembered brightness.
    /// No-op when awake.
    pub(crate) fn wake(&self) -> Result<(), DeckError> {
        let mut state = self.power.sleep.write();
        if !state.asleep {
            debug!("Wake requested while awake");
            return Ok(());
        }

        state.asleep = false;
        let target = self.power.levels.lock().pre_sleep;
        self.fade_steps(0, target, self.power.fade_duration(), false)?;

        state.last_activity = Instant::now();
        info!("Panel awake ({}%)", target);
        self.apply_brightness(target, false)
    }

    pub(crate) fn set_brightness(&self, percent: u8) -> Result<(), DeckError> {
        let state = self.power.sleep.read();
        self.apply_brightness(percent, state.asleep)
    }

    pub(crate) fn fade(&self, start: u8, end: u8, duration: Duration) -> Result<(), DeckError> {
        let state = self.power.sleep.read();
        self.fade_steps(start, end, duration, state.asleep)
    }

    /// Brightness change with the asleep flag already read by the caller.
    ///
    /// While asleep a non-zero level only becomes the level restored on
    /// wake; the panel stays dark.
    fn apply_brightness(&self, percent: u8, asleep: bool) -> Result<(), DeckError> {
        let percent = percent.min(MAX_BRIGHTNESS);
        {
            let mut levels = self.power.levels.lock();
            levels.current = percent;
            if asleep && percent > 0 {
                levels.pre_sleep = percent;
                debug!("Asleep, deferring brightness {}%", percent);
                return Ok(());
            }
        }
        self.commands.set_light(percent)
    }

    /// Linear fade, one brightness step per tick.
    ///
    /// The step count is the whole number of ticks in `duration`; a fade
    /// shorter than one tick does nothing. Stops once the level reaches or
    /// passes `end`.
    fn fade_steps(&self, start: u8, end: u8, duration: Duration, asleep: bool) -> Result<(), DeckError> {
        let tick = self.power.fade_tick;
        let ticks = duration.as_nanos() / tick.as_nanos().max(1);
        let step = (f64::from(end) - f64::from(start)) / ticks as f64;
        if !step.is_finite() {
            return Ok(());
        }

        let (start, end) = (i32::from(start), i32::from(end));
        let mut current = f64::from(start);
        loop {
            let level = current as i32;
            let moving = (start < end && level < end) || (start > end && level > end);
            if !moving {
                break;
            }
            self.apply_brightness(level.clamp(0, i32::from(MAX_BRIGHTNESS)) as u8, asleep)?;
            thread::sleep(tick);
            current += step;
        }
        Ok(())
    }
}

// ============================================================================
// Idle timer
// ============================================================================

/// Background thread that puts the panel to sleep after inactivity
pub(crate) struct IdleTimer {
    cancel: Arc<AtomicBool>,
}

impl IdleTimer {
    pub fn start(inner: Weak<Inner>, timeout: Duration, tick: Duration) -> Result<Self, DeckError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel.clone();

        thread::Builder::new()
            .name("deck-idle-timer".into())
            .spawn(move || run_idle_loop(inner, timeout, tick, cancel_clone))
            .map_err(|e| DeckError::Spawn("idle timer", e))?;

        debug!("Idle timer started ({:?})", timeout);
        Ok(Self { cancel })
    }

    /// Stop at the next tick; a sleep already in progress completes
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_idle_loop(inner: Weak<Inner>, timeout: Duration, tick: Duration, cancel: Arc<AtomicBool>) {
    loop {
        thread::sleep(tick);
        if cancel.load(Ordering::Acquire) {
            break;
        }
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if let Err(e) = inner.sleep_if_idle(timeout) {
            warn!("Idle sleep failed: {}", e);
        }
    }
    debug!("Idle timer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandSet;
    use ajazz_transport::{FlowControlTransport, FrameHeader, MockTransport, ReportMode, RetryPolicy};

    fn inner(mock: &Arc<MockTransport>) -> Inner {
        let flow = FlowControlTransport::new(mock.clone(), ReportMode::Plain, RetryPolicy::default());
        Inner {
            commands: CommandSet::new(flow),
            power: PowerState::new(MAX_BRIGHTNESS, Duration::from_millis(1)),
        }
    }

    #[test]
    fn test_recent_activity_blocks_idle_sleep() {
        let mock = Arc::new(MockTransport::new());
        let inner = inner(&mock);

        assert!(!inner.power.note_activity());
        assert!(!inner.sleep_if_idle(Duration::from_secs(60)).unwrap());
        assert!(!inner.power.asleep());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_idle_sleep_goes_dark_once() {
        let mock = Arc::new(MockTransport::new());
        let inner = inner(&mock);

        assert!(inner.sleep_if_idle(Duration::ZERO).unwrap());
        assert!(inner.power.asleep());
        let header = mock.writes().last().and_then(|w| FrameHeader::parse(w).map(|h| h.brightness()));
        assert_eq!(header, Some(0));

        mock.clear_writes();
        assert!(!inner.sleep_if_idle(Duration::ZERO).unwrap());
        assert!(mock.writes().is_empty());
    }
}
