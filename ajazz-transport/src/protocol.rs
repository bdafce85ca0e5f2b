//! Protocol constants for the Ajazz "CRT" command set

use std::time::Duration;

/// Magic tag at the start of every command frame ("CRT")
pub const MAGIC: [u8; 3] = *b"CRT";

/// Bytes per HID output report, excluding any report ID
pub const REPORT_SIZE: usize = 512;

/// Staging buffer size: one report plus the optional report-ID byte
pub const REPORT_BUFFER_SIZE: usize = REPORT_SIZE + 1;

/// Bytes per HID input report (key scan reports)
pub const INPUT_REPORT_SIZE: usize = 512;

/// Length of the fixed command header; the rest of the frame is zero
pub const HEADER_LEN: usize = 16;

/// Three-byte operation codes (FEA_* equivalents of this panel family)
pub mod opcode {
    /// Stop: commit/refresh, halts the current display activity
    pub const STOP: [u8; 3] = *b"STP";
    /// Light: set backlight brightness
    pub const LIGHT: [u8; 3] = *b"LIG";
    /// Clear: blank one slot, all slots, or return to the logo screen
    pub const CLEAR: [u8; 3] = *b"CLE";
    /// Batch: per-key image upload header
    pub const BATCH: [u8; 3] = *b"BAT";
    /// Logo: full-screen boot logo upload header
    pub const LOGO: [u8; 3] = *b"LOG";
    /// Hang: standby
    pub const HANG: [u8; 3] = *b"HAN";

    /// Get human-readable name for an opcode
    pub fn name(op: [u8; 3]) -> &'static str {
        match op {
            STOP => "STOP",
            LIGHT => "LIGHT",
            CLEAR => "CLEAR",
            BATCH => "BATCH",
            LOGO => "LOGO",
            HANG => "HANG",
            _ => "UNKNOWN",
        }
    }
}

/// Fixed header byte offsets of the command parameters
pub mod offset {
    /// Payload length, big-endian u32 (BAT, LOG)
    pub const PAYLOAD_LEN: usize = 8;
    /// Brightness percent (LIG)
    pub const BRIGHTNESS: usize = 10;
    /// Target slot (CLE)
    pub const CLEAR_TARGET: usize = 11;
    /// Target slot (BAT, LOG)
    pub const BATCH_TARGET: usize = 12;
    /// Scan code of the activated key in an input report
    pub const KEY_SCAN: usize = 9;
}

/// Clear-slot sentinel addressing every slot at once
pub const CLEAR_ALL: u8 = 0xFF;

/// Marker bytes placed at offsets 10..12 of the exit ("DC") clear frame
pub const EXIT_MARKER: [u8; 2] = *b"DC";

/// Boot logo geometry; the payload is raw RGB
pub mod logo {
    pub const WIDTH: usize = 854;
    pub const HEIGHT: usize = 480;
    pub const PAYLOAD_LEN: usize = WIDTH * HEIGHT * 3;
    /// Slot byte the logo header carries at the batch target offset
    pub const SLOT: u8 = 0x01;
}

/// Feature report ID holding the firmware version string
pub const FIRMWARE_REPORT_ID: u8 = 0x01;

/// Brightness ceiling in percent
pub const MAX_BRIGHTNESS: u8 = 100;

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Attempts per command before the last error surfaces
    pub const SEND_ATTEMPTS: u32 = 3;
    /// Interval between brightness steps during a fade (30 steps per second)
    pub const FADE_TICK: Duration = Duration::from_nanos(1_000_000_000 / 30);
    /// Interval at which the idle timer checks for inactivity
    pub const IDLE_TICK: Duration = Duration::from_secs(1);
    /// Input read timeout, bounds how quickly the key reader notices shutdown
    pub const READ_TIMEOUT_MS: i32 = 50;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_length_matches_header_constant() {
        // The LOG header template carries 0x0012C3C0 at offset 8
        assert_eq!(logo::PAYLOAD_LEN, 0x0012_C3C0);
    }

    #[test]
    fn test_opcode_names() {
        assert_eq!(opcode::name(*b"BAT"), "BATCH");
        assert_eq!(opcode::name(*b"XYZ"), "UNKNOWN");
    }
}
