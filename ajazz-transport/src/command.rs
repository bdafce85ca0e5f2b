//! Type-safe command frame builders
//!
//! Every command is a 16-byte header (magic, two reserved bytes, opcode,
//! eight parameter bytes) at the start of an otherwise zero report. The
//! header template is copied first, then only the parameter offsets a command
//! owns are overwritten. Payloads (images, logo) never live in the frame;
//! they follow as separate report windows.

use std::fmt;

use zerocopy::byteorder::big_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::TransportError;
use crate::keymap;
use crate::protocol::{logo, offset, opcode, CLEAR_ALL, EXIT_MARKER, HEADER_LEN, MAGIC};

// =============================================================================
// Core Trait
// =============================================================================

/// A command that can be serialized into a frame buffer
pub trait DeckCommand {
    /// Three-byte operation code
    const OPCODE: [u8; 3];

    /// Parameter bytes 8..16 before any parameter is applied
    const TEMPLATE: [u8; 8] = [0; 8];

    /// Overwrite the parameter offsets this command owns
    fn apply_params(&self, _frame: &mut [u8]) {}

    /// Full 16-byte header template
    fn header() -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[..3].copy_from_slice(&MAGIC);
        header[5..8].copy_from_slice(&Self::OPCODE);
        header[8..].copy_from_slice(&Self::TEMPLATE);
        header
    }
}

/// Encode `cmd` into `frame`: zero-fill, copy the header, apply parameters.
///
/// Returns the number of meaningful header bytes. `frame` must hold at least
/// `HEADER_LEN` bytes; the caller's report buffer is always larger.
pub fn encode_frame<C: DeckCommand>(cmd: &C, frame: &mut [u8]) -> usize {
    frame.fill(0);
    frame[..HEADER_LEN].copy_from_slice(&C::header());
    cmd.apply_params(frame);
    HEADER_LEN
}

// =============================================================================
// Commands
// =============================================================================

/// STP: halt display activity / commit pending images
#[derive(Debug, Clone, Copy, Default)]
pub struct Stop;

impl DeckCommand for Stop {
    const OPCODE: [u8; 3] = opcode::STOP;
}

/// LIG: set backlight brightness (percent, already clamped by the caller)
#[derive(Debug, Clone, Copy)]
pub struct SetLight {
    pub percent: u8,
}

impl SetLight {
    pub fn new(percent: u8) -> Self {
        Self { percent }
    }
}

impl DeckCommand for SetLight {
    const OPCODE: [u8; 3] = opcode::LIGHT;

    fn apply_params(&self, frame: &mut [u8]) {
        frame[offset::BRIGHTNESS] = self.percent;
    }
}

/// Which slot a clear command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    /// Every slot (wire sentinel 0xFF)
    All,
    /// One key, by 0-based logical index
    Key(u8),
}

impl SlotTarget {
    /// Wire byte: the sentinel, or the physical slot of the key
    pub fn wire_slot(self) -> u8 {
        match self {
            SlotTarget::All => CLEAR_ALL,
            SlotTarget::Key(index) => keymap::elgato_to_ajazz(index),
        }
    }
}

impl fmt::Display for SlotTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotTarget::All => f.write_str("all"),
            SlotTarget::Key(index) => write!(f, "key {index}"),
        }
    }
}

/// CLE: blank one slot or all slots
#[derive(Debug, Clone, Copy)]
pub struct ClearSlot {
    pub target: SlotTarget,
}

impl ClearSlot {
    pub fn new(target: SlotTarget) -> Self {
        Self { target }
    }

    pub fn all() -> Self {
        Self::new(SlotTarget::All)
    }
}

impl DeckCommand for ClearSlot {
    const OPCODE: [u8; 3] = opcode::CLEAR;
    const TEMPLATE: [u8; 8] = [0x00, 0x00, 0x00, CLEAR_ALL, 0x00, 0x00, 0x00, 0x00];

    fn apply_params(&self, frame: &mut [u8]) {
        frame[offset::CLEAR_TARGET] = self.target.wire_slot();
    }
}

/// CLE "DC": leave host control and show the idle/logo screen
#[derive(Debug, Clone, Copy, Default)]
pub struct Exit;

impl DeckCommand for Exit {
    const OPCODE: [u8; 3] = opcode::CLEAR;
    const TEMPLATE: [u8; 8] = [0x00, 0x00, EXIT_MARKER[0], EXIT_MARKER[1], 0x00, 0x00, 0x00, 0x00];
}

/// HAN: standby, sent after `Exit`
#[derive(Debug, Clone, Copy, Default)]
pub struct Hang;

impl DeckCommand for Hang {
    const OPCODE: [u8; 3] = opcode::HANG;
}

/// Payload length as carried in the big-endian header field
fn checked_len(len: usize) -> Result<u32, TransportError> {
    u32::try_from(len).map_err(|_| TransportError::PayloadTooLarge { len })
}

/// LOG: boot logo header; the raw RGB payload follows
#[derive(Debug, Clone, Copy)]
pub struct LogoHeader {
    pub len: u32,
}

impl LogoHeader {
    pub fn new(len: usize) -> Result<Self, TransportError> {
        Ok(Self {
            len: checked_len(len)?,
        })
    }
}

impl DeckCommand for LogoHeader {
    const OPCODE: [u8; 3] = opcode::LOGO;
    const TEMPLATE: [u8; 8] = [0x00, 0x12, 0xC3, 0xC0, logo::SLOT, 0x00, 0x00, 0x00];

    fn apply_params(&self, frame: &mut [u8]) {
        frame[offset::PAYLOAD_LEN..offset::PAYLOAD_LEN + 4].copy_from_slice(&self.len.to_be_bytes());
    }
}

/// BAT: per-key image header; the encoded image follows
#[derive(Debug, Clone, Copy)]
pub struct BatchHeader {
    /// Physical slot (already translated)
    pub slot: u8,
    pub len: u32,
}

impl BatchHeader {
    /// Header for the key at 0-based logical `index`.
    ///
    /// The panel addresses images by 1-based key number, so `index + 1` goes
    /// through the key-number view of the table.
    pub fn for_key(index: u8, len: usize) -> Result<Self, TransportError> {
        Ok(Self {
            slot: keymap::key_number_to_slot(index.saturating_add(1)),
            len: checked_len(len)?,
        })
    }
}

impl DeckCommand for BatchHeader {
    const OPCODE: [u8; 3] = opcode::BATCH;
    const TEMPLATE: [u8; 8] = [0x00, 0x00, 0x0C, 0x48, 0x0D, 0x00, 0x00, 0x00];

    fn apply_params(&self, frame: &mut [u8]) {
        frame[offset::PAYLOAD_LEN..offset::PAYLOAD_LEN + 4].copy_from_slice(&self.len.to_be_bytes());
        frame[offset::BATCH_TARGET] = self.slot;
    }
}

// =============================================================================
// Frame decoding (logging and tests)
// =============================================================================

/// Zero-copy view of an encoded frame header.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FrameHeader {
    pub magic: [u8; 3],
    _reserved: [u8; 2],
    pub opcode: [u8; 3],
    /// Big-endian length for BAT/LOG, parameter bytes otherwise
    pub len: U32,
    pub params: [u8; 4],
}

impl FrameHeader {
    /// Borrow the header at the start of `frame`, if it is a command frame.
    pub fn parse(frame: &[u8]) -> Option<&FrameHeader> {
        let (header, _) = FrameHeader::ref_from_prefix(frame).ok()?;
        (header.magic == MAGIC).then_some(header)
    }

    pub fn opcode_name(&self) -> &'static str {
        opcode::name(self.opcode)
    }

    /// Brightness byte (LIG)
    pub fn brightness(&self) -> u8 {
        self.len.as_bytes()[offset::BRIGHTNESS - offset::PAYLOAD_LEN]
    }

    /// Target slot byte (CLE)
    pub fn clear_target(&self) -> u8 {
        self.len.as_bytes()[offset::CLEAR_TARGET - offset::PAYLOAD_LEN]
    }

    /// Target slot byte (BAT/LOG)
    pub fn batch_target(&self) -> u8 {
        self.params[offset::BATCH_TARGET - offset::PAYLOAD_LEN - 4]
    }

    /// Payload length (BAT/LOG)
    pub fn payload_len(&self) -> u32 {
        self.len.get()
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02X?}", self.opcode_name(), &self.as_bytes()[8..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::REPORT_SIZE;

    fn encode<C: DeckCommand>(cmd: &C) -> Vec<u8> {
        let mut frame = vec![0xAAu8; REPORT_SIZE];
        encode_frame(cmd, &mut frame);
        frame
    }

    #[test]
    fn test_stop_frame() {
        let frame = encode(&Stop);
        assert_eq!(&frame[..8], &[0x43, 0x52, 0x54, 0x00, 0x00, 0x53, 0x54, 0x50]);
        assert!(frame[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_light_frame() {
        let frame = encode(&SetLight::new(55));
        assert_eq!(&frame[5..8], b"LIG");
        assert_eq!(frame[10], 55);
        assert_eq!(frame[9], 0);
        assert_eq!(frame[11], 0);
    }

    #[test]
    fn test_clear_all_frame() {
        let frame = encode(&ClearSlot::all());
        assert_eq!(
            &frame[..HEADER_LEN],
            &[0x43, 0x52, 0x54, 0x00, 0x00, 0x43, 0x4c, 0x45, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_clear_key_translates_index() {
        let frame = encode(&ClearSlot::new(SlotTarget::Key(0)));
        assert_eq!(frame[11], 0x0d);
    }

    #[test]
    fn test_exit_frame() {
        let frame = encode(&Exit);
        assert_eq!(
            &frame[..HEADER_LEN],
            &[0x43, 0x52, 0x54, 0x00, 0x00, 0x43, 0x4c, 0x45, 0x00, 0x00, 0x44, 0x43, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_logo_header_matches_template() {
        let frame = encode(&LogoHeader::new(logo::PAYLOAD_LEN).unwrap());
        assert_eq!(
            &frame[..HEADER_LEN],
            &[0x43, 0x52, 0x54, 0x00, 0x00, 0x4c, 0x4f, 0x47, 0x00, 0x12, 0xc3, 0xc0, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_batch_header() {
        let frame = encode(&BatchHeader::for_key(0, 0x1234).unwrap());
        assert_eq!(&frame[5..8], b"BAT");
        assert_eq!(&frame[8..12], &[0x00, 0x00, 0x12, 0x34]);
        assert_eq!(frame[12], keymap::elgato_to_ajazz(0));
        assert!(frame[13..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_header_view() {
        let frame = encode(&BatchHeader::for_key(5, 4000).unwrap());
        let header = FrameHeader::parse(&frame).unwrap();
        assert_eq!(header.opcode_name(), "BATCH");
        assert_eq!(header.payload_len(), 4000);
        assert_eq!(header.batch_target(), keymap::elgato_to_ajazz(5));

        let frame = encode(&SetLight::new(42));
        assert_eq!(FrameHeader::parse(&frame).unwrap().brightness(), 42);

        assert!(FrameHeader::parse(&[0u8; 16]).is_none());
        assert!(FrameHeader::parse(&[0x43, 0x52]).is_none());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_payload_is_rejected() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(
            BatchHeader::for_key(0, len),
            Err(TransportError::PayloadTooLarge { len: l }) if l == len
        ));
        assert!(matches!(
            LogoHeader::new(len),
            Err(TransportError::PayloadTooLarge { .. })
        ));
        assert_eq!(BatchHeader::for_key(0, u32::MAX as usize).unwrap().len, u32::MAX);
    }
}
