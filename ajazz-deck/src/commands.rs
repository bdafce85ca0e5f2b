//! Panel command set
//!
//! Every operation here is one serialized transfer on the flow-control
//! channel: the frame and all payload reports go out under the transmit lock.
//! Retried operations use the channel's retry policy; key image uploads blank
//! their slot before each retry.

use ajazz_transport::protocol::logo;
use ajazz_transport::{
    BatchHeader, ClearSlot, Exit, FlowControlTransport, Hang, LogoHeader, SetLight, SlotTarget,
    Stop, TransportError,
};
use tracing::{debug, info};

use crate::error::DeckError;

/// Typed access to the CRT commands of one session
pub struct CommandSet {
    flow: FlowControlTransport,
}

impl CommandSet {
    pub fn new(flow: FlowControlTransport) -> Self {
        Self { flow }
    }

    /// STP, retried
    pub fn stop(&self) -> Result<(), DeckError> {
        Ok(self.flow.send_retry("stop", &Stop)?)
    }

    /// LIG, retried. `percent` must already be clamped.
    pub fn set_light(&self, percent: u8) -> Result<(), DeckError> {
        debug!("Set light {}%", percent);
        Ok(self.flow.send_retry("set light", &SetLight::new(percent))?)
    }

    /// CLE for one key or every slot, retried
    pub fn clear_slot(&self, target: SlotTarget) -> Result<(), DeckError> {
        debug!("Clear {}", target);
        Ok(self.flow.send_retry("clear slot", &ClearSlot::new(target))?)
    }

    /// CLE "DC": back to the logo screen. Single attempt, used on close.
    pub fn exit(&self) -> Result<(), DeckError> {
        Ok(self.flow.send(&Exit)?)
    }

    /// Standby: CLE "DC" then HAN, retried as a pair
    pub fn hang(&self) -> Result<(), DeckError> {
        self.flow.retry_policy().run("hang", || -> Result<(), TransportError> {
            self.flow.send(&Exit)?;
            self.flow.send(&Hang)
        })?;
        Ok(())
    }

    /// LOG header plus a full raw RGB frame
    pub fn upload_logo(&self, rgb: &[u8]) -> Result<(), DeckError> {
        if rgb.len() != logo::PAYLOAD_LEN {
            return Err(DeckError::InvalidLogoLength {
                expected: logo::PAYLOAD_LEN,
                actual: rgb.len(),
            });
        }
        let header = LogoHeader::new(rgb.len())?;
        self.flow
            .retry_policy()
            .run("upload logo", || self.flow.send_with_payload(&header, rgb))?;
        info!("Uploaded boot logo ({} bytes)", rgb.len());
        Ok(())
    }

    /// BAT header plus encoded image bytes for the key at logical `index`
    ///
    /// A failed attempt may leave part of the image on the panel, so the
    /// same slot is cleared before every retry.
    pub fn upload_key_image(&self, index: u8, data: &[u8]) -> Result<(), DeckError> {
        let header = BatchHeader::for_key(index, data.len())?;
        debug!(
            "Upload key {} -> slot 0x{:02x} ({} bytes)",
            index,
            header.slot,
            data.len()
        );
        self.flow
            .upload_retry("upload key image", &header, data, |flow| {
                flow.send(&ClearSlot::new(SlotTarget::Key(index)))
            })?;
        Ok(())
    }

    /// Firmware version string from feature report 0x01
    pub fn firmware_version(&self) -> Result<String, DeckError> {
        let raw = self.flow.read_firmware_report()?;
        Ok(decode_version(&raw))
    }

    /// Release the HID handle
    pub fn close(&self) -> Result<(), DeckError> {
        Ok(self.flow.close()?)
    }
}

/// Printable text of a firmware report: NUL padding and whitespace trimmed
fn decode_version(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
