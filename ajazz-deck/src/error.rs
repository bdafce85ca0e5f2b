//! Device session error types

use ajazz_transport::TransportError;
use thiserror::Error;

/// Errors from panel operations
#[derive(Error, Debug)]
pub enum DeckError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Image does not match the panel's key resolution
    #[error("Image has wrong dimensions: expected {expected}x{expected}, got {width}x{height}")]
    InvalidImageSize { expected: u32, width: u32, height: u32 },

    /// Logo payload is not a full raw RGB frame
    #[error("Logo payload must be exactly {expected} bytes, got {actual}")]
    InvalidLogoLength { expected: usize, actual: usize },

    /// Key index outside the panel
    #[error("Invalid key index {index} (panel has {keys} keys)")]
    InvalidKey { index: u8, keys: u8 },

    /// Image could not be converted to the wire format
    #[error("Cannot convert image data: {0}")]
    Codec(#[from] image::ImageError),

    /// `read_keys` called while a reader is still running
    #[error("Key reader already running")]
    ReaderAlreadyRunning,

    /// Background thread could not be started
    #[error("Failed to spawn {0} thread: {1}")]
    Spawn(&'static str, #[source] std::io::Error),
}

impl DeckError {
    /// Caller mistakes, detected before any I/O and never retried
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DeckError::InvalidImageSize { .. }
                | DeckError::InvalidLogoLength { .. }
                | DeckError::InvalidKey { .. }
                | DeckError::Transport(TransportError::PayloadTooLarge { .. })
        )
    }
}
