//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (info, config)
//! - `set`: commands that change what the panel shows
//! - `read`: key event stream

pub mod query;
pub mod read;
pub mod set;

use std::sync::Arc;

use ajazz_deck::{BoxedTransport, DeckDevice, HidWiredTransport, MockTransport, TransportDeviceInfo};
use ajazz_driver::DriverConfig;
use anyhow::Context;
use hidapi::HidApi;
use tracing::{debug, info};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Open the configured panel and apply the configured power settings.
///
/// With `dry_run` the session runs on an in-memory transport and every frame
/// is logged at debug level instead.
pub fn open_deck(config: &DriverConfig, dry_run: bool) -> anyhow::Result<DeckDevice> {
    let transport: BoxedTransport = if dry_run {
        info!("Dry run, frames are logged instead of sent");
        let mock = MockTransport::with_info(TransportDeviceInfo {
            vid: config.device.vid,
            pid: config.device.pid,
            device_path: "dry-run".into(),
            serial: None,
            product_name: None,
        });
        mock.set_feature_report(b"\x01dry-run".to_vec());
        Arc::new(mock)
    } else {
        let api = HidApi::new().context("Failed to initialize HID API")?;
        let transport = match &config.device.path {
            Some(path) => HidWiredTransport::open_path(&api, path)
                .with_context(|| format!("Failed to open {path}"))?,
            None => HidWiredTransport::open(&api, config.device.vid, config.device.pid)
                .with_context(|| {
                    format!(
                        "No panel at {:04x}:{:04x}",
                        config.device.vid, config.device.pid
                    )
                })?,
        };
        Arc::new(transport)
    };

    let device = DeckDevice::open(transport, config.deck_options()).context("Failed to open panel")?;
    device.set_sleep_fade_duration(config.power.fade_duration());
    if config.power.brightness != device.brightness() {
        debug!("Applying configured brightness {}%", config.power.brightness);
        device.set_brightness(config.power.brightness)?;
    }
    Ok(device)
}

/// Block until Ctrl-C
pub async fn wait_for_ctrl_c() -> CommandResult {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    Ok(())
}
