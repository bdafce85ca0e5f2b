//! Key event stream command.

use ajazz_deck::KeyEvent;
use ajazz_driver::DriverConfig;
use tracing::info;

use super::{open_deck, CommandResult};

fn format_event(event: &KeyEvent, json: bool) -> anyhow::Result<String> {
    if json {
        Ok(serde_json::to_string(event)?)
    } else {
        Ok(format!("Key {}: {}", event.index, event.pressed))
    }
}

/// Print key events until Ctrl-C or until the panel goes away.
///
/// The configured sleep timeout applies while reading; a key press wakes
/// the panel without being printed.
pub async fn read(config: &DriverConfig, dry_run: bool, json: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.set_sleep_timeout(config.power.sleep_timeout())?;
    let mut events = device.read_keys()?;
    info!("Reading keys from {}, Ctrl-C to stop", device.id());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => println!("{}", format_event(&event, json)?),
                None => {
                    eprintln!("Panel disconnected.");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}
