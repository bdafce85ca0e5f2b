//! Set command handlers.

use std::path::Path;

use ajazz_deck::codec;
use ajazz_driver::DriverConfig;
use anyhow::Context;

use super::{open_deck, wait_for_ctrl_c, CommandResult};

pub fn reset(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.reset()?;
    println!("Panel reset.");
    Ok(())
}

pub fn clear(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.clear()?;
    device.flush()?;
    println!("Cleared {} keys.", device.keys());
    Ok(())
}

pub fn brightness(config: &DriverConfig, dry_run: bool, percent: u8) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.set_brightness(percent)?;
    println!("Brightness set to {}%", device.brightness());
    Ok(())
}

/// Show an image on one key until Ctrl-C; closing the session returns the
/// panel to its logo screen.
pub async fn image(config: &DriverConfig, dry_run: bool, key: u8, file: &Path) -> CommandResult {
    let img = image::open(file).with_context(|| format!("Failed to open image {}", file.display()))?;
    let device = open_deck(config, dry_run)?;
    let fitted = codec::fit_key(&img, device.pixels());
    device.set_image(key, &fitted)?;
    device.flush()?;
    println!("Showing {} on key {key}. Press Ctrl-C to exit.", file.display());
    wait_for_ctrl_c().await
}

pub fn logo(config: &DriverConfig, dry_run: bool, file: &Path) -> CommandResult {
    let img = image::open(file).with_context(|| format!("Failed to open image {}", file.display()))?;
    let device = open_deck(config, dry_run)?;
    let (width, height) = device.logo_size();
    device.set_logo(&codec::logo_rgb(&img, width, height))?;
    device.flush()?;
    println!("Boot logo replaced with {}.", file.display());
    Ok(())
}

pub fn standby(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.hang()?;
    println!("Panel in standby.");
    Ok(())
}

pub fn sleep(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    device.sleep()?;
    println!("Panel asleep.");
    Ok(())
}

/// A fresh session starts awake, so this fades the backlight up directly
pub fn wake(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    let target = config.power.brightness;
    device.fade(0, target, config.power.fade_duration())?;
    device.set_brightness(target)?;
    println!("Panel awake at {target}%.");
    Ok(())
}
