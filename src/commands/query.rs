//! Query command handlers.

use std::path::Path;

use ajazz_driver::DriverConfig;

use super::{open_deck, CommandResult};

/// Firmware version and panel geometry
pub fn info(config: &DriverConfig, dry_run: bool) -> CommandResult {
    let device = open_deck(config, dry_run)?;
    let version = device.firmware_version()?;

    println!("Panel:       {}", device.id());
    if !device.serial().is_empty() {
        println!("Serial:      {}", device.serial());
    }
    println!("Firmware:    {version}");
    println!(
        "Keys:        {} ({} columns x {} rows)",
        device.keys(),
        device.columns(),
        device.rows()
    );
    println!(
        "Key images:  {0}x{0} px, {1} dpi, {2} px padding",
        device.pixels(),
        device.dpi(),
        device.padding()
    );
    let (w, h) = device.logo_size();
    println!("Logo:        {w}x{h} px");
    println!("Brightness:  {}%", device.brightness());
    Ok(())
}

/// Print the effective configuration, optionally writing it out
pub fn config(config: &DriverConfig, path: &Path, save: bool) -> CommandResult {
    print!("{}", toml::to_string_pretty(config)?);
    if save {
        config.save(path)?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}
