// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ajazz_driver")]
#[command(author, version, about = "Ajazz AKP153 macro key panel driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/ajazz/driver.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log frames instead of talking to a panel
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Query Commands ===
    /// Show firmware version and panel geometry
    #[command(visible_aliases = ["version", "ver", "v"])]
    Info,

    /// Print the effective configuration as TOML
    Config {
        /// Write the effective configuration to the config path
        #[arg(long)]
        save: bool,
    },

    /// Print key presses until Ctrl-C or disconnect
    #[command(visible_alias = "r")]
    Read {
        /// One JSON object per event
        #[arg(long)]
        json: bool,
    },

    // === Set Commands ===
    /// Stop, full brightness, clear every key
    Reset,

    /// Black image on every key
    Clear,

    /// Set backlight brightness
    #[command(visible_alias = "b")]
    Brightness {
        /// Brightness in percent (0-100)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Show an image on one key (kept until Ctrl-C)
    #[command(visible_alias = "img")]
    Image {
        /// Key index, 0 is top-left
        key: u8,
        /// Image file (PNG or JPEG), scaled to the key size
        file: PathBuf,
    },

    /// Replace the boot logo
    Logo {
        /// Image file (PNG or JPEG), scaled to 854x480
        file: PathBuf,
    },

    /// Put the panel into standby
    Standby,

    /// Fade the backlight out
    Sleep,

    /// Fade the backlight back in to the configured brightness
    Wake,
}
