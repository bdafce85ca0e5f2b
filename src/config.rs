//! Driver configuration
//!
//! Stored as TOML at `~/.config/ajazz/driver.toml`. Every section and field
//! is optional; anything missing takes its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ajazz_deck::{DeckOptions, ImageTransform, JpegCodec, PanelModel, ReportMode, RetryPolicy};
use ajazz_transport::protocol::{timing, MAX_BRIGHTNESS};
use serde::{Deserialize, Serialize};

/// AKP153 USB identifiers
pub const DEFAULT_VID: u16 = 0x0300;
pub const DEFAULT_PID: u16 = 0x1001;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub device: DeviceConfig,
    pub transport: TransportConfig,
    pub power: PowerConfig,
    pub image: ImageConfig,
}

/// Which panel to open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vid: u16,
    pub pid: u16,
    /// hidraw / platform path; takes precedence over vid/pid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub model: PanelModel,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vid: DEFAULT_VID,
            pid: DEFAULT_PID,
            path: None,
            model: PanelModel::default(),
        }
    }
}

/// Report framing as configured; `auto` follows the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportModeSetting {
    #[default]
    Auto,
    Plain,
    ReportId,
}

impl ReportModeSetting {
    pub fn resolve(self) -> ReportMode {
        match self {
            ReportModeSetting::Auto => ReportMode::native(),
            ReportModeSetting::Plain => ReportMode::Plain,
            ReportModeSetting::ReportId => ReportMode::ReportId,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub report_mode: ReportModeSetting,
    /// Attempts per command before giving up
    pub retry_attempts: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            report_mode: ReportModeSetting::Auto,
            retry_attempts: timing::SEND_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Brightness applied after open (percent)
    pub brightness: u8,
    /// Sleep after this many idle seconds while reading keys (0 = never)
    pub sleep_timeout_secs: u64,
    /// Fade length for sleep and wake
    pub fade_ms: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            brightness: MAX_BRIGHTNESS,
            sleep_timeout_secs: 0,
            fade_ms: 0,
        }
    }
}

impl PowerConfig {
    pub fn sleep_timeout(&self) -> Duration {
        Duration::from_secs(self.sleep_timeout_secs)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub jpeg_quality: u8,
    pub transform: ImageTransform,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let codec = JpegCodec::default();
        Self {
            jpeg_quality: codec.quality,
            transform: codec.transform,
        }
    }
}

impl DriverConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ajazz")
            .join("driver.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DriverConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Session parameters for `DeckDevice::open`
    pub fn deck_options(&self) -> DeckOptions {
        DeckOptions {
            panel: self.device.model.info(),
            report_mode: self.transport.report_mode.resolve(),
            retry: RetryPolicy::new(self.transport.retry_attempts),
            codec: Box::new(JpegCodec::new(self.image.jpeg_quality, self.image.transform)),
            ..DeckOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = DriverConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("report_mode = \"auto\""));
        assert!(toml_str.contains("transform = \"rotate180\""));
        assert!(toml_str.contains("model = \"akp153\""));
        assert!(!toml_str.contains("path"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: DriverConfig = toml::from_str(
            r#"
[device]
pid = 0x1010

[power]
sleep_timeout_secs = 300
"#,
        )
        .unwrap();
        assert_eq!(config.device.vid, DEFAULT_VID);
        assert_eq!(config.device.pid, 0x1010);
        assert_eq!(config.power.sleep_timeout(), Duration::from_secs(300));
        assert_eq!(config.power.brightness, 100);
        assert_eq!(config.transport.retry_attempts, 3);
    }

    #[test]
    fn test_report_mode_names() {
        let config: DriverConfig = toml::from_str(
            r#"
[transport]
report_mode = "report-id"

[image]
transform = "flip-horizontal"
"#,
        )
        .unwrap();
        assert_eq!(config.transport.report_mode.resolve(), ReportMode::ReportId);
        assert_eq!(config.image.transform, ImageTransform::FlipHorizontal);
        assert_eq!(ReportModeSetting::Auto.resolve(), ReportMode::native());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("driver.toml");

        let mut config = DriverConfig::default();
        config.device.path = Some("/dev/hidraw3".into());
        config.power.fade_ms = 250;
        config.save(&path).unwrap();

        let loaded = DriverConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.power.fade_duration(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = DriverConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, DriverConfig::default());
    }

    #[test]
    fn test_deck_options_follow_config() {
        let mut config = DriverConfig::default();
        config.transport.report_mode = ReportModeSetting::Plain;
        config.transport.retry_attempts = 5;
        let options = config.deck_options();
        assert_eq!(options.report_mode, ReportMode::Plain);
        assert_eq!(options.retry.attempts(), 5);
        assert_eq!(options.panel, PanelModel::Akp153.info());
    }
}
