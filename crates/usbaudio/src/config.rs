//! Configuration management

use anyhow::{Context, Result, anyhow};
use protocol::{LookupCriterion, UsbId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralSettings,
    /// Default device selection, overridden by `--serial` / `--device`
    #[serde(default)]
    pub lookup: LookupSettings,
    #[serde(default)]
    pub usb: UsbSettings,
    #[serde(default)]
    pub player: PlayerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default = "GeneralSettings::default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl GeneralSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Device selection; `serial` and `device` are mutually exclusive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// `vid:pid` in hex, e.g. "18d1:4ee7"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<UsbId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Upper bound on devices collected by one scan
    #[serde(default = "UsbSettings::default_max_devices")]
    pub max_devices: usize,
    /// Wait after enabling accessory mode before looking for the input source
    #[serde(default = "UsbSettings::default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            max_devices: Self::default_max_devices(),
            settle_delay_ms: Self::default_settle_delay_ms(),
        }
    }
}

impl UsbSettings {
    fn default_max_devices() -> usize {
        32
    }

    fn default_settle_delay_ms() -> u64 {
        2000
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Play the matching input source once found
    #[serde(default = "PlayerSettings::default_enabled")]
    pub enabled: bool,
    /// Player executable; the `VLC` environment variable takes precedence
    #[serde(default = "PlayerSettings::default_command")]
    pub command: String,
    #[serde(default = "PlayerSettings::default_live_caching_ms")]
    pub live_caching_ms: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            command: Self::default_command(),
            live_caching_ms: Self::default_live_caching_ms(),
        }
    }
}

impl PlayerSettings {
    fn default_enabled() -> bool {
        true
    }

    fn default_command() -> String {
        "vlc".to_string()
    }

    fn default_live_caching_ms() -> u32 {
        50
    }
}

impl AppConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref())
        } else {
            // Try standard locations in order
            let candidates = vec![Self::default_path(), PathBuf::from("/etc/usbaudio/config.toml")];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usbaudio").join("config.toml")
        } else {
            PathBuf::from(".config/usbaudio/config.toml")
        }
    }

    /// Combine command-line identification with the configured default
    ///
    /// Command-line values replace the whole `[lookup]` section.
    pub fn criterion(&self, serial: Option<String>, device: Option<UsbId>) -> Result<LookupCriterion> {
        let (serial, device) = if serial.is_some() || device.is_some() {
            (serial, device)
        } else {
            (self.lookup.serial.clone(), self.lookup.device)
        };

        LookupCriterion::from_parts(serial, device)
            .ok_or_else(|| anyhow!("Could not provide device and serial simultaneously"))
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.general.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.lookup.serial.is_some() && self.lookup.device.is_some() {
            return Err(anyhow!(
                "[lookup] serial and device cannot be set simultaneously"
            ));
        }

        if self.lookup.serial.as_deref() == Some("") {
            return Err(anyhow!("[lookup] serial must not be empty"));
        }

        if self.usb.max_devices == 0 {
            return Err(anyhow!("[usb] max_devices must be at least 1"));
        }

        if self.player.command.trim().is_empty() {
            return Err(anyhow!("[player] command must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.usb.max_devices, 32);
        assert_eq!(config.usb.settle_delay(), Duration::from_secs(2));
        assert!(config.player.enabled);
        assert_eq!(config.player.command, "vlc");
        assert_eq!(config.player.live_caching_ms, 50);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = AppConfig::parse(&toml_str).unwrap();

        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.player.command, parsed.player.command);
        assert!(parsed.lookup.serial.is_none());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.general.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.general.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_criterion_precedence() {
        let mut config = AppConfig::default();
        config.lookup.device = Some(UsbId::new(0x18D1, 0x4EE7));

        assert_eq!(
            config.criterion(None, None).unwrap(),
            LookupCriterion::VidPid(UsbId::new(0x18D1, 0x4EE7))
        );
        assert_eq!(
            config.criterion(Some("AAA".into()), None).unwrap(),
            LookupCriterion::Serial("AAA".into())
        );
        assert!(
            config
                .criterion(Some("AAA".into()), Some(UsbId::new(1, 2)))
                .is_err()
        );
    }
}
