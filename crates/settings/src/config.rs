//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use donations_core::PaymentSourceType;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// One-time donation settings
    #[serde(default)]
    pub donations: DonationSettings,

    /// UI settings
    #[serde(default)]
    pub ui: UiSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.donations.validate()?;
            settings.config_path = Some(path.clone());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.clone());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Path the settings were loaded from, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

/// One-time donation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSettings {
    /// Locale sent with configuration requests
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Seconds to wait for a payment to finish redeeming
    #[serde(default = "default_redemption_timeout")]
    pub redemption_timeout_secs: u64,

    /// Payment methods offered on this device
    #[serde(default = "default_payment_methods")]
    pub available_payment_methods: Vec<PaymentSourceType>,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_redemption_timeout() -> u64 {
    10
}

fn default_payment_methods() -> Vec<PaymentSourceType> {
    PaymentSourceType::ALL.to_vec()
}

impl Default for DonationSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            redemption_timeout_secs: default_redemption_timeout(),
            available_payment_methods: default_payment_methods(),
        }
    }
}

impl DonationSettings {
    pub fn redemption_timeout(&self) -> Duration {
        Duration::from_secs(self.redemption_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.redemption_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "redemption_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.locale.trim().is_empty() {
            return Err(SettingsError::Invalid("locale must not be empty".to_string()));
        }
        Ok(())
    }
}

/// UI settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiSettings {
    /// Theme (light/dark/system)
    #[serde(default)]
    pub theme: Theme,
}

/// UI theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.donations.locale, "en-US");
        assert_eq!(settings.donations.redemption_timeout(), Duration::from_secs(10));
        assert_eq!(settings.donations.available_payment_methods.len(), 5);
        assert_eq!(settings.ui.theme, Theme::System);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "donations": { "locale": "de-DE" } }"#).unwrap();
        assert_eq!(settings.donations.locale, "de-DE");
        assert_eq!(settings.donations.redemption_timeout_secs, 10);
        assert_eq!(settings.ui.theme, Theme::System);
    }

    #[test]
    fn test_payment_methods_parse() {
        let settings: Settings = serde_json::from_str(
            r#"{ "donations": { "available_payment_methods": ["credit_card", "sepa_debit"] } }"#,
        )
        .unwrap();
        assert_eq!(
            settings.donations.available_payment_methods,
            vec![PaymentSourceType::CreditCard, PaymentSourceType::SepaDebit]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.donations.redemption_timeout_secs = 30;
        settings.ui.theme = Theme::Dark;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.donations.redemption_timeout_secs, 30);
        assert_eq!(loaded.ui.theme, Theme::Dark);
        assert_eq!(loaded.config_path(), Some(&path));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.donations.redemption_timeout_secs, 10);
        assert!(!path.exists());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "donations": { "redemption_timeout_secs": 0 } }"#).unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::ParseError(_))));
    }
}
