//! Donation Settings
//!
//! Application configuration for the donation frontends.
//!
//! ## Features
//!
//! - Donation settings (locale, redemption timeout, available payment methods)
//! - UI settings (theme)
//! - Cross-platform config file storage
//! - JSON serialization
//!
//! ## Usage
//!
//! ```no_run
//! use donations_settings::Settings;
//!
//! // Load or create default settings
//! let mut settings = Settings::load_or_default()?;
//!
//! // Modify settings
//! settings.donations.redemption_timeout_secs = 15;
//!
//! // Save settings
//! settings.save()?;
//! # Ok::<(), donations_settings::SettingsError>(())
//! ```

mod config;

pub use config::{DonationSettings, Settings, Theme, UiSettings};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Directory holding the settings file.
///
/// The platform config directory (`$XDG_CONFIG_HOME` or `~/.config` on Linux)
/// joined with `donations`, or `./.donations` when none is known.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("donations"))
        .unwrap_or_else(|| PathBuf::from(".donations"))
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_path_under_config_dir() {
        let path = default_settings_path();
        assert!(path.ends_with("donations/settings.json"));
        if let Some(config_dir) = dirs::config_dir() {
            assert!(path.starts_with(config_dir));
        }
    }
}
