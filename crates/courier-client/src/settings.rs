//! Client settings with layered sources.
//!
//! Settings are loaded from three layers (in priority order): compiled
//! defaults, a JSON settings file, and `COURIER_*` environment variable
//! overrides (highest priority).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default minimum time a tool status stays visible, in milliseconds.
pub const DEFAULT_TOOL_STATUS_HOLD_MS: u64 = 1500;

/// How much event detail is surfaced in the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verbosity {
    /// Status only; no tool arguments or output.
    Quiet,
    /// Tool call indicators with arguments, output still hidden.
    Informative,
    /// Everything, including tool output content.
    Full,
}

/// Settings for the client presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Event detail tier.
    pub verbosity: Verbosity,
    /// Minimum time a tool status stays visible before lower-precedence
    /// statuses may replace it.
    pub tool_status_hold_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Informative,
            tool_status_hold_ms: DEFAULT_TOOL_STATUS_HOLD_MS,
        }
    }
}

/// Settings loading failures.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Extraction from the layered sources failed.
    #[error("settings error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

/// Resolve the path to the settings file (`~/.courier/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".courier").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_client_settings() -> Result<ClientSettings, SettingsError> {
    load_client_settings_from(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file falls back to defaults; a present but malformed file is
/// an error.
pub fn load_client_settings_from(path: &Path) -> Result<ClientSettings, SettingsError> {
    let settings = Figment::from(Serialized::defaults(ClientSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed("COURIER_"))
        .extract()
        .map_err(Box::new)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.verbosity, Verbosity::Informative);
        assert_eq!(settings.tool_status_hold_ms, 1500);
    }

    #[test]
    fn verbosity_tiers_are_ordered() {
        assert!(Verbosity::Quiet < Verbosity::Informative);
        assert!(Verbosity::Informative < Verbosity::Full);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings =
            load_client_settings_from(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"verbosity": "full", "toolStatusHoldMs": 500}"#).unwrap();

        let settings = load_client_settings_from(&path).unwrap();
        assert_eq!(settings.verbosity, Verbosity::Full);
        assert_eq!(settings.tool_status_hold_ms, 500);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"verbosity": "quiet"}"#).unwrap();

        let settings = load_client_settings_from(&path).unwrap();
        assert_eq!(settings.verbosity, Verbosity::Quiet);
        assert_eq!(settings.tool_status_hold_ms, 1500);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(load_client_settings_from(&path).is_err());
    }

    #[test]
    fn verbosity_serde_uses_camel_case() {
        let v: Verbosity = serde_json::from_str("\"informative\"").unwrap();
        assert_eq!(v, Verbosity::Informative);
        assert_eq!(serde_json::to_string(&Verbosity::Full).unwrap(), "\"full\"");
    }
}
