use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grab_engine::ClientSettings;
use grab_logging::{grab_info, grab_warn};
use serde::{Deserialize, Serialize};

pub(crate) const SETTINGS_FILENAME: &str = "mediagrab.ron";

/// Driver settings, read from `mediagrab.ron`. Every field is optional in the
/// file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub server_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            server_url: client.base_url,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            output_dir: PathBuf::from("downloads"),
        }
    }
}

impl Settings {
    pub(crate) fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// A missing or unreadable file yields the defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Settings::default();
        }
        Err(err) => {
            grab_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            grab_info!("Loaded settings from {:?}", path);
            settings
        }
        Err(err) => {
            grab_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}
