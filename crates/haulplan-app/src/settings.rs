use haulplan_core::Coord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub search_debounce_ms: u64,
    pub min_query_len: usize,
    pub reveal_interval_ms: u64,
    pub fit_padding_px: u32,
    /// Where the picker opens when the role has no location yet.
    pub default_center: Coord,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 15_000,
            search_debounce_ms: 1_200,
            min_query_len: 3,
            reveal_interval_ms: 500,
            fit_padding_px: 40,
            default_center: Coord::new(39.8283, -98.5795),
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("haulplan").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Unreadable or malformed files fall back to defaults; fields missing
    /// from the file keep their default values.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file");
                return Self::default();
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "settings unreadable, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(settings) => {
                info!(path = %path.display(), api = %settings.api_base_url, "settings loaded");
                settings
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "settings malformed, using defaults");
                Self::default()
            }
        }
    }

    /// Writes to [`AppSettings::default_path`] and returns where it went.
    pub fn save(&self) -> std::io::Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| std::io::Error::other("no config directory on this platform"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.search_debounce(), Duration::from_millis(1200));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"api_base_url":"http://trips.local","reveal_interval_ms":300}"#)
            .unwrap();
        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.api_base_url, "http://trips.local");
        assert_eq!(settings.reveal_interval_ms, 300);
        assert_eq!(settings.min_query_len, 3);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            fit_padding_px: 64,
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }
}
