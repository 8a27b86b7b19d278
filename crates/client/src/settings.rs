use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use puck::config::clamp_username;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";
pub const DEFAULT_USERNAME: &str = "player";

/// Persisted player preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub username: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
        }
    }
}

impl Settings {
    /// Reads the settings file. A missing or unreadable file yields the
    /// defaults so a broken file never keeps the game from starting.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str::<Settings>(&text) {
            Ok(stored) => {
                let mut settings = Self::default();
                settings.set_username(&stored.username);
                settings
            }
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        log::info!("settings saved to {}", path.display());
        Ok(())
    }

    /// Stores `name` clamped to the username limit. Blank names are ignored.
    pub fn set_username(&mut self, name: &str) {
        let name = clamp_username(name);
        self.username = if name.is_empty() {
            DEFAULT_USERNAME.to_string()
        } else {
            name
        };
    }
}

pub fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("puck-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load(&temp_path("missing"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut settings = Settings::default();
        settings.set_username("alice");
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).username, "alice");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_long_username_truncated_on_load() {
        let path = temp_path("long");
        fs::write(&path, r#"{"username": "abcdefghijklmnop"}"#).unwrap();

        assert_eq!(Settings::load(&path).username, "abcdefghij");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let path = temp_path("malformed");
        fs::write(&path, "username=bob").unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_blank_username_falls_back() {
        let mut settings = Settings::default();
        settings.set_username("   ");
        assert_eq!(settings.username, DEFAULT_USERNAME);
    }
}
