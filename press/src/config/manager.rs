//! SettingsManager: settings file values with environment overrides and defaults.

use std::collections::HashMap;
use std::path::Path;

use super::defaults::{DEFAULT_SETTINGS, required_keys};
use super::validation::validate_setting;

/// Raw key/value settings as read from the settings file and environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsManager {
    values: HashMap<String, String>,
}

impl SettingsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit pairs without consulting the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Read the dotenv-format settings file at `path` (if it exists), then
    /// let non-empty environment variables override its values.
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let mut sm = Self::new();
        if path.exists() {
            for item in dotenvy::from_path_iter(path)? {
                let (key, value) = item?;
                sm.values.insert(key, value);
            }
            tracing::info!("Loaded settings from {}", path.display());
        } else {
            tracing::info!(
                "No settings file at {}, using environment variables",
                path.display()
            );
        }

        let overridden = sm.apply_env_overrides();
        if overridden > 0 {
            tracing::info!("{overridden} settings overridden from environment");
        }
        Ok(sm)
    }

    fn apply_env_overrides(&mut self) -> u32 {
        let mut overridden = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            if let Ok(env_val) = std::env::var(key) {
                if !env_val.is_empty() {
                    self.values.insert(key.to_string(), env_val);
                    overridden += 1;
                }
            }
        }
        overridden
    }

    /// Get a setting value. Falls back to the default if unset.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.values.get(key) {
            return Ok(val.clone());
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Validate every known setting, reporting all failures at once.
    pub fn validate_all(&self) -> Result<(), anyhow::Error> {
        let mut errors: Vec<String> = DEFAULT_SETTINGS
            .keys()
            .filter_map(|key| {
                let value = self.get_setting(key).unwrap_or_default();
                validate_setting(key, &value)
                    .err()
                    .map(|e| format!("{key}: {e}"))
            })
            .collect();
        if errors.is_empty() {
            return Ok(());
        }
        errors.sort();
        anyhow::bail!("invalid settings: {}", errors.join("; "));
    }

    /// Required keys that have no non-empty value.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        required_keys()
            .filter(|key| self.get_setting(key).unwrap_or_default().trim().is_empty())
            .collect()
    }

    /// Keys present in the file or environment that no definition knows.
    pub fn unknown_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .values
            .keys()
            .map(String::as_str)
            .filter(|k| !DEFAULT_SETTINGS.contains_key(k))
            .collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_get_setting_falls_back_to_default() {
        let sm = SettingsManager::from_pairs([("RESOLUTION_DPI", "2400")]);
        assert_eq!(sm.get_setting("RESOLUTION_DPI").unwrap(), "2400");
        assert_eq!(sm.get_setting("MOVE_RETRY_ATTEMPTS").unwrap(), "5");
        assert!(sm.get_setting("NOT_A_SETTING").is_err());
    }

    #[test]
    fn test_missing_required_settings() {
        let sm = SettingsManager::from_pairs([("INTAKE_DIR", "/in"), ("LOG_DIR", " ")]);
        assert_eq!(
            sm.missing_settings(),
            vec!["PROCESSING_DIR", "DELIVERY_DIR", "LOG_DIR", "GEOMETRY_FILE"]
        );
    }

    #[test]
    fn test_validate_all_collects_errors() {
        let sm = SettingsManager::from_pairs([
            ("RESOLUTION_DPI", "0"),
            ("TOWER_FIELD", "x"),
            ("SOMETHING_ELSE", "1"),
        ]);
        let err = sm.validate_all().unwrap_err().to_string();
        assert!(err.contains("RESOLUTION_DPI"), "{err}");
        assert!(err.contains("TOWER_FIELD"), "{err}");
        assert_eq!(sm.unknown_keys(), vec!["SOMETHING_ELSE"]);
    }

    #[test]
    fn test_load_reads_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("press.env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# plate folders").unwrap();
        writeln!(file, "CYLINDER_FIELD=7,2").unwrap();
        writeln!(file, "LEAD_MARK_POSITION=\"10,20\"").unwrap();
        drop(file);

        let sm = SettingsManager::load(&path).unwrap();
        assert_eq!(sm.get_setting("CYLINDER_FIELD").unwrap(), "7,2");
        assert_eq!(sm.get_setting("LEAD_MARK_POSITION").unwrap(), "10,20");
    }

    #[test]
    fn test_load_without_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SettingsManager::load(&dir.path().join("absent.env")).is_ok());
    }
}
