use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::language::{DecorationOptions, Language};
use crate::session::{SessionOptions, DEFAULT_DURATION_SECS, MIN_DURATION_SECS};

/// Persisted user options. Missing keys take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// seconds per timed session
    pub duration: u32,
    pub infinite_mode: bool,
    pub capitalize: bool,
    pub accents_enabled: bool,
    pub punctuation: bool,
    pub numbers: bool,
    pub hard_mode: bool,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub keep_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_SECS,
            infinite_mode: false,
            capitalize: false,
            accents_enabled: true,
            punctuation: false,
            numbers: false,
            hard_mode: false,
            language: Language::En,
            word_service_url: None,
            results_service_url: None,
            api_token: None,
            timezone: None,
            keep_history: true,
        }
    }
}

impl Config {
    /// Clamp values a hand-edited file may get wrong
    pub fn normalized(mut self) -> Self {
        if self.duration < MIN_DURATION_SECS {
            self.duration = DEFAULT_DURATION_SECS;
        }
        for url in [&mut self.word_service_url, &mut self.results_service_url] {
            if url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                *url = None;
            }
        }
        self
    }

    pub fn decoration(&self) -> DecorationOptions {
        DecorationOptions {
            language: self.language,
            accents_enabled: self.accents_enabled,
            capitalize: self.capitalize,
            punctuation: self.punctuation,
            numbers: self.numbers,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            duration_secs: self.duration,
            infinite: self.infinite_mode,
            hard_mode: self.hard_mode,
            decoration: self.decoration(),
        }
    }

    /// Results go to the service only with both an endpoint and a token
    pub fn results_service(&self) -> Option<(&str, &str)> {
        match (&self.results_service_url, &self.api_token) {
            (Some(url), Some(token)) if !token.trim().is_empty() => {
                Some((url.as_str(), token.as_str()))
            }
            _ => None,
        }
    }
}

pub trait ConfigStore {
    fn try_load(&self) -> Result<Config, ConfigError>;

    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;

    /// Load, falling back to defaults on any problem
    fn load(&self) -> Config {
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(%err, "using default config");
                Config::default()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn try_load(&self) -> Result<Config, ConfigError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice::<Config>(&bytes)?.normalized()),
            // first run
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps the config in memory; used by headless runs and tests
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    cfg: std::sync::Mutex<Option<Config>>,
}

impl ConfigStore for MemoryConfigStore {
    fn try_load(&self) -> Result<Config, ConfigError> {
        let cfg = self.cfg.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cfg.clone().unwrap_or_default())
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        *self.cfg.lock().unwrap_or_else(|e| e.into_inner()) = Some(cfg.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            duration: 30,
            infinite_mode: true,
            capitalize: true,
            accents_enabled: false,
            punctuation: true,
            numbers: true,
            hard_mode: true,
            language: Language::Pt,
            word_service_url: Some("http://localhost:5000".into()),
            results_service_url: Some("http://localhost:5000".into()),
            api_token: Some("secret".into()),
            timezone: Some("Europe/Lisbon".into()),
            keep_history: false,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.try_load().unwrap(), Config::default());
    }

    #[test]
    fn invalid_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_matches!(store.try_load(), Err(ConfigError::Parse(_)));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn camel_case_keys_and_partial_files() {
        let cfg: Config =
            serde_json::from_str(r#"{"hardMode": true, "accentsEnabled": false, "language": "de"}"#)
                .unwrap();
        assert!(cfg.hard_mode);
        assert!(!cfg.accents_enabled);
        assert_eq!(cfg.language, Language::De);
        assert_eq!(cfg.duration, DEFAULT_DURATION_SECS);
        assert!(cfg.keep_history);

        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json.get("infiniteMode").is_some());
        assert!(json.get("apiToken").is_none());
    }

    #[test]
    fn short_duration_is_normalized() {
        let cfg = Config {
            duration: 2,
            word_service_url: Some("  ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(cfg.duration, DEFAULT_DURATION_SECS);
        assert_eq!(cfg.word_service_url, None);
    }

    #[test]
    fn results_service_needs_url_and_token() {
        let mut cfg = Config {
            results_service_url: Some("https://r.test".into()),
            ..Default::default()
        };
        assert_eq!(cfg.results_service(), None);
        cfg.api_token = Some("abc".into());
        assert_eq!(cfg.results_service(), Some(("https://r.test", "abc")));
    }

    #[test]
    fn session_options_follow_config() {
        let cfg = Config {
            duration: 15,
            numbers: true,
            language: Language::Fr,
            ..Default::default()
        };
        let opts = cfg.session_options();
        assert_eq!(opts.duration_secs, 15);
        assert!(opts.decoration.numbers);
        assert!(opts.decoration.accents_enabled);
        assert_eq!(opts.decoration.language, Language::Fr);
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryConfigStore::default();
        assert_eq!(store.load(), Config::default());
        let cfg = Config {
            punctuation: true,
            ..Default::default()
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }
}
