// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BACKUPS_KEPT: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub compliance: ComplianceConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            detection: DetectionConfig::default(),
            classifier: ClassifierConfig::default(),
            compliance: ComplianceConfig::default(),
            proxy: None,
            api_keys: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Proxy URL to use for outbound requests, if one is enabled.
    pub fn active_proxy(&self) -> Option<&str> {
        self.proxy
            .as_ref()
            .filter(|p| p.enabled)
            .and_then(|p| p.https.as_deref().or(p.http.as_deref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Fragments longer than this are treated as containers and skipped.
    #[serde(default = "default_max_fragment_chars")]
    pub max_fragment_chars: usize,
    #[serde(default = "default_semantic_max_chars")]
    pub semantic_max_chars: usize,
    #[serde(default = "default_external_min_chars")]
    pub external_min_chars: usize,
    #[serde(default = "default_external_max_chars")]
    pub external_max_chars: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default)]
    pub use_external_classifier: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_fragment_chars: default_max_fragment_chars(),
            semantic_max_chars: default_semantic_max_chars(),
            external_min_chars: default_external_min_chars(),
            external_max_chars: default_external_max_chars(),
            batch_size: default_batch_size(),
            cache_capacity: default_cache_capacity(),
            use_external_classifier: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceConfig {
    /// Directory of `<regulation>.json` checklists overriding the built-in tables.
    #[serde(default)]
    pub requirements_dir: Option<PathBuf>,
    #[serde(default = "default_regulation")]
    pub default_regulation: String,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            requirements_dir: None,
            default_regulation: default_regulation(),
        }
    }
}

fn default_version() -> String { "1.0.0".to_string() }
fn default_max_fragment_chars() -> usize { 500 }
fn default_semantic_max_chars() -> usize { 200 }
fn default_external_min_chars() -> usize { 5 }
fn default_external_max_chars() -> usize { 300 }
fn default_batch_size() -> usize { 20 }
fn default_cache_capacity() -> usize { 2048 }
fn default_provider() -> String { "groq".to_string() }
fn default_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_temperature() -> f64 { 0.1 }
fn default_max_tokens() -> i32 { 2000 }
fn default_regulation() -> String { "gdpr".to_string() }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("watchdogs"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(io_err(&self.config_dir))
    }

    /// Load configuration from file, defaults when absent
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(io_err(&self.config_file))?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        fs::write(&self.config_file, content).map_err(io_err(&self.config_file))
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir).map_err(io_err(&backup_dir))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(io_err(&backup_file))?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_KEPT)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(io_err(backup_dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort chronologically
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Get provider API key from config file
    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, ConfigError> {
        let config = self.load()?;
        Ok(config.api_keys.get(provider).cloned())
    }

    /// Store provider API key in config file
    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }

    /// Delete provider API key from config file
    pub fn delete_api_key(&self, provider: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.remove(provider);
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.max_fragment_chars, 500);
        assert_eq!(config.detection.batch_size, 20);
        assert_eq!(config.classifier.provider, "groq");
        assert_eq!(config.compliance.default_regulation, "gdpr");
        assert!(!config.detection.use_external_classifier);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"detection": {"batchSize": 5}}"#).unwrap();
        assert_eq!(config.detection.batch_size, 5);
        assert_eq!(config.detection.semantic_max_chars, 200);
        assert_eq!(config.classifier.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_active_proxy_requires_enabled() {
        let mut config = AppConfig::default();
        config.proxy = Some(ProxyConfig {
            enabled: false,
            http: Some("http://127.0.0.1:8080".to_string()),
            https: None,
        });
        assert!(config.active_proxy().is_none());
        config.proxy.as_mut().unwrap().enabled = true;
        assert_eq!(config.active_proxy(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_save_load_and_backups() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        store.set_api_key("groq", "k1").unwrap();
        store.set_api_key("groq", "k2").unwrap();
        assert_eq!(store.get_api_key("groq").unwrap().as_deref(), Some("k2"));

        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(backups, 1);

        store.delete_api_key("groq").unwrap();
        assert!(store.get_api_key("groq").unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        fs::write(store.config_file(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
    }
}
