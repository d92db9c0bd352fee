//! # Store Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BASKET_STORAGE_BACKEND=sqlite                                      │
//! │     BASKET_DB_PATH=/tmp/basket.db                                      │
//! │     BASKET_STORAGE_KEY=@Products:products                              │
//! │     BASKET_MAX_ATTEMPTS=5                                              │
//! │     BASKET_COALESCE_WRITES=false                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, or <config_dir>/basket.toml                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     memory backend, key "@Products:products"                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! backend = "sqlite"          # memory | sqlite
//! database_path = "/var/lib/basket/basket.db"
//! key = "@Products:products"
//!
//! [persistence]
//! queue_capacity = 64
//! max_attempts = 5
//! initial_backoff_ms = 50
//! max_backoff_ms = 2000
//! coalesce_writes = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use basket_core::DEFAULT_STORAGE_KEY;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Storage Backend
// =============================================================================

/// Which key-value backend the store persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local map. Nothing survives a restart.
    #[default]
    Memory,

    /// SQLite `kv_store` table.
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "sqlite" | "db" => Ok(StorageBackend::Sqlite),
            other => Err(StoreError::InvalidConfig(format!(
                "Unknown storage backend: '{}'. Valid options: memory, sqlite",
                other
            ))),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite file. Defaults to `<data_dir>/basket.db` when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Key the cart blob is stored under.
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: StorageBackend::default(),
            database_path: None,
            key: default_key(),
        }
    }
}

// =============================================================================
// Persistence Settings
// =============================================================================

/// Persistence writer behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Capacity of the command queue and the writer queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Attempts per snapshot before a failure is reported (≥ 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on a single retry delay (milliseconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// When several snapshots are queued, write only the newest.
    #[serde(default = "default_true")]
    pub coalesce_writes: bool,
}

fn default_queue_capacity() -> usize {
    64
}
fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff() -> u64 {
    50
}
fn default_max_backoff() -> u64 {
    2_000
}
fn default_true() -> bool {
    true
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        PersistenceSettings {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            coalesce_writes: default_true(),
        }
    }
}

impl PersistenceSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Main Store Configuration
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub persistence: PersistenceSettings,
}

impl StoreConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (basket.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| StoreError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.storage.key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "storage.key must not be empty".into(),
            ));
        }

        if self.persistence.queue_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "queue_capacity must be greater than 0".into(),
            ));
        }

        if self.persistence.max_attempts == 0 {
            return Err(StoreError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }

        if self.persistence.initial_backoff_ms > self.persistence.max_backoff_ms {
            return Err(StoreError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.persistence.initial_backoff_ms, self.persistence.max_backoff_ms
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production, a map in tests). Unparseable values are logged and ignored.
    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("BASKET_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(path) = lookup("BASKET_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(key) = lookup("BASKET_STORAGE_KEY") {
            self.storage.key = key;
        }

        if let Some(attempts) = lookup("BASKET_MAX_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.persistence.max_attempts = n,
                Err(_) => warn!(value = %attempts, "Invalid BASKET_MAX_ATTEMPTS"),
            }
        }

        if let Some(coalesce) = lookup("BASKET_COALESCE_WRITES") {
            match coalesce.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.persistence.coalesce_writes = true,
                "0" | "false" | "no" | "off" => self.persistence.coalesce_writes = false,
                _ => warn!(value = %coalesce, "Invalid BASKET_COALESCE_WRITES"),
            }
        }
    }

    /// Returns the SQLite file path, falling back to the platform data dir.
    pub fn database_path(&self) -> StoreResult<PathBuf> {
        if let Some(ref path) = self.storage.database_path {
            return Ok(path.clone());
        }

        directories::ProjectDirs::from("com", "basket", "basket")
            .map(|dirs| dirs.data_dir().join("basket.db"))
            .ok_or_else(|| StoreError::InvalidConfig("Could not determine data directory".into()))
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "basket", "basket")
            .map(|dirs| dirs.config_dir().join("basket.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("SQLite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.key, "@Products:products");
        assert!(config.persistence.coalesce_writes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StoreConfig::default();

        config.storage.key = "  ".into();
        assert!(config.validate().unwrap_err().is_config_error());

        config.storage.key = "cart".into();
        config.persistence.max_attempts = 0;
        assert!(config.validate().is_err());

        config.persistence.max_attempts = 1;
        config.persistence.initial_backoff_ms = 5_000;
        assert!(config.validate().is_err());

        config.persistence.initial_backoff_ms = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: StoreConfig = toml::from_str(
            r#"
            [storage]
            backend = "sqlite"
            database_path = "/tmp/cart.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.key, "@Products:products");
        assert_eq!(config.persistence.max_attempts, 5);
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/cart.db"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BASKET_STORAGE_BACKEND", "sqlite"),
            ("BASKET_DB_PATH", "/data/b.db"),
            ("BASKET_STORAGE_KEY", "cart:v2"),
            ("BASKET_MAX_ATTEMPTS", "nope"),
            ("BASKET_COALESCE_WRITES", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.database_path, Some(PathBuf::from("/data/b.db")));
        assert_eq!(config.storage.key, "cart:v2");
        assert_eq!(config.persistence.max_attempts, 5); // invalid value ignored
        assert!(!config.persistence.coalesce_writes);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("basket.toml");

        let mut config = StoreConfig::default();
        config.storage.key = "saved-key".into();
        config.persistence.max_attempts = 3;
        config.save(Some(path.clone())).unwrap();

        let loaded: StoreConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.storage.key, "saved-key");
        assert_eq!(loaded.persistence.max_attempts, 3);
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.toml");
        std::fs::write(&path, "[storage\nbackend=").unwrap();

        let err = StoreConfig::load(Some(path.clone())).unwrap_err();
        assert!(matches!(err, StoreError::ConfigLoadFailed(_)));

        let fallback = StoreConfig::load_or_default(Some(path));
        assert_eq!(fallback.storage.key, "@Products:products");
    }

    #[test]
    fn test_unreadable_file_is_load_error_naming_path() {
        let dir = tempfile::tempdir().unwrap();

        // A directory exists but cannot be read as a file
        let err = StoreConfig::load(Some(dir.path().to_path_buf())).unwrap_err();
        match err {
            StoreError::ConfigLoadFailed(reason) => {
                assert!(reason.contains(&dir.path().display().to_string()))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
