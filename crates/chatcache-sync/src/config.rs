//! Cache configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the cache works with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use chatcache_shared::constants::{DEFAULT_MAX_FILE_SIZE, DEFAULT_SAVE_DEBOUNCE_MS};

/// Cache synchronizer configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period after the last `save_chats` call before the save runs.
    /// Env: `CHATCACHE_SAVE_DEBOUNCE_MS`
    /// Default: 2000 ms
    pub save_debounce: Duration,

    /// Largest file payload embedded into the files record, in bytes.
    /// Larger payloads are left out (their entry is `null`).
    /// Env: `CHATCACHE_MAX_FILE_SIZE`
    /// Default: 5 MiB
    pub max_file_size: usize,

    /// SQLite database path.
    /// Env: `CHATCACHE_DB_PATH`
    /// Default: `None` (platform cache directory).
    pub db_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            db_path: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("CHATCACHE_SAVE_DEBOUNCE_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) => config.save_debounce = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CHATCACHE_SAVE_DEBOUNCE_MS, using default");
                }
            }
        }

        if let Some(val) = lookup("CHATCACHE_MAX_FILE_SIZE") {
            match val.trim().parse::<usize>() {
                Ok(bytes) => config.max_file_size = bytes,
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid CHATCACHE_MAX_FILE_SIZE, using default");
                }
            }
        }

        if let Some(path) = lookup("CHATCACHE_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.save_debounce, Duration::from_millis(2000));
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("CHATCACHE_SAVE_DEBOUNCE_MS", "250"),
            ("CHATCACHE_MAX_FILE_SIZE", "1024"),
            ("CHATCACHE_DB_PATH", "/tmp/cache.db"),
        ]));
        assert_eq!(config.save_debounce, Duration::from_millis(250));
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/cache.db")));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("CHATCACHE_SAVE_DEBOUNCE_MS", "soon"),
            ("CHATCACHE_MAX_FILE_SIZE", "-1"),
            ("CHATCACHE_DB_PATH", ""),
        ]));
        assert_eq!(config.save_debounce, Duration::from_millis(2000));
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert!(config.db_path.is_none());
    }
}
