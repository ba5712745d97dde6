use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::venues::{NetworkAliasTable, VenueCredentials, DEFAULT_VENUES};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "CEXWATCH_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueSettings {
    pub name: String,
    /// Currency endpoint; defaults to the gateway route for `name`.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl VenueSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_url: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub merchant_host: String,
    pub store_api_key: String,
    pub cex_data_ttl_secs: u64,
    pub dv_currencies_ttl_secs: u64,
    pub catalog_refresh_interval_secs: u64,
    pub venue_fetch_timeout_secs: u64,
    pub cache_command_timeout_ms: u64,
    pub venue_gateway_url: String,
    pub venues: Vec<VenueSettings>,
    pub network_aliases: NetworkAliasTable,
    pub api_keys_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            merchant_host: String::new(),
            store_api_key: String::new(),
            cex_data_ttl_secs: 300,
            dv_currencies_ttl_secs: 1800,
            catalog_refresh_interval_secs: 300,
            venue_fetch_timeout_secs: 30,
            cache_command_timeout_ms: 1000,
            venue_gateway_url: "http://127.0.0.1:8080".to_string(),
            venues: DEFAULT_VENUES.iter().map(|name| VenueSettings::new(*name)).collect(),
            network_aliases: NetworkAliasTable::default(),
            api_keys_path: None,
        }
    }
}

impl AppConfig {
    /// Defaults, then the `CEXWATCH_CONFIG` file, then `.env` and the
    /// process environment. The result is validated.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded: {}", e);
        }

        let mut config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        config.validate().map_err(ConfigError::Invalid)?;

        info!(
            "Configuration loaded: {} enabled venues, {} networks",
            config.enabled_venues().len(),
            config.network_aliases.len()
        );
        Ok(config)
    }

    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        info!("Loading configuration from: {}", path);

        if !Path::new(path).exists() {
            warn!("Configuration file not found at {}, creating default config", path);
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Configuration saved to: {}", path);
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MERCHANT_HOST") {
            self.merchant_host = value;
        }
        if let Some(value) = lookup("STORE_API_KEY") {
            self.store_api_key = value;
        }
        if let Some(value) = lookup("REDIS_URL") {
            self.redis_url = value;
        }
        if let Some(value) = lookup("BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("VENUE_GATEWAY_URL") {
            self.venue_gateway_url = value;
        }
        if let Some(value) = lookup("API_KEYS_PATH") {
            self.api_keys_path = Some(value);
        }

        let numeric = [
            ("CEX_DATA_TTL", &mut self.cex_data_ttl_secs),
            ("DV_CURRENCIES_TTL", &mut self.dv_currencies_ttl_secs),
            ("VENUE_FETCH_TIMEOUT", &mut self.venue_fetch_timeout_secs),
            ("CATALOG_REFRESH_INTERVAL", &mut self.catalog_refresh_interval_secs),
        ];
        for (key, field) in numeric {
            if let Some(value) = lookup(key) {
                match value.parse::<u64>() {
                    Ok(parsed) => *field = parsed,
                    Err(_) => warn!("Ignoring non-numeric {}={}", key, value),
                }
            }
        }

        for venue in self.venues.iter_mut() {
            let prefix = format!("VENUE_{}", venue.name.to_uppercase());
            if let Some(api_url) = lookup(&format!("{}_API_URL", prefix)) {
                venue.api_url = Some(api_url);
            }
            let enabled_key = format!("{}_ENABLED", prefix);
            if let Some(enabled) = lookup(&enabled_key) {
                match enabled.parse::<bool>() {
                    Ok(parsed) => venue.enabled = parsed,
                    Err(_) => warn!("Ignoring non-boolean {}={}", enabled_key, enabled),
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.merchant_host.is_empty() {
            errors.push("merchant_host is required".to_string());
        }
        if self.store_api_key.is_empty() {
            errors.push("store_api_key is required".to_string());
        }
        if self.redis_url.is_empty() {
            errors.push("redis_url is required".to_string());
        }
        if self.cex_data_ttl_secs == 0 {
            errors.push("cex_data_ttl_secs cannot be zero".to_string());
        }
        if self.dv_currencies_ttl_secs == 0 {
            errors.push("dv_currencies_ttl_secs cannot be zero".to_string());
        }
        if self.catalog_refresh_interval_secs == 0 {
            errors.push("catalog_refresh_interval_secs cannot be zero".to_string());
        }
        if self.venue_fetch_timeout_secs == 0 {
            errors.push("venue_fetch_timeout_secs cannot be zero".to_string());
        }

        let mut seen = Vec::new();
        for venue in &self.venues {
            if venue.name.is_empty() {
                errors.push("Venue with empty name".to_string());
            } else if seen.contains(&venue.name) {
                errors.push(format!("Venue {} configured twice", venue.name));
            } else {
                seen.push(venue.name.clone());
            }
            if venue.enabled && venue.api_url.is_none() && self.venue_gateway_url.is_empty() {
                errors.push(format!("Venue {} has no API URL and no gateway is set", venue.name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Enabled venues, in configuration order.
    pub fn enabled_venues(&self) -> Vec<&VenueSettings> {
        self.venues.iter().filter(|venue| venue.enabled).collect()
    }

    pub fn venue_api_url(&self, venue: &VenueSettings) -> String {
        venue.api_url.clone().unwrap_or_else(|| {
            format!(
                "{}/exchanges/{}/currencies",
                self.venue_gateway_url.trim_end_matches('/'),
                venue.name
            )
        })
    }

    /// Per-venue credentials from `api_keys_path`. No path means no
    /// credentials; every venue is then queried anonymously.
    pub fn load_credentials(&self) -> Result<HashMap<String, VenueCredentials>, ConfigError> {
        let Some(path) = &self.api_keys_path else {
            return Ok(HashMap::new());
        };

        let content = fs::read_to_string(path)?;
        let credentials: HashMap<String, VenueCredentials> = serde_json::from_str(&content)?;
        info!("Loaded credentials for {} venues from {}", credentials.len(), path);
        Ok(credentials)
    }

    pub fn cex_data_ttl(&self) -> Duration {
        Duration::from_secs(self.cex_data_ttl_secs)
    }

    pub fn dv_currencies_ttl(&self) -> Duration {
        Duration::from_secs(self.dv_currencies_ttl_secs)
    }

    pub fn catalog_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.catalog_refresh_interval_secs)
    }

    pub fn venue_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.venue_fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config() -> AppConfig {
        AppConfig {
            merchant_host: "merchant.example.com".to_string(),
            store_api_key: "key".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cex_data_ttl(), Duration::from_secs(300));
        assert_eq!(config.dv_currencies_ttl(), Duration::from_secs(1800));
        assert_eq!(config.catalog_refresh_interval(), Duration::from_secs(300));
        assert_eq!(
            config.venues.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            DEFAULT_VENUES
        );
        assert_eq!(config.network_aliases.aliases("tron"), ["TRX", "TRC20", "TRX1"]);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut config = AppConfig::default();
        config.cex_data_ttl_secs = 0;
        config.venues.push(VenueSettings::new("okx"));

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_overrides_apply_to_fields_and_venues() {
        let env = HashMap::from([
            ("MERCHANT_HOST", "dv.example.com"),
            ("CEX_DATA_TTL", "120"),
            ("DV_CURRENCIES_TTL", "soon"),
            ("VENUE_MEXC_ENABLED", "false"),
            ("VENUE_KUCOIN_ENABLED", "nope"),
            ("VENUE_OKX_API_URL", "http://okx.internal/currencies"),
        ]);
        let mut config = valid_config();

        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.merchant_host, "dv.example.com");
        assert_eq!(config.cex_data_ttl_secs, 120);
        assert_eq!(config.dv_currencies_ttl_secs, 1800);
        assert!(!config.enabled_venues().iter().any(|v| v.name == "mexc"));
        assert_eq!(config.enabled_venues().len(), 5);
        // Unparseable flag keeps the configured value
        assert!(config.venues.iter().find(|v| v.name == "kucoin").unwrap().enabled);

        let okx = config.venues.iter().find(|v| v.name == "okx").unwrap();
        assert_eq!(config.venue_api_url(okx), "http://okx.internal/currencies");
        let htx = config.venues.iter().find(|v| v.name == "htx").unwrap();
        assert_eq!(config.venue_api_url(htx), "http://127.0.0.1:8080/exchanges/htx/currencies");
    }

    #[test]
    fn test_config_file_operations() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("cexwatch.json");
        let file_path_str = file_path.to_str().unwrap();

        // Missing file is created with defaults
        let created = AppConfig::load_from_file(file_path_str).unwrap();
        assert!(file_path.exists());
        assert_eq!(created.venues.len(), DEFAULT_VENUES.len());

        fs::write(
            &file_path,
            r#"{"merchant_host": "m.example.com", "venues": [{"name": "okx"}], "network_aliases": {"ton": ["TON"]}}"#,
        )
        .unwrap();
        let loaded = AppConfig::load_from_file(file_path_str).unwrap();
        assert_eq!(loaded.merchant_host, "m.example.com");
        assert_eq!(loaded.venues, vec![VenueSettings::new("okx")]);
        assert_eq!(loaded.network_aliases.aliases("ton"), ["TON"]);
        assert!(loaded.network_aliases.aliases("bitcoin").is_empty());
        assert_eq!(loaded.cex_data_ttl_secs, 300);
    }

    #[test]
    fn test_load_credentials() {
        let dir = tempdir().unwrap();
        let keys_path = dir.path().join("api_keys.json");
        fs::write(
            &keys_path,
            r#"{"okx": {"api_key": "a", "secret_key": "b", "passphrase": "c"}, "binance": {"api_key": "d", "secret_key": "e"}}"#,
        )
        .unwrap();

        let mut config = valid_config();
        assert!(config.load_credentials().unwrap().is_empty());

        config.api_keys_path = Some(keys_path.to_str().unwrap().to_string());
        let credentials = config.load_credentials().unwrap();
        assert_eq!(credentials["okx"].passphrase.as_deref(), Some("c"));
        assert_eq!(credentials["binance"].passphrase, None);

        config.api_keys_path = Some(dir.path().join("missing.json").to_str().unwrap().to_string());
        assert!(matches!(config.load_credentials(), Err(ConfigError::Io(_))));
    }
}
