use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::constants::{DEFAULT_EXCHANGE_RATE, DEFAULT_SHOPIFY_API_VERSION, DEFAULT_THRESHOLD_PCT};
use crate::error::{CompareError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub compare: CompareConfig,
    pub shopify: ShopifyConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub threshold_pct: f64,
    pub default_exchange_rate: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            default_exchange_rate: DEFAULT_EXCHANGE_RATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopifyConfig {
    pub domain: String,
    pub token: String,
    pub api_version: String,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            token: String::new(),
            api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
        }
    }
}

impl ShopifyConfig {
    /// Command-line values win over the file and the environment; blank
    /// values are ignored.
    pub fn apply_overrides(&mut self, domain: Option<&str>, token: Option<&str>, api_version: Option<&str>) {
        for (target, value) in [
            (&mut self.domain, domain),
            (&mut self.token, token),
            (&mut self.api_version, api_version),
        ] {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                *target = value.to_string();
            }
        }
    }
}

impl Config {
    /// Loads the TOML file at `path` (defaults when it does not exist), then
    /// applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CompareError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides fields from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, name: &str| {
            if let Some(value) = lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };
        set(&mut self.supabase.url, "SUPABASE_URL");
        set(&mut self.supabase.key, "SUPABASE_KEY");
        set(&mut self.shopify.domain, "SHOPIFY_STORE_DOMAIN");
        set(&mut self.shopify.token, "SHOPIFY_ADMIN_API_TOKEN");
        set(&mut self.shopify.api_version, "SHOPIFY_API_VERSION");
    }

    pub fn validate(&self) -> Result<()> {
        let rate = self.compare.default_exchange_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CompareError::Config(format!(
                "default_exchange_rate must be a positive number, got {}",
                rate
            )));
        }
        if !self.compare.threshold_pct.is_finite() || self.compare.threshold_pct < 0.0 {
            return Err(CompareError::Config(format!(
                "threshold_pct must be zero or positive, got {}",
                self.compare.threshold_pct
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.compare.threshold_pct, 5.0);
        assert_eq!(config.compare.default_exchange_rate, 1.35);
        assert_eq!(config.shopify.api_version, "2024-07");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            [supabase]
            url = "https://abc.supabase.co"

            [compare]
            threshold_pct = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.supabase.url, "https://abc.supabase.co");
        assert_eq!(config.compare.threshold_pct, 10.0);
        assert_eq!(config.compare.default_exchange_rate, 1.35);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_toml("[supabase]\nurl = \"https://file\"\nkey = \"file-key\"\n").unwrap();
        let env: HashMap<&str, &str> = [("SUPABASE_URL", "https://env"), ("SHOPIFY_API_VERSION", " ")]
            .into_iter()
            .collect();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.supabase.url, "https://env");
        assert_eq!(config.supabase.key, "file-key");
        assert_eq!(config.shopify.api_version, "2024-07");
    }

    #[test]
    fn cli_overrides_beat_env_values() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "SHOPIFY_STORE_DOMAIN" => Some("env.myshopify.com".to_string()),
            "SHOPIFY_ADMIN_API_TOKEN" => Some("env-token".to_string()),
            _ => None,
        });
        config
            .shopify
            .apply_overrides(Some("cli.myshopify.com"), None, Some(" 2025-01 "));

        assert_eq!(config.shopify.domain, "cli.myshopify.com");
        assert_eq!(config.shopify.token, "env-token");
        assert_eq!(config.shopify.api_version, "2025-01");

        config.shopify.apply_overrides(Some(""), None, None);
        assert_eq!(config.shopify.domain, "cli.myshopify.com");
    }

    #[test]
    fn rejects_non_positive_default_rate() {
        let config = Config::from_toml("[compare]\ndefault_exchange_rate = 0.0\n").unwrap();
        assert!(matches!(config.validate(), Err(CompareError::Config(_))));
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.compare.threshold_pct, 5.0);
    }
}
