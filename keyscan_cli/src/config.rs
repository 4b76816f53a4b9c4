use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use keyscan_core::ProgressOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub progress: ProgressOptions,

    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns applied when none are given on the command line
    pub patterns: Vec<String>,
    /// Artificial pause after each key, in milliseconds
    pub delay_ms: u64,
}

/// Configuration manager that handles platform paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Create a new ConfigManager with the default platform path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    fn default_config_path() -> PathBuf {
        // Check for XDG_CONFIG_HOME override first (Linux/macOS)
        #[cfg(not(target_os = "windows"))]
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("keyscan/config.toml");
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyscan")
            .join("config.toml")
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    ///
    /// Command line flags are applied on top by the caller.
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new();

        // Layer 1: Defaults
        figment = figment.merge(Serialized::defaults(AppConfig::default()));

        // Layer 2: Config file (if exists)
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        // Layer 3: Environment variables
        figment = figment.merge(Env::prefixed("KEYSCAN_").split("__"));

        let config: AppConfig = figment.extract().context("Failed to load configuration")?;
        config
            .progress
            .validate()
            .context("Invalid progress configuration")?;
        Ok(config)
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = self.load_as_toml()?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        Self::display_value(current)
            .ok_or_else(|| anyhow::anyhow!("Value at '{}' is not a simple type", key))
    }

    /// List all configuration values
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = self.load_as_toml()?;

        let mut items = Vec::new();
        Self::collect_values(&value, String::new(), &mut items);
        items.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(items)
    }

    fn load_as_toml(&self) -> Result<toml::Value> {
        let config = self.load()?;
        let toml_string = toml::to_string(&config)?;
        Ok(toml::from_str(&toml_string)?)
    }

    /// Recursively collect all key-value pairs from TOML
    fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let new_prefix = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    Self::collect_values(val, new_prefix, items);
                }
            }
            other => {
                if let Some(display) = Self::display_value(other) {
                    items.push((prefix, display));
                }
            }
        }
    }

    /// Render a scalar or array as shown by `config get` and `config show`
    ///
    /// Arrays are comma-joined, with strings unquoted.
    fn display_value(value: &toml::Value) -> Option<String> {
        match value {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            toml::Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }
}
