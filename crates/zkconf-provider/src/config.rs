//! # Provider Settings
//!
//! Connection and mapping settings read when the first provider starts.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ZKCONF_IP_ADDRESS=10.0.0.5                                         │
//! │     ZKCONF_MAPPINGS='{"blocks": 3, "default": 1}'                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/zkconf/provider.toml (Linux)                             │
//! │     ~/Library/Application Support/io.zkconf.zkconf/provider.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     127.0.0.1:2181, /nio_configuration, {"default": 1}                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [providers]
//! ip_address = "127.0.0.1"
//! port = 2181
//! root_path = "/nio_configuration"
//!
//! # Either a JSON string...
//! mappings = '{"modules": 2, "blocks": 3, "default": 1}'
//!
//! # ...or an inline table
//! # [providers.mappings]
//! # modules = 2
//! # default = 1
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use zkconf_core::{NodePath, ShardMappings, DEFAULT_MAPPING_KEY, FALLBACK_SHARD};

use crate::error::{ProviderError, ProviderResult};

// =============================================================================
// Mappings Setting
// =============================================================================

/// The mapping table as it appears in settings: a raw JSON string or an
/// already-structured table. Normalized by [`MappingsSetting::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingsSetting {
    /// `mappings = '{"default": 1}'`
    Json(String),

    /// `[providers.mappings]` table.
    Table(Map<String, Value>),
}

impl MappingsSetting {
    /// Parses into a typed table, failing fast on invalid input.
    pub fn parse(&self) -> ProviderResult<ShardMappings> {
        let mappings = match self {
            MappingsSetting::Json(raw) => ShardMappings::from_json(raw)?,
            MappingsSetting::Table(map) => ShardMappings::from_map(map)?,
        };
        Ok(mappings)
    }
}

impl Default for MappingsSetting {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert(DEFAULT_MAPPING_KEY.to_string(), Value::from(FALLBACK_SHARD));
        MappingsSetting::Table(map)
    }
}

// =============================================================================
// Provider Settings
// =============================================================================

/// Settings recognized at provider construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Coordination service address.
    #[serde(default = "default_ip_address")]
    pub ip_address: String,

    /// Coordination service port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Store path all configuration lives under.
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Name → shard table.
    #[serde(default)]
    pub mappings: MappingsSetting,
}

fn default_ip_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2181
}

fn default_root_path() -> String {
    "/nio_configuration".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            ip_address: default_ip_address(),
            port: default_port(),
            root_path: default_root_path(),
            mappings: MappingsSetting::default(),
        }
    }
}

/// On-disk layout: settings live under `[providers]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    providers: ProviderSettings,
}

impl ProviderSettings {
    /// Loads settings from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (provider.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ProviderResult<Self> {
        let mut settings = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading provider settings from file");
                let contents = std::fs::read_to_string(&path)?;
                settings = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Settings file not found, using defaults");
            }
        }

        settings.apply_env_overrides();
        settings.validate()?;

        Ok(settings)
    }

    /// Loads settings or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load provider settings: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses the `[providers]` section of a TOML document.
    pub fn from_toml(contents: &str) -> ProviderResult<Self> {
        let file: SettingsFile = toml::from_str(contents)?;
        Ok(file.providers)
    }

    /// Saves settings to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ProviderResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ProviderError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ProviderError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(&SettingsFile {
            providers: self.clone(),
        })?;
        std::fs::write(&path, contents).map_err(|e| ProviderError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Provider settings saved");
        Ok(())
    }

    /// Validates the settings.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.ip_address.trim().is_empty() {
            return Err(ProviderError::InvalidConfig(
                "ip_address must not be empty".into(),
            ));
        }

        if self.port == 0 {
            return Err(ProviderError::InvalidConfig(
                "port must be greater than 0".into(),
            ));
        }

        self.root()?;
        self.mappings.parse()?;

        Ok(())
    }

    /// Returns the validated root path.
    pub fn root(&self) -> ProviderResult<NodePath> {
        NodePath::parse(&self.root_path).map_err(|e| {
            ProviderError::InvalidConfig(format!("root_path: {}", e))
        })
    }

    /// Applies `ZKCONF_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup("ZKCONF_IP_ADDRESS") {
            debug!(%address, "Overriding ip_address from environment");
            self.ip_address = address;
        }

        if let Some(port) = lookup("ZKCONF_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.port = p;
                }
                Err(_) => warn!(%port, "Ignoring unparseable ZKCONF_PORT"),
            }
        }

        if let Some(root) = lookup("ZKCONF_ROOT_PATH") {
            debug!(%root, "Overriding root_path from environment");
            self.root_path = root;
        }

        if let Some(raw) = lookup("ZKCONF_MAPPINGS") {
            debug!("Overriding mappings from environment");
            self.mappings = MappingsSetting::Json(raw);
        }
    }

    /// Returns the default settings file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "zkconf", "zkconf")
            .map(|dirs| dirs.config_dir().join("provider.toml"))
    }

    /// Returns `address:port`.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.ip_address, "127.0.0.1");
        assert_eq!(settings.port, 2181);
        assert_eq!(settings.root_path, "/nio_configuration");
        assert_eq!(settings.mappings.parse().unwrap().resolve("anything").as_str(), "1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_mappings_as_json_string() {
        let settings = ProviderSettings::from_toml(
            r#"
            [providers]
            mappings = '{"modules": "A", "default": "B"}'
            "#,
        )
        .unwrap();
        let mappings = settings.mappings.parse().unwrap();
        assert_eq!(mappings.resolve("modules").as_str(), "A");
        assert_eq!(mappings.resolve("blocks").as_str(), "B");
        assert_eq!(settings.port, 2181);
    }

    #[test]
    fn test_mappings_as_table() {
        let settings = ProviderSettings::from_toml(
            r#"
            [providers]
            ip_address = "10.0.0.5"
            root_path = "/root"

            [providers.mappings]
            blocks = 3
            default = 1
            "#,
        )
        .unwrap();
        assert_eq!(settings.endpoint(), "10.0.0.5:2181");
        let mappings = settings.mappings.parse().unwrap();
        assert_eq!(mappings.resolve("blocks").as_str(), "3");
        assert_eq!(mappings.resolve("modules").as_str(), "1");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = ProviderSettings::from_toml("").unwrap();
        assert_eq!(settings, ProviderSettings::default());
    }

    #[test]
    fn test_validation() {
        let mut settings = ProviderSettings::default();

        settings.port = 0;
        assert!(settings.validate().unwrap_err().is_config_error());

        settings.port = 2181;
        settings.root_path = "relative/path".into();
        assert!(settings.validate().unwrap_err().is_config_error());

        settings.root_path = "/root".into();
        settings.mappings = MappingsSetting::Json("not json".into());
        assert!(settings.validate().unwrap_err().is_config_error());

        settings.mappings = MappingsSetting::Json(r#"{"default": 2}"#.into());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ZKCONF_IP_ADDRESS", "zk.internal"),
            ("ZKCONF_PORT", "2182"),
            ("ZKCONF_ROOT_PATH", "/cluster_a"),
            ("ZKCONF_MAPPINGS", r#"{"blocks": 5}"#),
        ]
        .into_iter()
        .collect();

        let mut settings = ProviderSettings::default();
        settings.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.endpoint(), "zk.internal:2182");
        assert_eq!(settings.root_path, "/cluster_a");
        assert_eq!(settings.mappings.parse().unwrap().resolve("blocks").as_str(), "5");
    }

    #[test]
    fn test_bad_port_override_is_ignored() {
        let mut settings = ProviderSettings::default();
        settings.apply_overrides_from(|key| (key == "ZKCONF_PORT").then(|| "nope".to_string()));
        assert_eq!(settings.port, 2181);
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = ProviderSettings::default();
        let text = toml::to_string_pretty(&SettingsFile {
            providers: settings.clone(),
        })
        .unwrap();
        assert!(text.contains("[providers]"));
        assert_eq!(ProviderSettings::from_toml(&text).unwrap(), settings);
    }
}
