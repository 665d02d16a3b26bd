//! # Console Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CONSOLE_COLLABORATOR_SOURCE=gateway_scoped                         │
//! │     CONSOLE_INTENT_CAPACITY=128                                        │
//! │     CONSOLE_LOG=debug                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     explicit path, else $CONSOLE_CONFIG, else                          │
//! │     ~/.config/device-console/console.toml (Linux)                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # console.toml
//! [ids]
//! device = [["ids.device_id"], ["device_id"], ["id"]]
//! # composite keys: list only composites, e.g.
//! # device = [["ids.application_ids.application_id", "ids.device_id"]]
//! gateway = [["ids.gateway_id"]]
//!
//! [binding]
//! collaborator_source = "shared"  # shared | gateway_scoped
//!
//! [store]
//! intent_capacity = 64
//!
//! [logging]
//! filter = "info,console=debug"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use console_core::ids::{default_device_paths, default_gateway_paths};
use console_core::{FallbackSelector, ListKind, Reducer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Collaborator Source
// =============================================================================

/// Where the gateway overview reads collaborator counts from.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SHARED (Default)                   │  GATEWAY_SCOPED                   │
/// │  ────────────────                   │  ──────────────                   │
/// │  GET_COLLABORATORS_LIST             │  GET_GTW_COLLABORATORS_LIST       │
/// │  { parentType: "gateway", id }      │  { id }                           │
/// │  reads `collaborators` slice        │  reads `gateway_collaborators`    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorSource {
    /// Generic collaborators endpoint, addressed by parent kind and id.
    #[default]
    Shared,

    /// Gateway-specific collaborators endpoint.
    GatewayScoped,
}

impl CollaboratorSource {
    /// The list slice (and request action) backing this source.
    pub fn list_kind(&self) -> ListKind {
        match self {
            CollaboratorSource::Shared => ListKind::Collaborators,
            CollaboratorSource::GatewayScoped => ListKind::GatewayCollaborators,
        }
    }
}

impl fmt::Display for CollaboratorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorSource::Shared => write!(f, "shared"),
            CollaboratorSource::GatewayScoped => write!(f, "gateway_scoped"),
        }
    }
}

impl FromStr for CollaboratorSource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "shared" | "generic" => Ok(CollaboratorSource::Shared),
            "gateway_scoped" | "gateway" | "gtw" => Ok(CollaboratorSource::GatewayScoped),
            other => Err(StoreError::InvalidConfig(format!(
                "Unknown collaborator source: '{}'. Valid options: shared, gateway_scoped",
                other
            ))),
        }
    }
}

// =============================================================================
// Settings Sections
// =============================================================================

/// Identifier paths for keyed slices.
///
/// Each entry is one alternative; the paths inside an alternative are joined
/// with `/` to form a composite key. The first alternative that resolves wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdSettings {
    #[serde(default = "default_device_paths")]
    pub device: Vec<Vec<String>>,

    #[serde(default = "default_gateway_paths")]
    pub gateway: Vec<Vec<String>>,
}

impl Default for IdSettings {
    fn default() -> Self {
        IdSettings {
            device: default_device_paths(),
            gateway: default_gateway_paths(),
        }
    }
}

impl IdSettings {
    pub fn device_selector(&self) -> StoreResult<FallbackSelector> {
        Ok(FallbackSelector::from_paths(&self.device)?)
    }

    pub fn gateway_selector(&self) -> StoreResult<FallbackSelector> {
        Ok(FallbackSelector::from_paths(&self.gateway)?)
    }

    /// Builds the root reducer with the configured selectors.
    pub fn reducer(&self) -> StoreResult<Reducer> {
        Ok(Reducer::new(
            Box::new(self.device_selector()?),
            Box::new(self.gateway_selector()?),
        ))
    }
}

/// View binding settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingSettings {
    #[serde(default)]
    pub collaborator_source: CollaboratorSource,
}

/// Store runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Buffer size of the fetch intent channel. Slow intent consumers that
    /// fall further behind than this miss intents.
    #[serde(default = "default_intent_capacity")]
    pub intent_capacity: usize,
}

/// Largest accepted `intent_capacity`.
pub const MAX_INTENT_CAPACITY: usize = 65_536;

fn default_intent_capacity() -> usize {
    64
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            intent_capacity: default_intent_capacity(),
        }
    }
}

/// Logging settings. `RUST_LOG` still takes precedence at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,console=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete console configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub ids: IdSettings,

    #[serde(default)]
    pub binding: BindingSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ConsoleConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (console.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("CONSOLE_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading console config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
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

        info!(?path, "Console config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.ids.device.is_empty() {
            return Err(StoreError::InvalidConfig(
                "ids.device must list at least one path".into(),
            ));
        }
        if self.ids.gateway.is_empty() {
            return Err(StoreError::InvalidConfig(
                "ids.gateway must list at least one path".into(),
            ));
        }
        self.ids.device_selector()?;
        self.ids.gateway_selector()?;

        if self.store.intent_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "intent_capacity must be greater than 0".into(),
            ));
        }
        if self.store.intent_capacity > MAX_INTENT_CAPACITY {
            return Err(StoreError::InvalidConfig(format!(
                "intent_capacity must be at most {}",
                MAX_INTENT_CAPACITY
            )));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(StoreError::InvalidConfig("logging.filter is empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup("CONSOLE_COLLABORATOR_SOURCE") {
            match source.parse() {
                Ok(parsed) => {
                    debug!(source = %source, "Overriding collaborator source from environment");
                    self.binding.collaborator_source = parsed;
                }
                Err(_) => warn!(source = %source, "Unknown collaborator source in environment"),
            }
        }

        if let Some(capacity) = lookup("CONSOLE_INTENT_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                self.store.intent_capacity = c;
            }
        }

        if let Some(filter) = lookup("CONSOLE_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "lorawan", "device-console")
            .map(|dirs| dirs.config_dir().join("console.toml"))
    }

    /// Returns the collaborator source.
    pub fn collaborator_source(&self) -> CollaboratorSource {
        self.binding.collaborator_source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_collaborator_source_parsing() {
        assert_eq!(
            "shared".parse::<CollaboratorSource>().unwrap(),
            CollaboratorSource::Shared
        );
        assert_eq!(
            "gateway-scoped".parse::<CollaboratorSource>().unwrap(),
            CollaboratorSource::GatewayScoped
        );
        assert_eq!(
            "GATEWAY_SCOPED".parse::<CollaboratorSource>().unwrap(),
            CollaboratorSource::GatewayScoped
        );
        assert!("both".parse::<CollaboratorSource>().is_err());
    }

    #[test]
    fn test_source_list_kinds() {
        assert_eq!(CollaboratorSource::Shared.list_kind(), ListKind::Collaborators);
        assert_eq!(
            CollaboratorSource::GatewayScoped.list_kind(),
            ListKind::GatewayCollaborators
        );
    }

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.collaborator_source(), CollaboratorSource::Shared);
        assert_eq!(config.store.intent_capacity, 64);
        assert_eq!(config.ids.device, default_device_paths());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [binding]
            collaborator_source = "gateway_scoped"

            [ids]
            device = [["id"]]
            "#,
        )
        .unwrap();

        assert_eq!(config.collaborator_source(), CollaboratorSource::GatewayScoped);
        assert_eq!(config.ids.device, vec![vec!["id".to_string()]]);
        assert_eq!(config.ids.gateway, default_gateway_paths());
        assert_eq!(config.logging.filter, "info,console=debug");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConsoleConfig::default();

        config.store.intent_capacity = 0;
        assert!(config.validate().is_err());

        config.store.intent_capacity = MAX_INTENT_CAPACITY + 1;
        assert!(config.validate().unwrap_err().is_config_error());

        config.store.intent_capacity = MAX_INTENT_CAPACITY;
        assert!(config.validate().is_ok());

        config.store.intent_capacity = 8;
        config.ids.device = vec![vec!["ids..device_id".to_string()]];
        assert!(config.validate().unwrap_err().is_config_error());

        config.ids.device = vec![];
        assert!(config.validate().is_err());

        config.ids.device = vec![vec!["id".to_string()]];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("CONSOLE_COLLABORATOR_SOURCE", "gateway_scoped"),
            ("CONSOLE_INTENT_CAPACITY", "128"),
            ("CONSOLE_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.collaborator_source(), CollaboratorSource::GatewayScoped);
        assert_eq!(config.store.intent_capacity, 128);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_oversized_capacity_from_environment_is_rejected() {
        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| match key {
            "CONSOLE_INTENT_CAPACITY" => Some(usize::MAX.to_string()),
            _ => None,
        });

        assert_eq!(config.store.intent_capacity, usize::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = ConsoleConfig::default();
        config.apply_overrides(|key| match key {
            "CONSOLE_COLLABORATOR_SOURCE" => Some("both".to_string()),
            "CONSOLE_INTENT_CAPACITY" => Some("lots".to_string()),
            _ => None,
        });

        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn test_load_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("console.toml");

        let mut config = ConsoleConfig::default();
        config.binding.collaborator_source = CollaboratorSource::GatewayScoped;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[binding]"));
        assert!(contents.contains("gateway_scoped"));

        let parsed: ConsoleConfig = toml::from_str(&contents).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        std::fs::write(&path, "[store]\nintent_capacity = \"many\"\n").unwrap();

        let err = ConsoleConfig::load(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_configured_reducer_uses_paths() {
        let ids = IdSettings {
            device: vec![vec!["ids.dev_eui".to_string()]],
            ..IdSettings::default()
        };
        let reducer = ids.reducer().unwrap();

        let state = reducer.reduce(
            &std::sync::Arc::new(console_core::ConsoleState::new()),
            &console_core::Action::UpsertDevice(
                serde_json::json!({ "ids": { "dev_eui": "70B3D57ED0000001" } })
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );
        assert!(state.devices.get("70B3D57ED0000001").is_some());
    }
}
