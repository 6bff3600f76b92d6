//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/freetime/config.toml` by default. Every key is optional.
//!
//! ```toml
//! [graph]
//! timezone = "Asia/Tokyo"
//! default_domain = "example.com"
//! timeout_secs = 10
//!
//! [schedule]
//! slot_minutes = 15
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use freetime_core::{ME, SlotGranularity};
use freetime_graph::GraphConfig;

/// Configuration for the freetime client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Calendar service settings.
    pub graph: GraphSettings,

    /// Defaults for the `free` command.
    pub schedule: ScheduleSettings,
}

/// Calendar service settings. Unset keys fall back to [`GraphConfig`]
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Identity platform authority.
    pub authority: Option<String>,

    /// Graph API root URL.
    pub graph_root: Option<String>,

    /// Scopes sent with the refresh grant.
    pub scopes: Option<Vec<String>>,

    /// Timezone the service answers in.
    pub timezone: Option<String>,

    /// Domain appended to bare attendee names.
    pub default_domain: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Path to the credential record.
    pub credential_path: Option<PathBuf>,

    /// `$top` for list queries.
    pub page_size: Option<u32>,
}

/// Defaults for availability queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Whose calendar issues the availability request.
    pub organizer: String,

    /// Slot length in minutes.
    pub slot_minutes: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            organizer: ME.to_string(),
            slot_minutes: SlotGranularity::DEFAULT_MINUTES,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freetime")
    }

    /// Builds the library configuration, with `credential_override` (from
    /// `--credential` or `FREETIME_CREDENTIAL`) taking precedence over the
    /// file.
    pub fn to_graph_config(&self, credential_override: Option<&Path>) -> GraphConfig {
        let settings = &self.graph;
        let mut config = GraphConfig::new();

        if let Some(ref authority) = settings.authority {
            config = config.with_authority(authority);
        }
        if let Some(ref root) = settings.graph_root {
            config = config.with_graph_root(root);
        }
        if let Some(ref scopes) = settings.scopes {
            config = config.with_scopes(scopes.clone());
        }
        if let Some(ref timezone) = settings.timezone {
            config = config.with_timezone(timezone);
        }
        if let Some(ref domain) = settings.default_domain {
            config = config.with_default_domain(domain);
        }
        if let Some(secs) = settings.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(page_size) = settings.page_size {
            config = config.with_page_size(page_size);
        }

        match credential_override.or(settings.credential_path.as_deref()) {
            Some(path) => config.with_credential_path(path),
            None => config,
        }
    }

    /// Default slot length, validated.
    pub fn slot(&self) -> Result<SlotGranularity, String> {
        SlotGranularity::new(self.schedule.slot_minutes)
            .map_err(|e| format!("schedule.slot_minutes: {}", e.message()))
    }
}
