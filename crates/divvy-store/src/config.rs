//! # Divvy Configuration
//!
//! Loads parser, settlement and storage settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DIVVY_HEADER_ROWS=0                                                │
//! │     DIVVY_NAME_GAP=2                                                   │
//! │     DIVVY_RESIDUE_POLICY=redistribute                                  │
//! │     DIVVY_LEDGER_PATH=/srv/divvy/shoppers.txt                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/divvy/divvy.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.divvy.divvy/divvy.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     header_rows = 4, name_gap = 3, residue = ignore                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # divvy.toml
//! [parser]
//! header_rows = 4
//! name_gap = 3          # 2 for the two-space layout family
//! total_marker = "TOTAL"
//!
//! [settlement]
//! residue = "ignore"    # ignore | redistribute
//!
//! [storage]
//! ledger_path = "/home/ann/.local/share/divvy/shoppers.txt"
//! ```

use std::path::PathBuf;

use divvy_core::parser::ParserProfile;
use divvy_core::settlement::{ResiduePolicy, SettlementPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::ledger::ShopperLedger;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "divvy.toml";

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the shopper ledger lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Explicit ledger path. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
}

// =============================================================================
// Divvy Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivvyConfig {
    #[serde(default)]
    pub parser: ParserProfile,

    #[serde(default)]
    pub settlement: SettlementPolicy,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl DivvyConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (divvy.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents =
                    std::fs::read_to_string(&path).map_err(StoreError::io(&path))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        self.parser.validate()?;

        if let Some(path) = &self.storage.ledger_path {
            if path.as_os_str().is_empty() {
                return Err(StoreError::InvalidConfig(
                    "storage.ledger_path must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// The ledger this config points at.
    pub fn ledger(&self) -> StoreResult<ShopperLedger> {
        self.storage
            .ledger_path
            .clone()
            .or_else(ShopperLedger::default_path)
            .map(ShopperLedger::new)
            .ok_or(StoreError::NoPath("ledger"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rows) = lookup("DIVVY_HEADER_ROWS") {
            match rows.parse::<usize>() {
                Ok(rows) => {
                    debug!(header_rows = rows, "Overriding header rows from environment");
                    self.parser.header_rows = rows;
                }
                Err(_) => warn!(value = %rows, "Ignoring non-numeric DIVVY_HEADER_ROWS"),
            }
        }

        if let Some(gap) = lookup("DIVVY_NAME_GAP") {
            match gap.parse::<usize>() {
                Ok(gap) => {
                    debug!(name_gap = gap, "Overriding name gap from environment");
                    self.parser.name_gap = gap;
                }
                Err(_) => warn!(value = %gap, "Ignoring non-numeric DIVVY_NAME_GAP"),
            }
        }

        if let Some(policy) = lookup("DIVVY_RESIDUE_POLICY") {
            match policy.parse::<ResiduePolicy>() {
                Ok(parsed) => {
                    debug!(policy = %parsed, "Overriding residue policy from environment");
                    self.settlement.residue = parsed;
                }
                Err(e) => warn!(error = %e, "Ignoring DIVVY_RESIDUE_POLICY"),
            }
        }

        if let Some(path) = lookup("DIVVY_LEDGER_PATH") {
            debug!(path = %path, "Overriding ledger path from environment");
            self.storage.ledger_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "divvy", "divvy")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
