//! # Shopper Ledger
//!
//! Flat-file persistence of each shopper's cumulative spending.
//!
//! ## File Format
//! ```text
//! ann,125.40
//! bob,0.00
//! ```
//! One shopper per line, `name,spending_tracker`, no header, no quoting.
//! Names are validated on load and on registration, so a comma can never
//! be written into a name. Amounts with more than two fraction digits
//! (`ann,5.300000000000001`) are rounded to the cent on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use divvy_core::money::Money;
use divvy_core::session::SpendingStore;
use divvy_core::validation::validate_participant_name;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// File name used inside the platform data directory.
pub const LEDGER_FILE_NAME: &str = "shoppers.txt";

/// The `shoppers.txt` ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopperLedger {
    path: PathBuf,
}

impl ShopperLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ShopperLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `shoppers.txt` in the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "divvy", "divvy")
            .map(|dirs| dirs.data_dir().join(LEDGER_FILE_NAME))
    }

    fn parse(contents: &str) -> StoreResult<BTreeMap<String, Money>> {
        let mut spending = BTreeMap::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line = idx + 1;
            if raw.trim().is_empty() {
                continue;
            }

            let (name, amount) = raw.split_once(',').ok_or_else(|| StoreError::CorruptLedger {
                line,
                reason: "expected name,amount".to_string(),
            })?;

            let name = validate_participant_name(name).map_err(|err| StoreError::CorruptLedger {
                line,
                reason: err.to_string(),
            })?;
            let amount = Money::parse_rounded(amount).map_err(|err| StoreError::CorruptLedger {
                line,
                reason: err.to_string(),
            })?;

            if spending.insert(name.clone(), amount).is_some() {
                return Err(StoreError::CorruptLedger {
                    line,
                    reason: format!("shopper '{}' listed twice", name),
                });
            }
        }

        Ok(spending)
    }

    fn render(spending: &BTreeMap<String, Money>) -> String {
        spending
            .iter()
            .map(|(name, amount)| format!("{},{}\n", name, amount.to_decimal_string()))
            .collect()
    }
}

impl SpendingStore for ShopperLedger {
    type Error = StoreError;

    fn load(&self) -> StoreResult<BTreeMap<String, Money>> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No shopper ledger yet");
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(StoreError::io(&self.path))?;
        let spending = Self::parse(&contents)?;
        info!(path = ?self.path, shoppers = spending.len(), "Loaded shopper ledger");
        Ok(spending)
    }

    fn save(&self, spending: &BTreeMap<String, Money>) -> StoreResult<()> {
        if spending.is_empty() {
            debug!(path = ?self.path, "No shoppers registered, ledger left untouched");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }
        std::fs::write(&self.path, Self::render(spending)).map_err(StoreError::io(&self.path))?;

        info!(path = ?self.path, shoppers = spending.len(), "Saved shopper ledger");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
