//! # Storage Traits
//!
//! Storage abstractions used by the month service. The reconciliation engine
//! never touches storage itself; it works on `MonthRecord` snapshots that the
//! service loads and saves through these traits.

use anyhow::Result;
use std::collections::BTreeMap;

use shared::MonthRecord;

use super::file::config_repository::BudgetConfig;

/// Persistence of month records keyed by month key ("2025-04")
pub trait MonthStorage: Send + Sync {
    /// Load a month, `None` when it has never been saved
    fn get_month(&self, key: &str) -> Result<Option<MonthRecord>>;

    /// Create or replace a month
    fn save_month(&self, key: &str, record: &MonthRecord) -> Result<()>;

    /// Every stored month, ordered by key
    fn get_all_months(&self) -> Result<BTreeMap<String, MonthRecord>>;

    /// Delete a month. Returns true if the month existed.
    fn delete_month(&self, key: &str) -> Result<bool>;
}

/// Persistence of the user's budget settings
pub trait ConfigStorage: Send + Sync {
    /// Get the settings, creating defaults on first use
    fn get_config(&self) -> Result<BudgetConfig>;

    /// Replace the settings
    fn update_config(&self, config: &BudgetConfig) -> Result<()>;
}
