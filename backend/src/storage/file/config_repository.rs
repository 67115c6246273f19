//! # Budget Config Repository
//!
//! Budget settings live in a single YAML file `budget_config.yaml` at the
//! root of the data directory.
//!
//! ```yaml
//! currency_symbol: "£"
//! default_variable_categories:
//!   - Food
//!   - Transport
//!   - Entertainment
//!   - Clothing
//!   - Household
//! data_format_version: "1.0"
//! created_at: "2025-01-21T19:30:00Z"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;

use super::connection::FileConnection;
use crate::domain::money::{MoneyFormatter, DEFAULT_CURRENCY_SYMBOL};
use crate::storage::traits::ConfigStorage;

/// User budget settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Symbol used when formatting and stripped when parsing amounts
    pub currency_symbol: String,
    /// Categories seeded into a month that has none
    pub default_variable_categories: Vec<String>,
    /// Data format version for future migrations
    pub data_format_version: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            default_variable_categories: ["Food", "Transport", "Entertainment", "Clothing", "Household"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            data_format_version: "1.0".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl BudgetConfig {
    pub fn formatter(&self) -> MoneyFormatter {
        MoneyFormatter::new(&self.currency_symbol)
    }
}

/// YAML file repository for the budget settings
#[derive(Clone, Debug)]
pub struct ConfigRepository {
    connection: FileConnection,
}

impl ConfigRepository {
    pub fn new(connection: FileConnection) -> Self {
        Self { connection }
    }

    /// Load config from file, creating the default if it doesn't exist
    fn load_or_create_config(&self) -> Result<BudgetConfig> {
        let config_path = self.connection.config_path();

        if config_path.exists() {
            let yaml_content = fs::read_to_string(&config_path)?;
            let config: BudgetConfig = serde_yaml::from_str(&yaml_content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            debug!("Loaded budget config from {:?}", config_path);
            Ok(config)
        } else {
            let config = BudgetConfig::default();
            self.save_config(&config)?;
            info!("Created default budget config at {:?}", config_path);
            Ok(config)
        }
    }

    fn save_config(&self, config: &BudgetConfig) -> Result<()> {
        let yaml_content = serde_yaml::to_string(config)?;
        self.connection.write_atomically(&self.connection.config_path(), &yaml_content)
    }
}

impl ConfigStorage for ConfigRepository {
    fn get_config(&self) -> Result<BudgetConfig> {
        self.load_or_create_config()
    }

    fn update_config(&self, config: &BudgetConfig) -> Result<()> {
        let mut updated_config = config.clone();
        updated_config.updated_at = Utc::now().to_rfc3339();

        self.save_config(&updated_config)?;
        info!("Updated budget config");
        Ok(())
    }
}
