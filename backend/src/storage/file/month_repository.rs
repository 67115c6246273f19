//! # Month Repository
//!
//! Stores each month as `months/<key>.json` inside the data directory.
//!
//! ```json
//! {
//!   "key": "2025-04",
//!   "year": 2025,
//!   "month": 4,
//!   "monthName": "April",
//!   "incomeSources": [],
//!   "fixedCosts": [],
//!   "variableCosts": [{ "category": "Food", "estimatedAmount": 280.0, ... }],
//!   "unplannedExpenses": [],
//!   "pots": [],
//!   "weeklyBreakdown": [{ "dateRange": "1-6", "paymentsDue": "", "cells": { "food": "Estimate: £56.00\n=" }, ... }],
//!   "createdAt": "2025-04-01T08:00:00+00:00",
//!   "updatedAt": "2025-04-03T19:12:44+00:00"
//! }
//! ```

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use shared::MonthRecord;

use super::connection::FileConnection;
use crate::storage::traits::MonthStorage;

/// JSON file repository for month records
#[derive(Clone, Debug)]
pub struct MonthRepository {
    connection: FileConnection,
}

impl MonthRepository {
    pub fn new(connection: FileConnection) -> Self {
        Self { connection }
    }

    fn month_path(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names, so only accept the canonical form
        MonthRecord::parse_key(key).with_context(|| format!("Invalid month key '{}'", key))?;
        Ok(self.connection.months_directory().join(format!("{}.json", key)))
    }

    fn read_month_file(&self, path: &Path) -> Result<MonthRecord> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read month file {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse month file {}", path.display()))?;
        Ok(record)
    }
}

impl MonthStorage for MonthRepository {
    fn get_month(&self, key: &str) -> Result<Option<MonthRecord>> {
        let path = self.month_path(key)?;
        if !path.exists() {
            debug!("Month {} not found at {}", key, path.display());
            return Ok(None);
        }

        let record = self.read_month_file(&path)?;
        debug!("Loaded month {} from {}", key, path.display());
        Ok(Some(record))
    }

    fn save_month(&self, key: &str, record: &MonthRecord) -> Result<()> {
        let path = self.month_path(key)?;
        let json = serde_json::to_string_pretty(record)?;
        self.connection.write_atomically(&path, &json)?;
        info!("Saved month {} ({} weekly rows)", key, record.weekly_breakdown.len());
        Ok(())
    }

    fn get_all_months(&self) -> Result<BTreeMap<String, MonthRecord>> {
        let months_dir = self.connection.months_directory();
        let mut months = BTreeMap::new();
        if !months_dir.exists() {
            return Ok(months);
        }

        for entry in fs::read_dir(&months_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if MonthRecord::parse_key(&key).is_err() {
                warn!("Skipping unexpected file in months directory: {}", path.display());
                continue;
            }
            let record = self.read_month_file(&path)?;
            months.insert(key, record);
        }

        debug!("Loaded {} months from {}", months.len(), months_dir.display());
        Ok(months)
    }

    fn delete_month(&self, key: &str) -> Result<bool> {
        let path = self.month_path(key)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
        info!("Deleted month {}", key);
        Ok(true)
    }
}
