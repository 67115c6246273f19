//! Month service: orchestration between storage and the reconciliation engine.
//!
//! The engine itself is pure. This service is the layer above it that loads a
//! month, applies an edit, runs the reconciliation pass, stamps timestamps and
//! saves the result.

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use shared::{MonthRecord, ReconciledMonth, VariableCost};

use super::aggregation::ReconciliationService;
use super::calendar::CalendarService;
use super::schema;
use super::validation::validate_month;
use crate::storage::{BudgetConfig, MonthStorage};

#[derive(Clone)]
pub struct MonthService<S: MonthStorage> {
    storage: Arc<S>,
    calendar: CalendarService,
    reconciliation: ReconciliationService,
}

impl<S: MonthStorage> MonthService<S> {
    pub fn new(storage: Arc<S>, config: &BudgetConfig) -> Self {
        Self {
            storage,
            calendar: CalendarService::new(),
            reconciliation: ReconciliationService::new(
                config.formatter(),
                config.default_variable_categories.clone(),
            ),
        }
    }

    pub fn reconciliation(&self) -> &ReconciliationService {
        &self.reconciliation
    }

    /// Build a fresh, reconciled month without saving it
    pub fn create_month(&self, year: i32, month: u32) -> Result<ReconciledMonth> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month: {}. Must be between 1 and 12", month));
        }

        let now = Utc::now().to_rfc3339();
        let record = MonthRecord {
            key: MonthRecord::generate_key(year, month),
            year,
            month,
            month_name: self.calendar.month_name(month).to_string(),
            created_at: now.clone(),
            updated_at: now,
            ..Default::default()
        };

        Ok(self.reconciliation.reconcile(record))
    }

    /// Build a month that carries the plan of the previous stored month
    /// forward: income sources, fixed costs, category budgets and pots. Paid
    /// flags and actual figures are reset and the weekly breakdown starts
    /// empty. Falls back to a fresh month when there is no previous month.
    pub fn create_month_from_previous(&self, year: i32, month: u32) -> Result<ReconciledMonth> {
        let mut fresh = self.create_month(year, month)?.record;

        let (prev_month, prev_year) = self.calendar.previous_month(month, year);
        let prev_key = MonthRecord::generate_key(prev_year, prev_month);
        let Some(previous) = self.storage.get_month(&prev_key)? else {
            info!("📅 MONTH: No previous month {} to copy, creating {} fresh", prev_key, fresh.key);
            return Ok(self.reconciliation.reconcile(fresh));
        };

        fresh.income_sources = previous
            .income_sources
            .into_iter()
            .map(|mut source| {
                source.actual_amount = 0.0;
                source
            })
            .collect();
        fresh.fixed_costs = previous
            .fixed_costs
            .into_iter()
            .map(|mut cost| {
                cost.actual_amount = 0.0;
                cost.paid = false;
                cost
            })
            .collect();
        fresh.variable_costs = previous
            .variable_costs
            .into_iter()
            .map(|cost| VariableCost {
                actual_amount: 0.0,
                ..cost
            })
            .collect();
        fresh.pots = previous
            .pots
            .into_iter()
            .map(|mut pot| {
                pot.actual_amount = 0.0;
                pot
            })
            .collect();

        info!("📅 MONTH: Created {} from previous month {}", fresh.key, prev_key);
        Ok(self.reconciliation.reconcile(fresh))
    }

    /// Load a month and reconcile it, creating and saving it first if needed
    pub fn get_or_create_month(&self, year: i32, month: u32) -> Result<ReconciledMonth> {
        let key = MonthRecord::generate_key(year, month);
        if let Some(reconciled) = self.load_and_reconcile(&key)? {
            return Ok(reconciled);
        }

        let created = self.create_month_from_previous(year, month)?;
        self.storage.save_month(&key, &created.record)?;
        Ok(created)
    }

    /// Load a stored month and run the reconciliation pass over it
    pub fn load_and_reconcile(&self, key: &str) -> Result<Option<ReconciledMonth>> {
        let record = self.storage.get_month(key)?;
        Ok(record.map(|r| self.reconciliation.reconcile(r)))
    }

    /// Validate, reconcile and save an edited month
    pub fn update_month(&self, record: MonthRecord) -> Result<ReconciledMonth> {
        let errors = validate_month(&record);
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            warn!("📅 MONTH: Rejected update of {}: {}", record.key, messages.join("; "));
            return Err(anyhow!("Invalid month {}: {}", record.key, messages.join("; ")));
        }

        let mut reconciled = self.reconciliation.reconcile(record);
        reconciled.record.updated_at = Utc::now().to_rfc3339();
        if reconciled.record.created_at.is_empty() {
            reconciled.record.created_at = reconciled.record.updated_at.clone();
        }

        self.storage.save_month(&reconciled.record.key, &reconciled.record)?;
        Ok(reconciled)
    }

    /// Every stored month, oldest first
    pub fn list_months(&self) -> Result<Vec<MonthRecord>> {
        Ok(self.storage.get_all_months()?.into_values().collect())
    }

    pub fn add_category(&self, key: &str, name: &str, monthly_budget: f64) -> Result<ReconciledMonth> {
        let mut record = self.require_month(key)?;
        schema::add_category(&mut record, name, monthly_budget)?;
        self.update_month(record)
    }

    pub fn rename_category(&self, key: &str, from: &str, to: &str) -> Result<ReconciledMonth> {
        let mut record = self.require_month(key)?;
        schema::rename_category(&mut record, from, to)?;
        self.update_month(record)
    }

    /// Remove a category and its weekly cells. This cannot be undone.
    pub fn remove_category(&self, key: &str, name: &str) -> Result<ReconciledMonth> {
        let mut record = self.require_month(key)?;
        schema::remove_category(&mut record, name)?;
        self.update_month(record)
    }

    fn require_month(&self, key: &str) -> Result<MonthRecord> {
        self.storage
            .get_month(key)?
            .ok_or_else(|| anyhow!("Month not found: {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::test_utils::{sample_month, setup_test_connection};
    use crate::storage::MonthRepository;
    use tempfile::TempDir;

    fn setup_service() -> (MonthService<MonthRepository>, Arc<MonthRepository>, TempDir) {
        let (connection, temp_dir) = setup_test_connection();
        let repo = Arc::new(MonthRepository::new(connection));
        let config = BudgetConfig {
            default_variable_categories: vec!["Food".to_string(), "Fun".to_string()],
            ..Default::default()
        };
        (MonthService::new(repo.clone(), &config), repo, temp_dir)
    }

    #[test]
    fn test_create_month() {
        let (service, _repo, _temp_dir) = setup_service();

        let reconciled = service.create_month(2026, 4).unwrap();
        let record = &reconciled.record;
        assert_eq!(record.key, "2026-04");
        assert_eq!(record.month_name, "April");
        assert_eq!(record.category_names(), vec!["Food", "Fun"]);
        assert_eq!(record.weekly_breakdown.len(), 5);
        assert!(!record.created_at.is_empty());

        assert!(service.create_month(2026, 13).is_err());
    }

    #[test]
    fn test_create_month_from_previous_resets_actuals() {
        let (service, repo, _temp_dir) = setup_service();
        let mut previous = sample_month(2026, 3);
        previous.variable_costs[0].actual_amount = 35.0;
        repo.save_month("2026-03", &previous).unwrap();

        let reconciled = service.create_month_from_previous(2026, 4).unwrap();
        let record = &reconciled.record;
        assert_eq!(record.key, "2026-04");
        assert_eq!(record.income_sources[0].actual_amount, 0.0);
        assert_eq!(record.fixed_costs[0].estimated_amount, 900.0);
        assert_eq!(record.fixed_costs[0].actual_amount, 0.0);
        assert!(!record.fixed_costs[0].paid);
        assert_eq!(record.variable_costs[0].estimated_amount, 280.0);
        assert_eq!(record.variable_costs[0].actual_amount, 0.0);
        assert_eq!(record.pots[0].actual_amount, 0.0);
        // The previous month's weekly cells are not carried
        assert_eq!(record.weekly_breakdown[0].cells.get("food").unwrap(), "Estimate: £56.00\n=");
        assert_eq!(record.weekly_breakdown[0].payments_due, "Rent: £900.00 (Debit) ✗");
    }

    #[test]
    fn test_get_or_create_month_saves_new_month() {
        let (service, repo, _temp_dir) = setup_service();

        let created = service.get_or_create_month(2026, 4).unwrap();
        let stored = repo.get_month("2026-04").unwrap().unwrap();
        assert_eq!(stored, created.record);

        let loaded = service.get_or_create_month(2026, 4).unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_update_month_reconciles_and_saves() {
        let (service, repo, _temp_dir) = setup_service();
        let mut record = sample_month(2026, 4);
        record.created_at = String::new();

        let reconciled = service.update_month(record).unwrap();
        assert_eq!(reconciled.record.variable_costs[0].actual_amount, 35.0);
        assert_eq!(reconciled.totals.fixed_costs.actual, 900.0);
        assert!(!reconciled.record.created_at.is_empty());

        let stored = repo.get_month("2026-04").unwrap().unwrap();
        assert_eq!(stored, reconciled.record);
    }

    #[test]
    fn test_update_month_rejects_invalid_record() {
        let (service, repo, _temp_dir) = setup_service();
        let mut record = sample_month(2026, 4);
        record.key = "2026-05".to_string();

        let err = service.update_month(record).unwrap_err();
        assert!(err.to_string().contains("does not match"));
        assert!(repo.get_month("2026-05").unwrap().is_none());
    }

    #[test]
    fn test_rename_category_keeps_user_spending() {
        let (service, repo, _temp_dir) = setup_service();
        repo.save_month("2026-04", &sample_month(2026, 4)).unwrap();

        let reconciled = service.rename_category("2026-04", "Food", "Groceries").unwrap();
        let cell = reconciled.record.weekly_breakdown[0].cells.get("groceries").unwrap();
        assert_eq!(cell, "Estimate: £56.00\n=20+15");
        assert_eq!(reconciled.record.variable_costs[0].actual_amount, 35.0);
    }

    #[test]
    fn test_add_and_remove_category() {
        let (service, repo, _temp_dir) = setup_service();
        repo.save_month("2026-04", &sample_month(2026, 4)).unwrap();

        let added = service.add_category("2026-04", "Travel", 100.0).unwrap();
        assert_eq!(added.record.weekly_breakdown[2].cells.get("travel").unwrap(), "Estimate: £20.00\n=");

        let removed = service.remove_category("2026-04", "Food").unwrap();
        assert!(!removed.record.weekly_breakdown[0].cells.contains_key("food"));
        assert_eq!(removed.totals.variable_costs.actual, 0.0);

        assert!(service.remove_category("2026-04", "Food").is_err());
        assert!(service.add_category("2030-01", "Travel", 1.0).is_err());
    }

    #[test]
    fn test_list_months() {
        let (service, repo, _temp_dir) = setup_service();
        repo.save_month("2026-04", &sample_month(2026, 4)).unwrap();
        repo.save_month("2026-02", &sample_month(2026, 2)).unwrap();

        let keys: Vec<String> = service.list_months().unwrap().into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["2026-02", "2026-04"]);
    }
}
