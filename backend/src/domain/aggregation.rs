//! Month reconciliation pass.
//!
//! `ReconciliationService::reconcile` is the single recompute entry point and
//! is safe to call after any edit. It partitions the month, aligns the
//! weekly rows to the partition, rebuilds the column schema, refreshes every
//! derived field (cell estimate lines, payments due, category actuals, week
//! totals) and computes the month totals. User-entered actual-spending lines
//! and customised payments-due text are never rewritten, which is what makes
//! the pass idempotent.

use log::{debug, info, warn};
use shared::{MonthRecord, MonthTotals, ReconciledMonth, TotalPair, VariableCost, Week, WeeklyBreakdownRow};

use super::allocation::{
    build_payments_due_text, distribute_category_budget, fixed_costs_in_week, synchronize_payments_due,
    unplanned_expenses_in_week,
};
use super::calendar::CalendarService;
use super::cell::{parse_cell, synchronize_cell};
use super::money::MoneyFormatter;
use super::schema::{rebuild_schema, sanitize_category_id};

/// Service that recomputes every derived figure of a month
#[derive(Clone, Debug)]
pub struct ReconciliationService {
    calendar: CalendarService,
    formatter: MoneyFormatter,
    default_categories: Vec<String>,
}

impl ReconciliationService {
    pub fn new(formatter: MoneyFormatter, default_categories: Vec<String>) -> Self {
        Self {
            calendar: CalendarService::new(),
            formatter,
            default_categories,
        }
    }

    pub fn formatter(&self) -> &MoneyFormatter {
        &self.formatter
    }

    /// Recompute all derived data of `record` and return the display snapshot
    pub fn reconcile(&self, mut record: MonthRecord) -> ReconciledMonth {
        let weeks = self.calendar.partition_month(record.year, record.month);
        if record.month_name.is_empty() {
            record.month_name = self.calendar.month_name(record.month).to_string();
        }

        self.seed_default_categories(&mut record);

        let aligned = align_rows_to_weeks(&weeks, &record.weekly_breakdown);
        record.weekly_breakdown = rebuild_schema(&record.category_names(), &aligned, &[]);

        self.synchronize_category_cells(&mut record, weeks.len());
        self.refresh_category_actuals(&mut record);
        self.refresh_week_totals(&mut record, &weeks);

        let totals = calculate_totals(&record);
        info!(
            "📊 RECONCILE: {} reconciled over {} weeks, {} categories, net savings {} (estimated {})",
            record.key,
            weeks.len(),
            record.variable_costs.len(),
            self.formatter.format_currency(totals.net_savings.actual),
            self.formatter.format_currency(totals.net_savings.estimated),
        );

        ReconciledMonth { record, weeks, totals }
    }

    fn seed_default_categories(&self, record: &mut MonthRecord) {
        if !record.variable_costs.is_empty() {
            return;
        }
        record.variable_costs = self
            .default_categories
            .iter()
            .map(|category| VariableCost::new(category, 0.0))
            .collect();
        debug!(
            "📊 RECONCILE: Seeded {} default categories into {}",
            record.variable_costs.len(),
            record.key
        );
    }

    /// Refresh each cell's estimate line with the category's weekly share
    fn synchronize_category_cells(&self, record: &mut MonthRecord, week_count: usize) {
        for cost in &record.variable_costs {
            let id = sanitize_category_id(&cost.category);
            let weekly_budget = distribute_category_budget(cost.estimated_amount, week_count);
            for row in record.weekly_breakdown.iter_mut() {
                let cell = row.cells.entry(id.clone()).or_default();
                *cell = synchronize_cell(cell, weekly_budget, &self.formatter);
            }
        }
    }

    /// A category's actual is the sum of its weekly actual-spending lines
    fn refresh_category_actuals(&self, record: &mut MonthRecord) {
        let rows = &record.weekly_breakdown;
        for cost in record.variable_costs.iter_mut() {
            let id = sanitize_category_id(&cost.category);
            cost.actual_amount = rows
                .iter()
                .filter_map(|row| row.cells.get(&id))
                .map(|text| parse_cell(text).evaluate_actual(&self.formatter).contribution())
                .sum();
        }
    }

    fn refresh_week_totals(&self, record: &mut MonthRecord, weeks: &[Week]) {
        let category_ids: Vec<String> = record
            .variable_costs
            .iter()
            .map(|cost| sanitize_category_id(&cost.category))
            .collect();

        for (row, week) in record.weekly_breakdown.iter_mut().zip(weeks) {
            let generated = build_payments_due_text(
                week,
                weeks,
                &record.fixed_costs,
                &record.unplanned_expenses,
                &self.formatter,
            );
            row.payments_due = synchronize_payments_due(&row.payments_due, &generated);

            let fixed = fixed_costs_in_week(week, weeks, &record.fixed_costs);
            let unplanned = unplanned_expenses_in_week(week, weeks, &record.unplanned_expenses);

            let payments_estimate: f64 = fixed.iter().map(|cost| cost.estimated_amount).sum();
            let payments_actual: f64 = fixed
                .iter()
                .filter(|cost| cost.paid)
                .map(|cost| cost.effective_amount())
                .sum::<f64>()
                + unplanned
                    .iter()
                    .filter(|expense| expense.paid)
                    .map(|expense| expense.amount)
                    .sum::<f64>();

            let mut category_estimate = 0.0;
            let mut category_actual = 0.0;
            for id in &category_ids {
                let cell = parse_cell(row.cells.get(id).map(String::as_str).unwrap_or_default());
                category_estimate += cell.estimate_amount(&self.formatter);
                let evaluation = cell.evaluate_actual(&self.formatter);
                if evaluation.is_not_a_number() {
                    debug!("📊 RECONCILE: Week {} cell '{}' does not evaluate, counting 0", row.date_range, id);
                }
                category_actual += evaluation.contribution();
            }

            row.estimate = payments_estimate + category_estimate;
            row.actual = payments_actual + category_actual;
        }
    }
}

/// Reconcile a month without seeding default categories
pub fn reconcile_month(record: MonthRecord, formatter: &MoneyFormatter) -> ReconciledMonth {
    ReconciliationService::new(formatter.clone(), Vec::new()).reconcile(record)
}

/// Put the existing rows in partition order, one per week.
///
/// Rows are matched on their date-range label first. Rows whose label belongs
/// to no current week (data saved under an older partition) then fill the
/// weeks still unmatched, in order. Whatever is left over is dropped.
pub fn align_rows_to_weeks(weeks: &[Week], existing: &[WeeklyBreakdownRow]) -> Vec<WeeklyBreakdownRow> {
    let labels: Vec<String> = weeks.iter().map(Week::date_range_label).collect();
    let mut used = vec![false; existing.len()];

    let mut slots: Vec<Option<usize>> = labels
        .iter()
        .map(|label| {
            let found = (0..existing.len()).find(|&i| !used[i] && &existing[i].date_range == label);
            if let Some(i) = found {
                used[i] = true;
            }
            found
        })
        .collect();

    let mut stale = (0..existing.len()).filter(|&i| !used[i] && !labels.contains(&existing[i].date_range));
    for slot in slots.iter_mut().filter(|slot| slot.is_none()) {
        let Some(i) = stale.next() else {
            break;
        };
        *slot = Some(i);
    }
    for slot in slots.iter().flatten() {
        used[*slot] = true;
    }

    for (row, _) in existing.iter().zip(&used).filter(|(_, used)| !**used) {
        if has_user_actuals(row) {
            warn!(
                "📊 RECONCILE: Dropping weekly row '{}' that still holds actual spending",
                row.date_range
            );
        } else {
            debug!("📊 RECONCILE: Dropping weekly row '{}'", row.date_range);
        }
    }

    labels
        .iter()
        .zip(slots)
        .map(|(label, slot)| {
            let mut row = slot
                .map(|i| existing[i].clone())
                .unwrap_or_else(|| WeeklyBreakdownRow::new(label));
            row.date_range = label.clone();
            row
        })
        .collect()
}

fn has_user_actuals(row: &WeeklyBreakdownRow) -> bool {
    row.cells.values().any(|text| {
        let cell = parse_cell(text);
        cell.has_actual_expression() || cell.is_legacy()
    })
}

/// Whole-month totals from the record's collections
pub fn calculate_totals(record: &MonthRecord) -> MonthTotals {
    let income = TotalPair::new(
        record.income_sources.iter().map(|s| s.estimated_amount).sum(),
        record.income_sources.iter().map(|s| s.actual_amount).sum(),
    );
    let fixed_costs = TotalPair::new(
        record.fixed_costs.iter().map(|c| c.estimated_amount).sum(),
        record.fixed_costs.iter().map(|c| c.actual_amount).sum(),
    );
    let variable_costs = TotalPair::new(
        record.variable_costs.iter().map(|c| c.estimated_amount).sum(),
        record.variable_costs.iter().map(|c| c.actual_amount).sum(),
    );
    let unplanned_expenses: f64 = record.unplanned_expenses.iter().map(|e| e.amount).sum();
    let pots = TotalPair::new(
        record.pots.iter().map(|p| p.estimated_amount).sum(),
        record.pots.iter().map(|p| p.actual_amount).sum(),
    );

    let expenses = TotalPair::new(
        fixed_costs.estimated + variable_costs.estimated,
        fixed_costs.actual + variable_costs.actual + unplanned_expenses,
    );
    let net_savings = TotalPair::new(
        income.estimated - expenses.estimated - pots.estimated,
        income.actual - expenses.actual - pots.actual,
    );

    MonthTotals {
        income,
        fixed_costs,
        variable_costs,
        unplanned_expenses,
        pots,
        expenses,
        net_savings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{FixedCost, IncomeSource, Pot, UnplannedExpense};

    fn service() -> ReconciliationService {
        ReconciliationService::new(
            MoneyFormatter::default(),
            vec!["Food".to_string(), "Fun".to_string()],
        )
    }

    /// April 2026: 30 days starting on a Wednesday, weeks 1-5 ... 27-30
    fn april_record() -> MonthRecord {
        MonthRecord {
            key: "2026-04".to_string(),
            year: 2026,
            month: 4,
            ..Default::default()
        }
    }

    /// February 2027: starts on a Monday, exactly four weeks
    fn four_week_record() -> MonthRecord {
        MonthRecord {
            key: "2027-02".to_string(),
            year: 2027,
            month: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_reconcile_empty_month_seeds_categories_and_rows() {
        let reconciled = service().reconcile(april_record());

        assert_eq!(reconciled.weeks.len(), 5);
        assert_eq!(reconciled.record.month_name, "April");
        assert_eq!(reconciled.record.category_names(), vec!["Food", "Fun"]);
        assert_eq!(reconciled.record.weekly_breakdown.len(), 5);
        let first = &reconciled.record.weekly_breakdown[0];
        assert_eq!(first.date_range, "1-5");
        assert_eq!(first.cells.get("food").unwrap(), "Estimate: £0.00\n=");
        assert_eq!(reconciled.totals, MonthTotals::default());
    }

    #[test]
    fn test_category_budget_spread_over_four_weeks() {
        let mut record = four_week_record();
        record.variable_costs = vec![VariableCost::new("Food", 280.0)];

        let reconciled = service().reconcile(record);
        assert_eq!(reconciled.weeks.len(), 4);
        for row in &reconciled.record.weekly_breakdown {
            assert_eq!(row.cells.get("food").unwrap(), "Estimate: £70.00\n=");
            assert_eq!(row.estimate, 70.0);
        }
    }

    #[test]
    fn test_paid_fixed_cost_counts_in_first_week() {
        let mut record = april_record();
        record.fixed_costs = vec![FixedCost {
            category: "Rent".to_string(),
            estimated_amount: 900.0,
            date: "1".to_string(),
            paid: true,
            ..Default::default()
        }];

        let reconciled = service().reconcile(record);
        let first = &reconciled.record.weekly_breakdown[0];
        assert_eq!(first.date_range, "1-5");
        assert_eq!(first.actual, 900.0);
        assert_eq!(first.estimate, 900.0);
        assert!(first.payments_due.contains("Rent: £900.00 ✓"));
        assert_eq!(reconciled.record.weekly_breakdown[1].actual, 0.0);
    }

    #[test]
    fn test_unpaid_items_only_show_in_payments_due() {
        let mut record = april_record();
        record.fixed_costs = vec![FixedCost {
            category: "Phone".to_string(),
            estimated_amount: 25.0,
            date: "8".to_string(),
            card: "Amex".to_string(),
            ..Default::default()
        }];
        record.unplanned_expenses = vec![UnplannedExpense {
            name: "Vet".to_string(),
            amount: 60.0,
            date: "9".to_string(),
            ..Default::default()
        }];

        let reconciled = service().reconcile(record);
        let second = &reconciled.record.weekly_breakdown[1];
        assert_eq!(second.payments_due, "Phone: £25.00 (Amex) ✗\nVet: £60.00 ✗");
        assert_eq!(second.actual, 0.0);
        // Unplanned expenses never feed the estimate
        assert_eq!(second.estimate, 25.0);
    }

    #[test]
    fn test_actual_spending_feeds_category_and_week() {
        let mut record = april_record();
        record.variable_costs = vec![VariableCost::new("Food", 250.0), VariableCost::new("Fun", 0.0)];
        let mut row = WeeklyBreakdownRow::new("6-12");
        row.cells.insert("food".to_string(), "=12.50+7.50".to_string());
        row.cells.insert("fun".to_string(), "=oops".to_string());
        record.weekly_breakdown = vec![WeeklyBreakdownRow::new("1-5"), row];

        let reconciled = service().reconcile(record);
        let record = &reconciled.record;
        assert_eq!(record.variable_costs[0].actual_amount, 20.0);
        assert_eq!(record.variable_costs[1].actual_amount, 0.0);
        assert_eq!(record.weekly_breakdown[1].actual, 20.0);
        assert_eq!(record.weekly_breakdown[1].cells.get("food").unwrap(), "Estimate: £50.00\n=12.50+7.50");
        assert_eq!(record.weekly_breakdown[1].cells.get("fun").unwrap(), "Estimate: £0.00\n=oops");
        assert_eq!(reconciled.totals.variable_costs, TotalPair::new(250.0, 20.0));
    }

    #[test]
    fn test_month_totals() {
        let mut record = april_record();
        record.income_sources = vec![IncomeSource {
            name: "Salary".to_string(),
            estimated_amount: 2500.0,
            actual_amount: 2450.0,
            ..Default::default()
        }];
        record.fixed_costs = vec![FixedCost {
            category: "Rent".to_string(),
            estimated_amount: 900.0,
            actual_amount: 900.0,
            date: "1".to_string(),
            paid: true,
            ..Default::default()
        }];
        record.variable_costs = vec![VariableCost::new("Food", 300.0)];
        record.weekly_breakdown = vec![WeeklyBreakdownRow::new("1-5")];
        record.weekly_breakdown[0].cells.insert("food".to_string(), "=80".to_string());
        record.unplanned_expenses = vec![UnplannedExpense {
            name: "Vet".to_string(),
            amount: 60.0,
            ..Default::default()
        }];
        record.pots = vec![Pot {
            category: "Holiday".to_string(),
            estimated_amount: 200.0,
            actual_amount: 150.0,
            ..Default::default()
        }];

        let totals = service().reconcile(record).totals;
        assert_eq!(totals.income, TotalPair::new(2500.0, 2450.0));
        assert_eq!(totals.fixed_costs, TotalPair::new(900.0, 900.0));
        assert_eq!(totals.variable_costs, TotalPair::new(300.0, 80.0));
        assert_eq!(totals.unplanned_expenses, 60.0);
        assert_eq!(totals.expenses, TotalPair::new(1200.0, 1040.0));
        assert_eq!(totals.pots, TotalPair::new(200.0, 150.0));
        assert_eq!(totals.net_savings, TotalPair::new(1100.0, 1260.0));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut record = april_record();
        record.variable_costs = vec![VariableCost::new("Food", 100.0), VariableCost::new("Fun", 45.0)];
        record.fixed_costs = vec![FixedCost {
            category: "Rent".to_string(),
            estimated_amount: 900.0,
            date: "2025-04-03".to_string(),
            paid: true,
            ..Default::default()
        }];
        let mut row = WeeklyBreakdownRow::new("1-5");
        row.cells.insert("food".to_string(), "Estimate: £1.00\n=10+5\nnote".to_string());
        row.cells.insert("fun".to_string(), "20-5= 15".to_string());
        row.payments_due = "remember the rent".to_string();
        record.weekly_breakdown = vec![row];

        let formatter = MoneyFormatter::default();
        let once = reconcile_month(record, &formatter);
        let twice = reconcile_month(once.record.clone(), &formatter);
        assert_eq!(once, twice);
        assert_eq!(once.record.weekly_breakdown[0].payments_due, "remember the rent");
        assert_eq!(
            once.record.weekly_breakdown[0].cells.get("fun").unwrap(),
            "Estimate: £9.00\n=20-5"
        );
    }

    #[test]
    fn test_align_rows_by_label_then_position() {
        let weeks = CalendarService::new().partition_month(2026, 4);
        let mut stale = WeeklyBreakdownRow::new("29-30");
        stale.payments_due = "kept".to_string();
        let existing = vec![
            WeeklyBreakdownRow::new("6-12"),
            WeeklyBreakdownRow::new("1-5"),
            WeeklyBreakdownRow::new("13-19"),
            WeeklyBreakdownRow::new("20-26"),
            stale,
            WeeklyBreakdownRow::new("extra"),
        ];

        let aligned = align_rows_to_weeks(&weeks, &existing);
        let labels: Vec<&str> = aligned.iter().map(|r| r.date_range.as_str()).collect();
        assert_eq!(labels, vec!["1-5", "6-12", "13-19", "20-26", "27-30"]);
        assert_eq!(aligned[4].payments_due, "kept");
    }

    #[test]
    fn test_align_moves_stale_row_to_first_free_week() {
        let weeks = CalendarService::new().partition_month(2026, 4);
        let mut stale = WeeklyBreakdownRow::new("1-7");
        stale.cells.insert("food".to_string(), "=99".to_string());
        let existing = vec![stale, WeeklyBreakdownRow::new("1-5")];

        let aligned = align_rows_to_weeks(&weeks, &existing);
        assert_eq!(aligned.len(), 5);
        assert!(aligned[0].cells.is_empty());
        assert_eq!(aligned[1].date_range, "6-12");
        assert_eq!(aligned[1].cells.get("food").unwrap(), "=99");
    }

    #[test]
    fn test_align_drops_duplicate_label_rows() {
        let weeks = CalendarService::new().partition_month(2026, 4);
        let mut first = WeeklyBreakdownRow::new("1-5");
        first.payments_due = "first".to_string();
        let mut duplicate = WeeklyBreakdownRow::new("1-5");
        duplicate.payments_due = "second".to_string();

        let aligned = align_rows_to_weeks(&weeks, &[first, duplicate]);
        assert_eq!(aligned[0].payments_due, "first");
        assert!(aligned.iter().all(|row| row.payments_due != "second"));
    }

    #[test]
    fn test_added_category_starts_without_spending() {
        let mut record = april_record();
        record.variable_costs = vec![VariableCost::new("Cat Food", 40.0)];
        let mut row = WeeklyBreakdownRow::new("1-5");
        row.cells.insert("cat-food".to_string(), "=40".to_string());
        record.weekly_breakdown = vec![row];

        crate::domain::schema::add_category(&mut record, "Food", 100.0).unwrap();
        let reconciled = service().reconcile(record);

        let actuals: Vec<f64> = reconciled.record.variable_costs.iter().map(|c| c.actual_amount).collect();
        assert_eq!(actuals, vec![40.0, 0.0]);
        assert_eq!(reconciled.record.weekly_breakdown[0].actual, 40.0);
    }
}
