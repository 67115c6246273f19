//! Shared fixtures for storage and service tests.

use shared::{FixedCost, IncomeSource, MonthRecord, Pot, VariableCost, WeeklyBreakdownRow};
use tempfile::TempDir;

use super::connection::FileConnection;

/// A connection rooted in a fresh temporary directory. Keep the `TempDir`
/// alive for as long as the connection is used.
pub fn setup_test_connection() -> (FileConnection, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let connection = FileConnection::new(temp_dir.path()).expect("Failed to create connection");
    (connection, temp_dir)
}

/// A month with one entry in most collections and a user-entered cell
pub fn sample_month(year: i32, month: u32) -> MonthRecord {
    let mut row = WeeklyBreakdownRow::new("1-5");
    row.cells.insert("food".to_string(), "Estimate: £56.00\n=20+15".to_string());

    MonthRecord {
        key: MonthRecord::generate_key(year, month),
        year,
        month,
        month_name: String::new(),
        income_sources: vec![IncomeSource {
            name: "Salary".to_string(),
            estimated_amount: 2500.0,
            actual_amount: 2500.0,
            date: "25".to_string(),
            comments: String::new(),
        }],
        fixed_costs: vec![FixedCost {
            category: "Rent".to_string(),
            estimated_amount: 900.0,
            actual_amount: 900.0,
            date: "1".to_string(),
            card: "Debit".to_string(),
            paid: true,
            comments: String::new(),
        }],
        variable_costs: vec![VariableCost::new("Food", 280.0), VariableCost::new("Fun", 60.0)],
        unplanned_expenses: Vec::new(),
        pots: vec![Pot {
            category: "Holiday".to_string(),
            estimated_amount: 100.0,
            actual_amount: 100.0,
            comments: String::new(),
        }],
        weekly_breakdown: vec![row],
        created_at: "2025-04-01T08:00:00+00:00".to_string(),
        updated_at: "2025-04-01T08:00:00+00:00".to_string(),
    }
}
