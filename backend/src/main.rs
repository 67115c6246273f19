//! Command-line entry point: reconcile one month and print its summary.
//!
//! ```text
//! budget-tracker [YYYY-MM] [--csv]
//! ```
//!
//! Without a key the current month is used. The month is created (from the
//! previous month's plan when one exists) and saved if it is not stored yet.

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local};
use log::info;

use budget_tracker_backend::storage::FileConnection;
use budget_tracker_backend::Backend;
use shared::{MonthRecord, ReconciledMonth, TotalPair};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut key: Option<String> = None;
    let mut export_csv = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--csv" => export_csv = true,
            other if key.is_none() => key = Some(other.to_string()),
            other => return Err(anyhow!("Unexpected argument: {}", other)),
        }
    }

    let (year, month) = match key {
        Some(key) => MonthRecord::parse_key(&key)?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };

    let backend = Backend::new(FileConnection::new_default()?)?;
    let reconciled = backend.month_service.get_or_create_month(year, month)?;
    info!("🚀 Reconciled {}", reconciled.record.key);

    if export_csv {
        print!("{}", backend.export_service.export_weekly_breakdown_csv(&reconciled)?);
    } else {
        print_summary(&backend, &reconciled);
    }
    Ok(())
}

fn print_summary(backend: &Backend, reconciled: &ReconciledMonth) {
    let fmt = backend.month_service.reconciliation().formatter();
    let record = &reconciled.record;
    let totals = &reconciled.totals;

    println!("{} {}", record.month_name, record.year);
    println!();
    for (row, week) in record.weekly_breakdown.iter().zip(&reconciled.weeks) {
        println!(
            "Week {} ({:>5})  estimate {:>12}  actual {:>12}",
            week.index,
            row.date_range,
            fmt.format_currency(row.estimate),
            fmt.format_currency(row.actual)
        );
    }
    println!();

    let line = |label: &str, pair: &TotalPair| {
        println!(
            "{:<16} {:>12} {:>12}",
            label,
            fmt.format_currency(pair.estimated),
            fmt.format_currency(pair.actual)
        );
    };
    println!("{:<16} {:>12} {:>12}", "", "Estimated", "Actual");
    line("Income", &totals.income);
    line("Fixed costs", &totals.fixed_costs);
    line("Variable costs", &totals.variable_costs);
    println!(
        "{:<16} {:>12} {:>12}",
        "Unplanned",
        "",
        fmt.format_currency(totals.unplanned_expenses)
    );
    line("Expenses", &totals.expenses);
    line("Pots", &totals.pots);
    line("Net savings", &totals.net_savings);
}
