//! Export service domain logic for the budget tracker.
//!
//! Turns a reconciled month into CSV: one row per week with the payments-due
//! text, each category's actual spending and the week's estimate and actual.

use anyhow::Result;
use log::info;

use shared::ReconciledMonth;

use super::cell::parse_cell;
use super::money::MoneyFormatter;
use super::schema::sanitize_category_id;

/// Export service that handles all export-related business logic
#[derive(Clone, Debug)]
pub struct ExportService {
    formatter: MoneyFormatter,
}

impl ExportService {
    pub fn new(formatter: MoneyFormatter) -> Self {
        Self { formatter }
    }

    /// Weekly breakdown as CSV.
    ///
    /// Header: `Week,Dates,Payments Due,<category...>,Estimate,Actual`. A
    /// category column holds the evaluated actual spending, or the raw
    /// expression when it does not evaluate.
    pub fn export_weekly_breakdown_csv(&self, reconciled: &ReconciledMonth) -> Result<String> {
        let record = &reconciled.record;
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["Week".to_string(), "Dates".to_string(), "Payments Due".to_string()];
        header.extend(record.category_names());
        header.push("Estimate".to_string());
        header.push("Actual".to_string());
        writer.write_record(&header)?;

        let ids: Vec<String> = record
            .variable_costs
            .iter()
            .map(|cost| sanitize_category_id(&cost.category))
            .collect();

        for (row, week) in record.weekly_breakdown.iter().zip(&reconciled.weeks) {
            let mut fields = vec![
                week.index.to_string(),
                row.date_range.clone(),
                row.payments_due.clone(),
            ];
            for id in &ids {
                let cell = parse_cell(row.cells.get(id).map(String::as_str).unwrap_or_default());
                let evaluation = cell.evaluate_actual(&self.formatter);
                let field = if evaluation.is_not_a_number() {
                    cell.actual_expression.unwrap_or_default()
                } else {
                    format!("{:.2}", evaluation.contribution())
                };
                fields.push(field);
            }
            fields.push(format!("{:.2}", row.estimate));
            fields.push(format!("{:.2}", row.actual));
            writer.write_record(&fields)?;
        }

        let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;
        let csv_content = String::from_utf8(bytes)?;

        info!(
            "📄 EXPORT: Exported {} weeks of {} as CSV",
            record.weekly_breakdown.len(),
            record.key
        );
        Ok(csv_content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::ReconciliationService;
    use shared::{FixedCost, MonthRecord, VariableCost, WeeklyBreakdownRow};

    #[test]
    fn test_export_weekly_breakdown_csv() {
        let mut record = MonthRecord {
            key: "2026-04".to_string(),
            year: 2026,
            month: 4,
            variable_costs: vec![VariableCost::new("Food", 250.0), VariableCost::new("Eating Out", 0.0)],
            fixed_costs: vec![FixedCost {
                category: "Rent".to_string(),
                estimated_amount: 900.0,
                date: "1".to_string(),
                paid: true,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut row = WeeklyBreakdownRow::new("1-5");
        row.cells.insert("food".to_string(), "=10+2.5".to_string());
        row.cells.insert("eating-out".to_string(), "=pizza".to_string());
        record.weekly_breakdown = vec![row];

        let formatter = MoneyFormatter::default();
        let reconciled = ReconciliationService::new(formatter.clone(), Vec::new()).reconcile(record);
        let csv_content = ExportService::new(formatter).export_weekly_breakdown_csv(&reconciled).unwrap();

        let lines: Vec<&str> = csv_content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Week,Dates,Payments Due,Food,Eating Out,Estimate,Actual");
        assert_eq!(lines[1], "1,1-5,Rent: £900.00 ✓,12.50,pizza,950.00,912.50");
        assert_eq!(lines[2], "2,6-12,,0.00,0.00,50.00,0.00");
    }
}
