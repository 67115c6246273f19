use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One month of budget data. Identified by `key` in `YYYY-MM` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthRecord {
    /// Month key, e.g. "2025-04"
    pub key: String,
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Human-readable month name, e.g. "April"
    pub month_name: String,
    pub income_sources: Vec<IncomeSource>,
    pub fixed_costs: Vec<FixedCost>,
    /// Category budgets, order preserving; one weekly-breakdown column each
    pub variable_costs: Vec<VariableCost>,
    pub unplanned_expenses: Vec<UnplannedExpense>,
    pub pots: Vec<Pot>,
    /// One row per week of the month, joined on the week's date-range label
    pub weekly_breakdown: Vec<WeeklyBreakdownRow>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl MonthRecord {
    /// Build the canonical month key ("2025-04")
    pub fn generate_key(year: i32, month: u32) -> String {
        format!("{:04}-{:02}", year, month)
    }

    /// Parse a month key back into (year, month)
    pub fn parse_key(key: &str) -> Result<(i32, u32), MonthKeyError> {
        let (year_part, month_part) = key.split_once('-').ok_or(MonthKeyError::InvalidFormat)?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(MonthKeyError::InvalidFormat);
        }
        let year = year_part.parse::<i32>().map_err(|_| MonthKeyError::InvalidYear)?;
        let month = month_part.parse::<u32>().map_err(|_| MonthKeyError::InvalidMonth)?;
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::InvalidMonth);
        }
        Ok((year, month))
    }

    /// Category names of the variable-cost list, in order
    pub fn category_names(&self) -> Vec<String> {
        self.variable_costs.iter().map(|v| v.category.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeSource {
    pub name: String,
    pub estimated_amount: f64,
    pub actual_amount: f64,
    pub date: String,
    pub comments: String,
}

/// A planned, usually recurring cost such as rent. `date` is free text that
/// should contain a day-of-month number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FixedCost {
    pub category: String,
    pub estimated_amount: f64,
    pub actual_amount: f64,
    pub date: String,
    pub card: String,
    pub paid: bool,
    pub comments: String,
}

impl FixedCost {
    /// Amount shown in payments due and counted once paid: the actual amount
    /// if one was entered, the estimate otherwise
    pub fn effective_amount(&self) -> f64 {
        if self.actual_amount != 0.0 {
            self.actual_amount
        } else {
            self.estimated_amount
        }
    }
}

/// A category budget. `actual_amount` is derived from the weekly cells and is
/// overwritten on every reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableCost {
    pub category: String,
    pub estimated_amount: f64,
    pub actual_amount: f64,
    pub comments: String,
}

impl VariableCost {
    pub fn new(category: &str, estimated_amount: f64) -> Self {
        Self {
            category: category.to_string(),
            estimated_amount,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UnplannedExpense {
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub card: String,
    pub paid: bool,
    pub comments: String,
}

/// Savings pot contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Pot {
    pub category: String,
    pub estimated_amount: f64,
    pub actual_amount: f64,
    pub comments: String,
}

/// One week of the weekly breakdown table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyBreakdownRow {
    /// Join key against the partitioned weeks, e.g. "1-7"
    pub date_range: String,
    pub payments_due: String,
    /// Category cell text keyed by sanitized category id
    pub cells: BTreeMap<String, String>,
    /// Derived
    pub estimate: f64,
    /// Derived
    pub actual: f64,
}

impl WeeklyBreakdownRow {
    pub fn new(date_range: &str) -> Self {
        Self {
            date_range: date_range.to_string(),
            ..Default::default()
        }
    }
}

/// A Monday-aligned span of days inside one month. Never persisted; only
/// `date_range_label()` is stored on breakdown rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    /// 1-based position within the month
    pub index: u32,
    pub start_day: u32,
    pub end_day: u32,
}

impl Week {
    pub fn date_range_label(&self) -> String {
        format!("{}-{}", self.start_day, self.end_day)
    }

    pub fn contains(&self, day: u32) -> bool {
        day >= self.start_day && day <= self.end_day
    }

    pub fn day_count(&self) -> u32 {
        self.end_day + 1 - self.start_day
    }
}

/// Estimated and actual figures for one total line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TotalPair {
    pub estimated: f64,
    pub actual: f64,
}

impl TotalPair {
    pub fn new(estimated: f64, actual: f64) -> Self {
        Self { estimated, actual }
    }
}

/// Whole-month totals produced by the reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonthTotals {
    pub income: TotalPair,
    pub fixed_costs: TotalPair,
    pub variable_costs: TotalPair,
    /// Unplanned expenses carry no estimate
    pub unplanned_expenses: f64,
    pub pots: TotalPair,
    pub expenses: TotalPair,
    pub net_savings: TotalPair,
}

/// A reconciled month ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledMonth {
    pub record: MonthRecord,
    pub weeks: Vec<Week>,
    pub totals: MonthTotals,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonthKeyError {
    InvalidFormat,
    InvalidYear,
    InvalidMonth,
}

impl fmt::Display for MonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKeyError::InvalidFormat => write!(f, "Invalid month key format, expected YYYY-MM"),
            MonthKeyError::InvalidYear => write!(f, "Invalid year in month key"),
            MonthKeyError::InvalidMonth => write!(f, "Invalid month in month key"),
        }
    }
}

impl std::error::Error for MonthKeyError {}

/// Problems found when validating a month record before saving
#[derive(Debug, Clone, PartialEq)]
pub enum MonthValidationError {
    KeyMismatch { key: String, expected: String },
    MonthOutOfRange(u32),
    EmptyCategoryName(usize),
    DuplicateCategory(String),
}

impl fmt::Display for MonthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthValidationError::KeyMismatch { key, expected } => {
                write!(f, "Month key '{}' does not match year/month (expected '{}')", key, expected)
            }
            MonthValidationError::MonthOutOfRange(month) => {
                write!(f, "Month {} is out of range, must be between 1 and 12", month)
            }
            MonthValidationError::EmptyCategoryName(position) => {
                write!(f, "Category at position {} has an empty name", position + 1)
            }
            MonthValidationError::DuplicateCategory(name) => {
                write!(f, "Category '{}' appears more than once", name)
            }
        }
    }
}

impl std::error::Error for MonthValidationError {}
