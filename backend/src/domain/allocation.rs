//! Cost allocation across the weeks of a month.
//!
//! Dated items (fixed costs and unplanned expenses) land in the week that
//! contains their day of month; items whose date text carries no readable day
//! stay out of every week-scoped figure. Category budgets are spread evenly
//! over the weeks with no remainder correction.

use shared::{FixedCost, UnplannedExpense, Week};

use super::money::MoneyFormatter;

pub const PAID_MARK: &str = "✓";
pub const UNPAID_MARK: &str = "✗";

/// Extract a day of month from free date text.
///
/// Accepts "5", "5th", "1st of month", "2025-04-05" (ISO, day taken from the
/// third component) and "05/04/2025" (day first). Anything that yields no
/// number in 1..=31 is unparseable.
pub fn parse_day_number(date_text: &str) -> Option<u32> {
    let text = date_text.trim();
    if text.is_empty() {
        return None;
    }

    let numbers = digit_runs(text);
    let day = match numbers.as_slice() {
        // ISO date: year first
        [year, _, day, ..] if year.len() == 4 && text.contains('-') => day.parse::<u32>().ok(),
        [first, ..] => first.parse::<u32>().ok(),
        [] => None,
    }?;

    (1..=31).contains(&day).then_some(day)
}

fn digit_runs(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect()
}

/// Find the week whose day span contains `day`
pub fn assign_to_week(day: u32, weeks: &[Week]) -> Option<&Week> {
    weeks.iter().find(|week| week.contains(day))
}

/// Week an item with free date text belongs to, if any
pub fn week_for_date<'a>(date_text: &str, weeks: &'a [Week]) -> Option<&'a Week> {
    parse_day_number(date_text).and_then(|day| assign_to_week(day, weeks))
}

/// Weekly share of a monthly category budget
pub fn distribute_category_budget(monthly_budget: f64, week_count: usize) -> f64 {
    if week_count == 0 {
        return 0.0;
    }
    monthly_budget / week_count as f64
}

pub fn fixed_costs_in_week<'a>(
    week: &Week,
    weeks: &[Week],
    fixed_costs: &'a [FixedCost],
) -> Vec<&'a FixedCost> {
    fixed_costs
        .iter()
        .filter(|cost| week_for_date(&cost.date, weeks).is_some_and(|w| w.index == week.index))
        .collect()
}

pub fn unplanned_expenses_in_week<'a>(
    week: &Week,
    weeks: &[Week],
    unplanned_expenses: &'a [UnplannedExpense],
) -> Vec<&'a UnplannedExpense> {
    unplanned_expenses
        .iter()
        .filter(|expense| week_for_date(&expense.date, weeks).is_some_and(|w| w.index == week.index))
        .collect()
}

/// Build the payments-due text for one week: one line per dated item,
/// fixed costs first, each as `<name>: <amount> (<card>) <mark>`.
pub fn build_payments_due_text(
    week: &Week,
    weeks: &[Week],
    fixed_costs: &[FixedCost],
    unplanned_expenses: &[UnplannedExpense],
    formatter: &MoneyFormatter,
) -> String {
    let mut lines = Vec::new();

    for cost in fixed_costs_in_week(week, weeks, fixed_costs) {
        lines.push(payment_line(&cost.category, cost.effective_amount(), &cost.card, cost.paid, formatter));
    }
    for expense in unplanned_expenses_in_week(week, weeks, unplanned_expenses) {
        lines.push(payment_line(&expense.name, expense.amount, &expense.card, expense.paid, formatter));
    }

    lines.join("\n")
}

fn payment_line(label: &str, amount: f64, card: &str, paid: bool, formatter: &MoneyFormatter) -> String {
    let mark = if paid { PAID_MARK } else { UNPAID_MARK };
    let card = card.trim();
    if card.is_empty() {
        format!("{}: {} {}", label.trim(), formatter.format_currency(amount), mark)
    } else {
        format!("{}: {} ({}) {}", label.trim(), formatter.format_currency(amount), card, mark)
    }
}

/// True when payments-due text still holds generated content
pub fn is_generated_payments_due(text: &str) -> bool {
    text.trim().is_empty() || text.contains(PAID_MARK) || text.contains(UNPAID_MARK)
}

/// Keep a customised payments-due field, otherwise replace it with the
/// freshly generated text. Generated text that was collapsed onto one line
/// still carries the marks, so it is rebuilt one item per line.
pub fn synchronize_payments_due(existing: &str, generated: &str) -> String {
    if is_generated_payments_due(existing) {
        generated.to_string()
    } else {
        existing.to_string()
    }
}
