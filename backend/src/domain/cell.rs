//! Category cell mini-language.
//!
//! A category cell is the free text stored for one category in one week. It
//! holds two kinds of data in a single field:
//!
//! ```text
//! Estimate: £70.00      <- machine generated, refreshed on every recompute
//! =12.50+8+30           <- user owned actual spending, never overwritten
//! bought a kettle       <- anything else, kept verbatim
//! ```
//!
//! The cell is parsed into [`CategoryCell`] and serialized back in a
//! canonical order: estimate line, actual-spending line, other lines.
//! Whitespace-only lines are dropped.

use super::expression::{evaluate_expression, Evaluation};
use super::money::MoneyFormatter;

const ESTIMATE_PREFIX: &str = "Estimate:";

/// Structured form of a category cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryCell {
    /// The whole `Estimate: ...` line as found in the cell
    pub estimate_line: Option<String>,
    /// Everything after the `=` of the first line starting with `=`,
    /// ignoring leading whitespace
    pub actual_expression: Option<String>,
    /// Remaining non-blank lines, in their original order
    pub other_lines: Vec<String>,
}

impl CategoryCell {
    /// Parse cell text. Never fails; unrecognised lines land in `other_lines`.
    pub fn parse(text: &str) -> Self {
        let mut cell = CategoryCell::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if cell.estimate_line.is_none() && is_estimate_line(line) {
                cell.estimate_line = Some(line.to_string());
            } else if let Some(expression) =
                actual_line_expression(line).filter(|_| cell.actual_expression.is_none())
            {
                cell.actual_expression = Some(expression.to_string());
            } else {
                cell.other_lines.push(line.to_string());
            }
        }

        cell
    }

    /// Canonical text form
    pub fn serialize(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(2 + self.other_lines.len());
        if let Some(estimate) = &self.estimate_line {
            lines.push(estimate.clone());
        }
        if let Some(expression) = &self.actual_expression {
            lines.push(format!("={}", expression));
        }
        lines.extend(self.other_lines.iter().cloned());
        lines.join("\n")
    }

    /// True when the actual-spending line holds something other than whitespace
    pub fn has_actual_expression(&self) -> bool {
        self.actual_expression
            .as_deref()
            .is_some_and(|expr| !expr.trim().is_empty())
    }

    /// Content written before the two-line format existed: no `=` line but
    /// something besides an estimate line
    pub fn is_legacy(&self) -> bool {
        self.actual_expression.is_none() && !self.other_lines.is_empty()
    }

    /// Amount shown on the estimate line, 0.0 when absent or unreadable
    pub fn estimate_amount(&self, formatter: &MoneyFormatter) -> f64 {
        self.estimate_line
            .as_deref()
            .map(|line| formatter.parse_number(strip_estimate_prefix(line)))
            .unwrap_or(0.0)
    }

    /// Evaluation of the actual-spending line
    pub fn evaluate_actual(&self, formatter: &MoneyFormatter) -> Evaluation {
        match &self.actual_expression {
            Some(expr) => evaluate_expression(expr, formatter),
            None => Evaluation::Empty,
        }
    }
}

pub fn parse_cell(text: &str) -> CategoryCell {
    CategoryCell::parse(text)
}

pub fn format_estimate_line(amount: f64, formatter: &MoneyFormatter) -> String {
    format!("{} {}", ESTIMATE_PREFIX, formatter.format_currency(amount))
}

/// Rewrite legacy cell content into the two-line form.
///
/// Legacy cells hold a bare number (`50`) or a calculation followed by its
/// result (`90-55-20-40-15= 130`). The numeric tokens before the first `=`
/// are summed into the new estimate and the calculation text itself, with
/// thousands separators removed, becomes the actual-spending expression.
/// Text that is not legacy is returned in canonical form.
pub fn migrate_legacy_cell(text: &str, formatter: &MoneyFormatter) -> String {
    let cell = CategoryCell::parse(text);
    if !cell.is_legacy() {
        return cell.serialize();
    }

    // Legacy commas are thousands separators; the evaluator rejects them
    let legacy_text = cell.other_lines.join(" ").replace(',', "");
    let calculation = legacy_text.split('=').next().unwrap_or_default().trim();
    let estimate = sum_numeric_tokens(calculation);

    let migrated = CategoryCell {
        estimate_line: Some(format_estimate_line(estimate, formatter)),
        actual_expression: Some(calculation.to_string()),
        other_lines: Vec::new(),
    };
    migrated.serialize()
}

/// Refresh the derived estimate of a cell without touching user input.
///
/// A non-empty actual-spending line is kept byte for byte and only the
/// estimate line is replaced or inserted. An empty or machine-only cell is
/// regenerated as `Estimate: <amount>` followed by an empty `=` line.
pub fn synchronize_cell(existing: &str, derived_estimate: f64, formatter: &MoneyFormatter) -> String {
    let mut cell = CategoryCell::parse(existing);
    if cell.is_legacy() {
        cell = CategoryCell::parse(&migrate_legacy_cell(existing, formatter));
    }

    cell.estimate_line = Some(format_estimate_line(derived_estimate, formatter));
    if !cell.has_actual_expression() {
        cell.actual_expression = Some(String::new());
    }
    cell.serialize()
}

fn is_estimate_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.len() >= ESTIMATE_PREFIX.len()
        && trimmed.is_char_boundary(ESTIMATE_PREFIX.len())
        && trimmed[..ESTIMATE_PREFIX.len()].eq_ignore_ascii_case(ESTIMATE_PREFIX)
}

/// Text after the `=` of an actual-spending line. Leading whitespace before
/// the `=` is allowed; everything after it is returned untouched.
fn actual_line_expression(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix('=')
}

fn strip_estimate_prefix(line: &str) -> &str {
    let trimmed = line.trim_start();
    if is_estimate_line(trimmed) {
        &trimmed[ESTIMATE_PREFIX.len()..]
    } else {
        trimmed
    }
}

/// Sum every unsigned decimal literal in the text
fn sum_numeric_tokens(text: &str) -> f64 {
    let mut total = 0.0;
    let mut token = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() || c == '.' {
            token.push(c);
        } else if !token.is_empty() {
            total += token.parse::<f64>().unwrap_or(0.0);
            token.clear();
        }
    }

    total
}
