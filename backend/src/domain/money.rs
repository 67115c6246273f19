//! Money formatting and lenient amount parsing.
//!
//! Every amount that goes into a cell or a payments-due line is rendered here,
//! and every amount read back from free text passes through `parse_number`.
//! Parsing never fails: unreadable input counts as zero.

use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";

/// Currency formatter configured with the user's currency symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyFormatter {
    pub currency_symbol: String,
}

impl Default for MoneyFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOL)
    }
}

impl MoneyFormatter {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            currency_symbol: currency_symbol.to_string(),
        }
    }

    /// Format amount for display, e.g. "£70.00" or "-£5.50"
    pub fn format_currency(&self, amount: f64) -> String {
        // Avoid rendering "-£0.00" for tiny negative rounding residue
        let rounded = (amount * 100.0).round() / 100.0;
        if rounded < 0.0 {
            format!("-{}{:.2}", self.currency_symbol, rounded.abs())
        } else {
            format!("{}{:.2}", self.currency_symbol, rounded.abs())
        }
    }

    /// Clean and parse an amount string; 0.0 for anything unparseable
    pub fn parse_number(&self, input: &str) -> f64 {
        self.clean_and_parse_amount(input).unwrap_or(0.0)
    }

    /// Clean and parse amount input string, reporting why parsing failed
    pub fn clean_and_parse_amount(&self, input: &str) -> Result<f64, String> {
        let cleaned = self
            .strip_currency_symbol(input.trim())
            .replace(',', "")
            .replace(' ', "");

        if cleaned.is_empty() {
            return Err("Empty amount after cleaning".to_string());
        }

        let value = cleaned
            .parse::<f64>()
            .map_err(|e| format!("Invalid number format: {}", e))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("Amount is not finite: {}", cleaned))
        }
    }

    /// Remove every occurrence of the currency symbol
    pub fn strip_currency_symbol(&self, input: &str) -> String {
        if self.currency_symbol.is_empty() {
            input.to_string()
        } else {
            input.replace(&self.currency_symbol, "")
        }
    }
}
