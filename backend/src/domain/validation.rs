//! Month record validation run before a month is saved.

use std::collections::HashSet;

use shared::{MonthRecord, MonthValidationError};

use super::schema::sanitize_category_id;

/// Check the structural rules of a month record and return every problem found
pub fn validate_month(record: &MonthRecord) -> Vec<MonthValidationError> {
    let mut errors = Vec::new();

    if !(1..=12).contains(&record.month) {
        errors.push(MonthValidationError::MonthOutOfRange(record.month));
    } else {
        let expected = MonthRecord::generate_key(record.year, record.month);
        if record.key != expected {
            errors.push(MonthValidationError::KeyMismatch {
                key: record.key.clone(),
                expected,
            });
        }
    }

    let mut seen = HashSet::new();
    for (position, cost) in record.variable_costs.iter().enumerate() {
        let id = sanitize_category_id(&cost.category);
        if id.is_empty() {
            errors.push(MonthValidationError::EmptyCategoryName(position));
        } else if !seen.insert(id) {
            errors.push(MonthValidationError::DuplicateCategory(cost.category.clone()));
        }
    }

    errors
}
