//! Weekly breakdown column schema.
//!
//! The breakdown table has exactly one cell per week per variable-cost
//! category, keyed by the sanitized category id. Whenever the category list
//! changes the rows are rebuilt: existing cell text is carried over to the
//! matching category, new categories get an empty cell, and the cells of
//! removed categories are dropped.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use shared::{MonthRecord, VariableCost, WeeklyBreakdownRow};
use thiserror::Error;

/// Column prefixes older data used in front of category keys
const LEGACY_COLUMN_PREFIXES: [&str; 2] = ["category-", "cat-"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CategoryError {
    #[error("Category name cannot be empty")]
    EmptyName,
    #[error("Category '{0}' already exists")]
    AlreadyExists(String),
    #[error("Category '{0}' not found")]
    NotFound(String),
}

/// Lowercase the name, collapse every run of non-alphanumerics into a single
/// hyphen and trim hyphens from both ends: "Eating Out / Takeaway" becomes
/// "eating-out-takeaway".
pub fn sanitize_category_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    id
}

/// A category rename: cells found under `from` move to `to`
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRename {
    pub from: String,
    pub to: String,
}

impl CategoryRename {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Rebuild every row so its cells match `categories` exactly.
///
/// Lookup order for each category's existing content: the sanitized id, the
/// raw category name, the old id of an explicit rename, then a
/// case-insensitive scan that ignores legacy column prefixes. The scan only
/// considers keys that are neither the id of a current category nor already
/// taken by an earlier lookup, so each existing cell moves to at most one
/// category.
pub fn rebuild_schema(
    categories: &[String],
    existing_rows: &[WeeklyBreakdownRow],
    renames: &[CategoryRename],
) -> Vec<WeeklyBreakdownRow> {
    let ids: Vec<String> = categories.iter().map(|c| sanitize_category_id(c)).collect();

    existing_rows
        .iter()
        .map(|row| {
            let (cells, claimed) = carry_cells(&row.cells, categories, &ids, renames);

            let dropped: Vec<&String> = row.cells.keys().filter(|key| !claimed.contains(*key)).collect();
            if !dropped.is_empty() {
                debug!("🧱 SCHEMA: Week {} dropping columns {:?}", row.date_range, dropped);
            }

            WeeklyBreakdownRow {
                cells,
                ..row.clone()
            }
        })
        .collect()
}

/// New cells for one row, plus the existing keys whose content was carried
fn carry_cells(
    existing: &BTreeMap<String, String>,
    categories: &[String],
    ids: &[String],
    renames: &[CategoryRename],
) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let mut claimed = BTreeSet::new();
    let mut found: Vec<Option<String>> = Vec::with_capacity(ids.len());

    for (category, id) in categories.iter().zip(ids) {
        let key = exact_match_key(existing, category, id, renames, &claimed);
        if let Some(key) = &key {
            claimed.insert(key.clone());
        }
        found.push(key);
    }

    for (slot, id) in found.iter_mut().zip(ids) {
        if slot.is_some() {
            continue;
        }
        let legacy = existing
            .keys()
            .filter(|key| !claimed.contains(*key) && !ids.contains(*key))
            .find(|key| normalize_column_key(key) == *id)
            .cloned();
        if let Some(key) = &legacy {
            claimed.insert(key.clone());
        }
        *slot = legacy;
    }

    let cells = ids
        .iter()
        .zip(found)
        .map(|(id, key)| {
            let content = key.and_then(|k| existing.get(&k).cloned()).unwrap_or_default();
            (id.clone(), content)
        })
        .collect();

    (cells, claimed)
}

fn exact_match_key(
    existing: &BTreeMap<String, String>,
    category: &str,
    id: &str,
    renames: &[CategoryRename],
    claimed: &BTreeSet<String>,
) -> Option<String> {
    let available = |key: &str| existing.contains_key(key) && !claimed.contains(key);

    if available(id) {
        return Some(id.to_string());
    }
    if available(category) {
        return Some(category.to_string());
    }
    for rename in renames.iter().filter(|r| sanitize_category_id(&r.to) == id) {
        let old_id = sanitize_category_id(&rename.from);
        if available(&old_id) {
            return Some(old_id);
        }
        if available(&rename.from) {
            return Some(rename.from.clone());
        }
    }
    None
}

fn normalize_column_key(key: &str) -> String {
    let id = sanitize_category_id(key);
    for prefix in LEGACY_COLUMN_PREFIXES {
        if let Some(rest) = id.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    id
}

/// Add a category with its monthly budget and an empty cell in every week
pub fn add_category(record: &mut MonthRecord, name: &str, monthly_budget: f64) -> Result<(), CategoryError> {
    let name = name.trim();
    let id = sanitize_category_id(name);
    if id.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    if find_category(record, &id).is_some() {
        return Err(CategoryError::AlreadyExists(name.to_string()));
    }

    record.variable_costs.push(VariableCost::new(name, monthly_budget));
    record.weekly_breakdown = rebuild_schema(&record.category_names(), &record.weekly_breakdown, &[]);
    info!("🧱 SCHEMA: Added category '{}' to {}", name, record.key);
    Ok(())
}

/// Rename a category, moving its weekly cells under the new id unchanged
pub fn rename_category(record: &mut MonthRecord, from: &str, to: &str) -> Result<(), CategoryError> {
    let to = to.trim();
    let new_id = sanitize_category_id(to);
    if new_id.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    let old_id = sanitize_category_id(from);
    let position = find_category(record, &old_id).ok_or_else(|| CategoryError::NotFound(from.to_string()))?;
    if new_id != old_id && find_category(record, &new_id).is_some() {
        return Err(CategoryError::AlreadyExists(to.to_string()));
    }

    let old_name = std::mem::replace(&mut record.variable_costs[position].category, to.to_string());
    let renames = [CategoryRename::new(&old_name, to)];
    record.weekly_breakdown = rebuild_schema(&record.category_names(), &record.weekly_breakdown, &renames);
    info!("🧱 SCHEMA: Renamed category '{}' to '{}' in {}", old_name, to, record.key);
    Ok(())
}

/// Remove a category. Its weekly cells are discarded; callers that need a
/// confirmation must ask before calling this.
pub fn remove_category(record: &mut MonthRecord, name: &str) -> Result<VariableCost, CategoryError> {
    let id = sanitize_category_id(name);
    let position = find_category(record, &id).ok_or_else(|| CategoryError::NotFound(name.to_string()))?;

    let removed = record.variable_costs.remove(position);
    record.weekly_breakdown = rebuild_schema(&record.category_names(), &record.weekly_breakdown, &[]);
    info!("🧱 SCHEMA: Removed category '{}' from {}", removed.category, record.key);
    Ok(removed)
}

fn find_category(record: &MonthRecord, id: &str) -> Option<usize> {
    record
        .variable_costs
        .iter()
        .position(|cost| sanitize_category_id(&cost.category) == id)
}
