//! # Domain Module
//!
//! The monthly budget reconciliation engine and the services around it.
//!
//! ## Module Organization
//!
//! - **calendar**: month lengths, month names and the Monday-aligned week partition
//! - **money**: currency formatting and lenient amount parsing
//! - **expression**: restricted arithmetic evaluator for actual-spending lines
//! - **cell**: the category cell mini-language (estimate line + `=` line)
//! - **allocation**: dated items to weeks, weekly budget shares, payments due
//! - **schema**: sanitized category ids and weekly column rebuilds
//! - **aggregation**: the idempotent reconciliation pass and month totals
//! - **validation**: structural checks on a month before saving
//! - **month_service**: load / reconcile / save orchestration over storage
//! - **export_service**: CSV export of the weekly breakdown
//!
//! ## Business Rules
//!
//! - A category's actual spending is derived from its weekly cells only
//! - Only paid fixed costs and unplanned expenses count toward a week's actual
//! - Estimates come from fixed costs and category budgets, never from
//!   unplanned expenses
//! - User-entered actual-spending lines are never rewritten
//! - Unreadable amounts and expressions count as zero

pub mod aggregation;
pub mod allocation;
pub mod calendar;
pub mod cell;
pub mod export_service;
pub mod expression;
pub mod money;
pub mod month_service;
pub mod schema;
pub mod validation;

pub use aggregation::{calculate_totals, reconcile_month, ReconciliationService};
pub use calendar::CalendarService;
pub use cell::{migrate_legacy_cell, parse_cell, synchronize_cell, CategoryCell};
pub use export_service::ExportService;
pub use expression::{evaluate_expression, Evaluation};
pub use money::MoneyFormatter;
pub use month_service::MonthService;
pub use schema::{rebuild_schema, sanitize_category_id, CategoryError, CategoryRename};
