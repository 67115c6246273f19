//! # File Storage Module
//!
//! File-based storage for the budget tracker. Months are JSON documents named
//! after their key, settings are a single YAML file. Every write goes to a
//! temporary file first and is then renamed over the target.

pub mod config_repository;
pub mod connection;
pub mod month_repository;

#[cfg(test)]
pub mod test_utils;

pub use config_repository::{BudgetConfig, ConfigRepository};
pub use connection::FileConnection;
pub use month_repository::MonthRepository;
