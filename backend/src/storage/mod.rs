//! # Storage Module
//!
//! Persistence for month records and budget settings.
//!
//! The domain layer depends only on the traits in [`traits`]; the file-backed
//! implementation in [`file`] keeps one JSON document per month and a YAML
//! settings file under a single data directory:
//!
//! ```text
//! data/
//! ├── budget_config.yaml
//! └── months/
//!     ├── 2025-03.json
//!     └── 2025-04.json
//! ```

pub mod file;
pub mod traits;

pub use file::{BudgetConfig, ConfigRepository, FileConnection, MonthRepository};
pub use traits::{ConfigStorage, MonthStorage};
