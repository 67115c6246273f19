//! # Budget Tracker Backend
//!
//! Contains all non-UI logic for the budget tracker: the monthly
//! reconciliation engine and the storage it is saved through.
//!
//! ## Architecture
//!
//! ```text
//! UI layer (any front end)
//!     ↓
//! MonthService (load, edit, reconcile, save)
//!     ↓                        ↓
//! Domain engine (pure)     Storage (months as JSON, settings as YAML)
//! ```
//!
//! The engine never performs I/O. Every recompute takes a `MonthRecord`
//! snapshot and returns a `ReconciledMonth`.

pub mod domain;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;

use domain::{ExportService, MonthService};
use storage::{ConfigRepository, ConfigStorage, FileConnection, MonthRepository};

/// Main backend struct that wires storage to the domain services
pub struct Backend {
    pub month_service: MonthService<MonthRepository>,
    pub export_service: ExportService,
    pub config_repository: ConfigRepository,
}

impl Backend {
    /// Create a backend over the given data directory connection
    pub fn new(connection: FileConnection) -> Result<Self> {
        let config_repository = ConfigRepository::new(connection.clone());
        let config = config_repository.get_config()?;

        let month_repository = Arc::new(MonthRepository::new(connection));
        let month_service = MonthService::new(month_repository, &config);
        let export_service = ExportService::new(config.formatter());

        Ok(Backend {
            month_service,
            export_service,
            config_repository,
        })
    }
}
