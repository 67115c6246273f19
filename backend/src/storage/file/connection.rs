use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default data directory
pub const DATA_DIR_ENV: &str = "BUDGET_TRACKER_DATA_DIR";

/// FileConnection manages the data directory layout shared by the repositories
#[derive(Clone, Debug)]
pub struct FileConnection {
    base_directory: PathBuf,
}

impl FileConnection {
    /// Create a new connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .with_context(|| format!("Failed to create data directory {}", base_path.display()))?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory.
    ///
    /// Uses `$BUDGET_TRACKER_DATA_DIR` when set, otherwise
    /// `~/Documents/Budget Tracker`.
    pub fn new_default() -> Result<Self> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            info!("Using data directory from {}: {}", DATA_DIR_ENV, dir);
            return Self::new(dir);
        }

        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let data_dir = PathBuf::from(home_dir).join("Documents").join("Budget Tracker");
        info!("Using default data directory: {}", data_dir.display());
        Self::new(data_dir)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding one JSON file per month
    pub fn months_directory(&self) -> PathBuf {
        self.base_directory.join("months")
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_directory.join("budget_config.yaml")
    }

    /// Write `content` to `path` through a temporary file and a rename
    pub fn write_atomically(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move {} into place", temp_path.display()))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nested").join("data");

        let connection = FileConnection::new(&base).unwrap();
        assert!(base.exists());
        assert_eq!(connection.base_directory(), base.as_path());
        assert_eq!(connection.months_directory(), base.join("months"));
        assert_eq!(connection.config_path(), base.join("budget_config.yaml"));
    }

    #[test]
    fn test_write_atomically_creates_parents_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let connection = FileConnection::new(temp_dir.path()).unwrap();
        let target = connection.months_directory().join("2025-04.json");

        connection.write_atomically(&target, "{}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
        assert!(!target.with_extension("tmp").exists());
    }
}
