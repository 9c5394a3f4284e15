use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod migrations;
pub mod queries;
pub mod store;

#[cfg(test)]
pub mod test_helpers;

pub use migrations::run_migrations;
pub use store::{ScanRecordStore, SqliteScanStore};

pub const DATA_DIR_VAR: &str = "VIGIL_DATA_DIR";
pub const DB_FILE_NAME: &str = "vigil.db";

/// Get the database file path, creating its directory if needed
pub fn get_db_path() -> Result<PathBuf> {
    let data_dir = match std::env::var(DATA_DIR_VAR) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("./data"),
    };

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    Ok(data_dir.join(DB_FILE_NAME))
}
