use crate::config::DatabaseConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub database: Database,
}

/// Opens the store and brings its schema up to date.
pub async fn initialize(database: &DatabaseConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    if let DatabaseConfig::File(path) = database {
        if let Some(parent) = path.parent() {
            create_dir_if_missing(parent, &mut directories_created)?;
        }
    }

    let database = Database::connect(database)?;
    let database_initialized = database.ensure_migrations()?;

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        database,
    })
}

fn create_dir_if_missing(path: &std::path::Path, created: &mut Vec<String>) -> Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        created.push(path.display().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("forum.db");
        let resources = initialize(&DatabaseConfig::file(&db_path))
            .await
            .expect("bootstrap");
        assert!(resources.database_initialized);
        assert_eq!(resources.directories_created.len(), 1);
        assert!(db_path.exists());
    }
}
