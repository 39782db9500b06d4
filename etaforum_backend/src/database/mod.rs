pub mod models;
pub mod repositories;

use crate::config::DatabaseConfig;
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS discussions (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        user TEXT NOT NULL DEFAULT '',
        avatar_url TEXT NOT NULL DEFAULT '',
        reply_time TEXT NOT NULL DEFAULT '',
        views INTEGER,
        created_at TEXT NOT NULL,
        is_verified INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS discussion_comments (
        id TEXT PRIMARY KEY,
        discussion_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        user TEXT NOT NULL DEFAULT '',
        avatar_url TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        yt_embed_link TEXT NOT NULL DEFAULT '',
        yt_time TEXT NOT NULL DEFAULT '',
        book_src TEXT NOT NULL DEFAULT '',
        pageno TEXT NOT NULL DEFAULT '',
        reply_time TEXT NOT NULL DEFAULT '',
        views INTEGER,
        UNIQUE (discussion_id, position),
        FOREIGN KEY (discussion_id) REFERENCES discussions(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        is_ta INTEGER NOT NULL DEFAULT 0,
        verification_code TEXT NOT NULL DEFAULT ''
    );

    CREATE INDEX IF NOT EXISTS idx_discussions_created ON discussions(created_at);
    CREATE INDEX IF NOT EXISTS idx_comments_discussion ON discussion_comments(discussion_id);
"#;

/// Process-wide handle to the SQLite store. Cloning shares the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config {
            DatabaseConfig::InMemory => {
                let conn = Connection::open_in_memory()
                    .context("failed to open in-memory database")?;
                Ok(Self::from_connection(conn, true))
            }
            DatabaseConfig::File(path) => {
                let newly_created = !path.exists();
                let conn = Connection::open(path)
                    .with_context(|| format!("failed to open database at {}", path.display()))?;
                Ok(Self::from_connection(conn, newly_created))
            }
        }
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Applies the schema. Returns whether the database file was new.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)
                .context("failed to apply schema migrations")?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = Database::connect(&DatabaseConfig::InMemory).expect("open");
        assert!(db.ensure_migrations().expect("first run"));
        assert!(db.ensure_migrations().expect("second run"));
    }

    #[test]
    fn file_database_reports_creation_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DatabaseConfig::file(dir.path().join("forum.db"));

        let first = Database::connect(&config).expect("open");
        assert!(first.ensure_migrations().expect("migrate"));
        drop(first);

        let second = Database::connect(&config).expect("reopen");
        assert!(!second.ensure_migrations().expect("migrate again"));
    }
}
