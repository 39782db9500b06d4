use super::StoreError;
use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        let result = self.conn.execute(
            r#"
            INSERT INTO users (id, username, password_hash, created_at, is_ta, verification_code)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.username,
                record.password_hash,
                record.created_at,
                if record.is_ta { 1 } else { 0 },
                record.verification_code
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateUsername(record.username.clone()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, username, password_hash, created_at, is_ta, verification_code
                FROM users
                WHERE username = ?1
                "#,
                params![username],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: row.get(3)?,
                        is_ta: row.get::<_, i64>(4)? != 0,
                        verification_code: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    #[cfg(test)]
    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
