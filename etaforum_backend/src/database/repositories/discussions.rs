use super::comments::SqliteCommentRepository;
use super::CommentRepository;
use crate::database::models::{CommentRecord, DiscussionRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteDiscussionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, content, user, avatar_url, reply_time, views, created_at, is_verified
    FROM discussions
"#;

fn map_row(row: &Row<'_>) -> rusqlite::Result<DiscussionRecord> {
    Ok(DiscussionRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        user: row.get(3)?,
        avatar_url: row.get(4)?,
        reply_time: row.get(5)?,
        views: row.get(6)?,
        created_at: row.get(7)?,
        is_verified: row.get::<_, i64>(8)? != 0,
    })
}

impl<'conn> super::DiscussionRepository for SqliteDiscussionRepository<'conn> {
    fn create(&self, record: &DiscussionRecord) -> Result<()> {
        insert_discussion(self.conn, record)
    }

    fn create_with_seed(&self, record: &DiscussionRecord, seed: &CommentRecord) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_discussion(&tx, record)?;
        SqliteCommentRepository { conn: &tx }.create(seed)?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<DiscussionRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], map_row)
            .optional()?;
        Ok(row)
    }

    fn list_recent(&self) -> Result<Vec<DiscussionRecord>> {
        // rowid breaks ties between inserts sharing a timestamp
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_row)?;

        let mut discussions = Vec::new();
        for row in rows {
            discussions.push(row?);
        }
        Ok(discussions)
    }

    fn set_verified(&self, id: &str, is_verified: bool) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE discussions
            SET is_verified = ?1
            WHERE id = ?2
            "#,
            params![if is_verified { 1 } else { 0 }, id],
        )?;
        Ok(changed > 0)
    }
}

fn insert_discussion(conn: &Connection, record: &DiscussionRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO discussions (id, title, content, user, avatar_url, reply_time, views, created_at, is_verified)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            record.id,
            record.title,
            record.content,
            record.user,
            record.avatar_url,
            record.reply_time,
            record.views,
            record.created_at,
            if record.is_verified { 1 } else { 0 }
        ],
    )?;
    Ok(())
}
