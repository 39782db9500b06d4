use crate::database::models::{AnswerPatch, CommentRecord};
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO discussion_comments (
                id, discussion_id, position, user, avatar_url, content,
                yt_embed_link, yt_time, book_src, pageno, reply_time, views
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.id,
                record.discussion_id,
                record.position,
                record.user,
                record.avatar_url,
                record.content,
                record.yt_embed_link,
                record.yt_time,
                record.book_src,
                record.pageno,
                record.reply_time,
                record.views
            ],
        )?;
        Ok(())
    }

    fn list_for_discussion(&self, discussion_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, discussion_id, position, user, avatar_url, content,
                   yt_embed_link, yt_time, book_src, pageno, reply_time, views
            FROM discussion_comments
            WHERE discussion_id = ?1
            ORDER BY position ASC
            "#,
        )?;
        let rows = stmt.query_map(params![discussion_id], |row| {
            Ok(CommentRecord {
                id: row.get(0)?,
                discussion_id: row.get(1)?,
                position: row.get(2)?,
                user: row.get(3)?,
                avatar_url: row.get(4)?,
                content: row.get(5)?,
                yt_embed_link: row.get(6)?,
                yt_time: row.get(7)?,
                book_src: row.get(8)?,
                pageno: row.get(9)?,
                reply_time: row.get(10)?,
                views: row.get(11)?,
            })
        })?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn apply_answer(&self, discussion_id: &str, patch: &AnswerPatch) -> Result<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE discussion_comments
            SET content = ?1,
                yt_embed_link = ?2,
                yt_time = ?3,
                book_src = ?4,
                pageno = ?5
            WHERE discussion_id = ?6 AND position = 0
            "#,
            params![
                patch.content,
                patch.yt_embed_link,
                patch.yt_time,
                patch.book_src,
                patch.pageno,
                discussion_id
            ],
        )?;
        Ok(changed > 0)
    }
}
