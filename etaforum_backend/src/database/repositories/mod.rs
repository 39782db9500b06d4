mod comments;
mod discussions;
mod users;

use super::models::{AnswerPatch, CommentRecord, DiscussionRecord, UserRecord};
use anyhow::Result;
use rusqlite::Connection;

/// Store failures callers need to tell apart from plain I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),
}

pub trait DiscussionRepository {
    fn create(&self, record: &DiscussionRecord) -> Result<()>;
    /// Inserts the discussion and its first comment atomically.
    fn create_with_seed(&self, record: &DiscussionRecord, seed: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<DiscussionRecord>>;
    /// Every discussion, newest first.
    fn list_recent(&self) -> Result<Vec<DiscussionRecord>>;
    /// Returns `false` when no discussion has this id.
    fn set_verified(&self, id: &str, is_verified: bool) -> Result<bool>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn list_for_discussion(&self, discussion_id: &str) -> Result<Vec<CommentRecord>>;
    /// Overwrites the AI-derived fields of the comment at position 0.
    /// Returns `false` when there is nothing to update.
    fn apply_answer(&self, discussion_id: &str, patch: &AnswerPatch) -> Result<bool>;
}

pub trait UserRepository {
    /// Fails with [`StoreError::DuplicateUsername`] when the name is taken.
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    #[cfg(test)]
    fn count(&self) -> Result<usize>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn discussions(&self) -> impl DiscussionRepository + '_ {
        discussions::SqliteDiscussionRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }
}
