use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub user: String,
    pub avatar_url: String,
    pub reply_time: String,
    pub views: Option<i64>,
    pub created_at: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub discussion_id: String,
    /// Zero-based slot within the discussion; 0 belongs to the assistant.
    pub position: i64,
    pub user: String,
    pub avatar_url: String,
    pub content: String,
    pub yt_embed_link: String,
    pub yt_time: String,
    pub book_src: String,
    pub pageno: String,
    pub reply_time: String,
    pub views: Option<i64>,
}

/// The AI-derived fields written into the assistant comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPatch {
    pub content: String,
    pub yt_embed_link: String,
    pub yt_time: String,
    pub book_src: String,
    pub pageno: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
    pub is_ta: bool,
    pub verification_code: String,
}
