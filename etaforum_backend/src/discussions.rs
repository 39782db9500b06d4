use crate::config::AssistantConfig;
use crate::database::models::{AnswerPatch, CommentRecord, DiscussionRecord};
use crate::database::repositories::{CommentRepository, DiscussionRepository};
use crate::database::Database;
use crate::utils::{display_time_now, new_id, now_utc_iso};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct DiscussionService {
    database: Database,
    assistant: AssistantConfig,
}

impl DiscussionService {
    pub fn new(database: Database, assistant: AssistantConfig) -> Self {
        Self {
            database,
            assistant,
        }
    }

    pub fn list_discussions(&self) -> Result<Vec<DiscussionView>> {
        self.database.with_repositories(|repos| {
            let discussions = repos.discussions().list_recent()?;
            let comments_repo = repos.comments();
            let mut views = Vec::with_capacity(discussions.len());
            for discussion in discussions {
                let comments = comments_repo.list_for_discussion(&discussion.id)?;
                views.push(DiscussionView::from_records(discussion, comments));
            }
            Ok(views)
        })
    }

    pub fn get_discussion(&self, id: &str) -> Result<Option<DiscussionView>> {
        self.database.with_repositories(|repos| {
            let Some(discussion) = repos.discussions().get(id)? else {
                return Ok(None);
            };
            let comments = repos.comments().list_for_discussion(id)?;
            Ok(Some(DiscussionView::from_records(discussion, comments)))
        })
    }

    /// Stores a discussion together with the empty assistant comment that
    /// enrichment fills in later.
    pub fn create_discussion(&self, input: CreateDiscussionInput) -> Result<DiscussionView> {
        let reply_time = display_time_now();
        let discussion = DiscussionRecord {
            id: new_id(),
            title: input.title.unwrap_or_default(),
            content: input.content.unwrap_or_default(),
            user: input.user.unwrap_or_default(),
            avatar_url: input.avatar_url.unwrap_or_default(),
            reply_time: reply_time.clone(),
            views: None,
            created_at: now_utc_iso(),
            is_verified: false,
        };
        let placeholder = CommentRecord {
            id: new_id(),
            discussion_id: discussion.id.clone(),
            position: 0,
            user: self.assistant.name.clone(),
            avatar_url: self.assistant.avatar_url.clone(),
            content: String::new(),
            yt_embed_link: String::new(),
            yt_time: String::new(),
            book_src: String::new(),
            pageno: String::new(),
            reply_time,
            views: None,
        };

        self.database.with_repositories(|repos| {
            repos
                .discussions()
                .create_with_seed(&discussion, &placeholder)
        })?;

        self.get_discussion(&discussion.id)
            .and_then(|opt| opt.context("discussion creation lost newly inserted record"))
    }

    /// Writes an AI answer into comment 0. Returns `false` if the discussion
    /// has disappeared in the meantime.
    pub fn apply_answer(&self, id: &str, patch: &AnswerPatch) -> Result<bool> {
        self.database
            .with_repositories(|repos| repos.comments().apply_answer(id, patch))
    }

    pub fn set_verified(&self, id: &str, is_verified: bool) -> Result<Option<DiscussionView>> {
        let found = self
            .database
            .with_repositories(|repos| repos.discussions().set_verified(id, is_verified))?;
        if !found {
            return Ok(None);
        }
        self.get_discussion(id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscussionInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Wire shape of a discussion. `_id` mirrors `id` for older clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionView {
    pub id: String,
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub title: String,
    pub content: String,
    pub user: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: String,
    #[serde(rename = "replyTime")]
    pub reply_time: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub views: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    #[serde(rename = "_id")]
    pub legacy_id: String,
    pub user: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: String,
    pub content: String,
    #[serde(rename = "YTEmbedLink")]
    pub yt_embed_link: String,
    #[serde(rename = "YT_time")]
    pub yt_time: String,
    #[serde(rename = "Booksrc")]
    pub book_src: String,
    pub pageno: String,
    #[serde(rename = "replyTime")]
    pub reply_time: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub views: Option<i64>,
}

impl DiscussionView {
    fn from_records(record: DiscussionRecord, comments: Vec<CommentRecord>) -> Self {
        Self {
            legacy_id: record.id.clone(),
            id: record.id,
            title: record.title,
            content: record.content,
            user: record.user,
            avatar_url: record.avatar_url,
            reply_time: record.reply_time,
            views: record.views,
            created_at: record.created_at,
            is_verified: record.is_verified,
            comments: comments.into_iter().map(CommentView::from_record).collect(),
        }
    }
}

impl CommentView {
    fn from_record(record: CommentRecord) -> Self {
        Self {
            legacy_id: record.id.clone(),
            id: record.id,
            user: record.user,
            avatar_url: record.avatar_url,
            content: record.content,
            yt_embed_link: record.yt_embed_link,
            yt_time: record.yt_time,
            book_src: record.book_src,
            pageno: record.pageno,
            reply_time: record.reply_time,
            views: record.views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> DiscussionService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        DiscussionService::new(db, AssistantConfig::default())
    }

    #[test]
    fn failed_seed_insert_leaves_no_discussion() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(crate::database::MIGRATIONS)
            .expect("migrations");
        conn.execute_batch(
            r#"
            CREATE TRIGGER reject_comments BEFORE INSERT ON discussion_comments
            BEGIN
                SELECT RAISE(ABORT, 'comment rejected');
            END;
            "#,
        )
        .expect("trigger");
        let service =
            DiscussionService::new(Database::from_connection(conn, true), AssistantConfig::default());

        assert!(service.create_discussion(input("Orphans")).is_err());
        assert!(service.list_discussions().unwrap().is_empty());
    }

    fn input(title: &str) -> CreateDiscussionInput {
        CreateDiscussionInput {
            title: Some(title.into()),
            content: Some("How do lifetimes work?".into()),
            user: Some("carol".into()),
            avatar_url: Some("http://localhost:3000/carol.png".into()),
        }
    }

    #[test]
    fn creation_seeds_single_assistant_comment() {
        let service = setup_service();
        let created = service.create_discussion(input("Lifetimes")).expect("create");

        assert_eq!(created.title, "Lifetimes");
        assert_eq!(created.id, created.legacy_id);
        assert!(!created.is_verified);
        assert_eq!(created.comments.len(), 1);

        let seeded = &created.comments[0];
        assert_eq!(seeded.user, "ETA");
        assert_eq!(seeded.avatar_url, crate::config::DEFAULT_ASSISTANT_AVATAR_URL);
        assert!(seeded.content.is_empty());
        assert!(seeded.yt_embed_link.is_empty());
        assert!(seeded.yt_time.is_empty());
        assert!(seeded.book_src.is_empty());
        assert!(seeded.pageno.is_empty());
        assert!(!seeded.reply_time.is_empty());
    }

    #[test]
    fn list_returns_newest_first() {
        let service = setup_service();
        let first = service.create_discussion(input("one")).unwrap();
        let second = service.create_discussion(input("two")).unwrap();
        let third = service.create_discussion(input("three")).unwrap();

        let ids: Vec<String> = service
            .list_discussions()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn answer_fills_assistant_comment() {
        let service = setup_service();
        let created = service.create_discussion(input("Borrowing")).unwrap();
        let patch = AnswerPatch {
            content: "Shared or exclusive, never both.".into(),
            yt_embed_link: "ytvid_borrowck".into(),
            yt_time: "05:00".into(),
            book_src: "rust_book.pdf".into(),
            pageno: "71".into(),
        };

        assert!(service.apply_answer(&created.id, &patch).unwrap());
        let fetched = service.get_discussion(&created.id).unwrap().unwrap();
        assert_eq!(fetched.comments.len(), 1);
        assert_eq!(fetched.comments[0].content, patch.content);
        assert_eq!(fetched.comments[0].yt_embed_link, "ytvid_borrowck");
        assert_eq!(fetched.comments[0].book_src, "rust_book.pdf");

        assert!(!service.apply_answer("missing", &patch).unwrap());
    }

    #[test]
    fn verification_is_idempotent() {
        let service = setup_service();
        let created = service.create_discussion(input("Traits")).unwrap();

        let once = service.set_verified(&created.id, true).unwrap().unwrap();
        let twice = service.set_verified(&created.id, true).unwrap().unwrap();
        assert!(once.is_verified);
        assert!(twice.is_verified);
        assert_eq!(once.comments.len(), twice.comments.len());

        assert!(service.set_verified("missing", true).unwrap().is_none());
    }

    #[test]
    fn views_are_omitted_when_unset() {
        let service = setup_service();
        let created = service.create_discussion(input("Serde")).unwrap();
        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("views").is_none());
        assert_eq!(json["isVerified"], serde_json::json!(false));
        assert_eq!(json["comments"][0]["YT_time"], serde_json::json!(""));
        assert!(json["comments"][0]["id"].is_string());
    }
}
