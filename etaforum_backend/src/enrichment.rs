//! Detached follow-up that asks the answer service about a new discussion
//! and writes the reply into the assistant comment.
//!
//! Runs at most once per discussion. Failures are logged and dropped.

use crate::discussions::DiscussionService;
use crate::rag::AnswerSource;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Outcome of one enrichment run, mostly useful to tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Applied,
    DiscussionGone,
    UpstreamFailed,
    StoreFailed,
}

/// Spawns the enrichment task and returns immediately.
pub fn spawn(
    discussions: DiscussionService,
    answers: Arc<dyn AnswerSource>,
    discussion_id: String,
    query: String,
) -> JoinHandle<EnrichmentOutcome> {
    tokio::spawn(async move { run(&discussions, answers.as_ref(), &discussion_id, &query).await })
}

pub async fn run(
    discussions: &DiscussionService,
    answers: &dyn AnswerSource,
    discussion_id: &str,
    query: &str,
) -> EnrichmentOutcome {
    let answer = match answers.get_answer(query).await {
        Ok(answer) => answer,
        Err(err) => {
            tracing::error!(discussion_id = %discussion_id, error = %err, "failed to get AI response");
            return EnrichmentOutcome::UpstreamFailed;
        }
    };

    let patch = answer.to_patch();
    match discussions.apply_answer(discussion_id, &patch) {
        Ok(true) => {
            tracing::info!(
                discussion_id = %discussion_id,
                has_video = !patch.yt_embed_link.is_empty(),
                has_book = !patch.book_src.is_empty(),
                "discussion updated with AI response"
            );
            EnrichmentOutcome::Applied
        }
        Ok(false) => {
            tracing::warn!(discussion_id = %discussion_id, "discussion vanished before AI response arrived");
            EnrichmentOutcome::DiscussionGone
        }
        Err(err) => {
            tracing::error!(discussion_id = %discussion_id, error = ?err, "failed to store AI response");
            EnrichmentOutcome::StoreFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;
    use crate::database::Database;
    use crate::discussions::CreateDiscussionInput;
    use crate::rag::{RagAnswer, RagError, RagSource};
    use async_trait::async_trait;
    use rusqlite::Connection;

    struct FixedAnswer(RagAnswer);

    #[async_trait]
    impl AnswerSource for FixedAnswer {
        async fn get_answer(&self, _query: &str) -> Result<RagAnswer, RagError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenUpstream;

    #[async_trait]
    impl AnswerSource for BrokenUpstream {
        async fn get_answer(&self, _query: &str) -> Result<RagAnswer, RagError> {
            Err(RagError::Malformed(
                serde_json::from_str::<RagAnswer>("not json").unwrap_err(),
            ))
        }
    }

    fn setup_service() -> DiscussionService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        DiscussionService::new(db, AssistantConfig::default())
    }

    fn create(service: &DiscussionService) -> String {
        service
            .create_discussion(CreateDiscussionInput {
                title: Some("Recursion".into()),
                content: Some("What is a base case?".into()),
                user: Some("kim".into()),
                avatar_url: None,
            })
            .expect("create")
            .id
    }

    #[tokio::test]
    async fn successful_answer_is_written_to_first_comment() {
        let service = setup_service();
        let id = create(&service);
        let answers: Arc<dyn AnswerSource> = Arc::new(FixedAnswer(RagAnswer {
            answer: "The case that stops the recursion.".into(),
            sources: vec![
                RagSource {
                    document: "sicp.pdf".into(),
                    page: "33".into(),
                },
                RagSource {
                    document: "ytvid_recursion".into(),
                    page: "02:10".into(),
                },
            ],
        }));

        let outcome = spawn(service.clone(), answers, id.clone(), "What is a base case?".into())
            .await
            .expect("task");
        assert_eq!(outcome, EnrichmentOutcome::Applied);

        let stored = service.get_discussion(&id).unwrap().unwrap();
        let first = &stored.comments[0];
        assert_eq!(first.content, "The case that stops the recursion.");
        assert_eq!(first.yt_embed_link, "ytvid_recursion");
        assert_eq!(first.yt_time, "02:10");
        assert_eq!(first.book_src, "sicp.pdf");
        assert_eq!(first.pageno, "33");
    }

    #[tokio::test]
    async fn upstream_failure_leaves_discussion_untouched() {
        let service = setup_service();
        let id = create(&service);

        let outcome = run(&service, &BrokenUpstream, &id, "anything").await;
        assert_eq!(outcome, EnrichmentOutcome::UpstreamFailed);

        let stored = service.get_discussion(&id).unwrap().unwrap();
        assert_eq!(stored.comments.len(), 1);
        assert!(stored.comments[0].content.is_empty());
    }

    #[tokio::test]
    async fn missing_discussion_is_silent() {
        let service = setup_service();
        let answers = FixedAnswer(RagAnswer {
            answer: "late".into(),
            sources: vec![],
        });
        let outcome = run(&service, &answers, "does-not-exist", "q").await;
        assert_eq!(outcome, EnrichmentOutcome::DiscussionGone);
    }
}
