//! Client for the external question-answering (RAG) service.
//!
//! The service takes `{"query": "..."}` and answers with
//! `{"answer": "...", "sources": [{"document": "...", "page": "..."}]}`.

use crate::config::RagConfig;
use crate::database::models::AnswerPatch;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};

/// Marker that identifies video transcripts among the returned sources.
pub const VIDEO_SOURCE_MARKER: &str = "ytvid";

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("failed to reach answer service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("answer service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("answer service sent a malformed body: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<RagSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagSource {
    pub document: String,
    #[serde(default, deserialize_with = "page_as_text")]
    pub page: String,
}

impl RagSource {
    pub fn is_video(&self) -> bool {
        self.document.contains(VIDEO_SOURCE_MARKER)
    }
}

// Some indexes report page numbers as integers.
fn page_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Page {
        Text(String),
        Number(serde_json::Number),
        Missing(()),
    }

    Ok(match Page::deserialize(deserializer)? {
        Page::Text(text) => text,
        Page::Number(number) => number.to_string(),
        Page::Missing(()) => String::new(),
    })
}

impl RagAnswer {
    /// Picks the first video and the first non-video source and lays the
    /// answer out as the assistant comment's fields.
    pub fn to_patch(&self) -> AnswerPatch {
        let video = self.sources.iter().find(|source| source.is_video());
        let book = self.sources.iter().find(|source| !source.is_video());
        AnswerPatch {
            content: self.answer.clone(),
            yt_embed_link: video.map(|s| s.document.clone()).unwrap_or_default(),
            yt_time: video.map(|s| s.page.clone()).unwrap_or_default(),
            book_src: book.map(|s| s.document.clone()).unwrap_or_default(),
            pageno: book.map(|s| s.page.clone()).unwrap_or_default(),
        }
    }
}

/// Anything that can answer a forum question.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn get_answer(&self, query: &str) -> Result<RagAnswer, RagError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Clone)]
pub struct RagClient {
    endpoint: String,
    client: reqwest::Client,
}

impl RagClient {
    pub fn new(config: &RagConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("etaforum/0.1.0");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed to build answer service HTTP client")?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerSource for RagClient {
    async fn get_answer(&self, query: &str) -> Result<RagAnswer, RagError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(RagError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(RagError::Status { status, body });
        }

        let bytes = response.bytes().await.map_err(RagError::Transport)?;
        let answer: RagAnswer = serde_json::from_slice(&bytes).map_err(RagError::Malformed)?;
        tracing::debug!(sources = answer.sources.len(), "answer service responded");
        Ok(answer)
    }
}
