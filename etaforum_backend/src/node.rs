use crate::api;
use crate::bootstrap::{self, BootstrapResources};
use crate::config::ForumConfig;
use crate::database::Database;
use crate::rag::{AnswerSource, RagClient};
use anyhow::Result;
use std::sync::Arc;

/// Bootstraps the backend once and hands out the shared handles the HTTP
/// server needs.
pub struct ForumNode {
    config: ForumConfig,
    bootstrap: BootstrapResources,
    answers: Arc<dyn AnswerSource>,
}

impl ForumNode {
    /// Opens the database and builds the answer service client.
    pub async fn start(config: ForumConfig) -> Result<Self> {
        let rag = RagClient::new(&config.rag)?;
        tracing::info!(endpoint = %rag.endpoint(), "answer service configured");
        Self::start_with_answers(config, Arc::new(rag)).await
    }

    /// Same as [`ForumNode::start`] with a caller-supplied answer source.
    pub async fn start_with_answers(
        config: ForumConfig,
        answers: Arc<dyn AnswerSource>,
    ) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config.database).await?;

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            "forum node initialized"
        );

        Ok(Self {
            config,
            bootstrap,
            answers,
        })
    }

    /// Runs the REST API server until shutdown.
    pub async fn run_http_server(&self) -> Result<()> {
        api::serve_http(
            self.config.clone(),
            self.database(),
            self.answers.clone(),
        )
        .await
    }

    /// Returns a clone of the database handle.
    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }

    pub fn config(&self) -> &ForumConfig {
        &self.config
    }
}
