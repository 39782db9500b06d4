use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_PORT: u16 = 3800;
pub const DEFAULT_ASSISTANT_AVATAR_URL: &str = "http://localhost:3000/ETA.png";

#[derive(Debug, Clone)]
pub struct ForumConfig {
    pub api_port: u16,
    pub database: DatabaseConfig,
    pub rag: RagConfig,
    pub accounts: AccountsConfig,
    pub assistant: AssistantConfig,
}

impl ForumConfig {
    pub fn from_env() -> Result<Self> {
        let api_port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);
        let database = DatabaseConfig::from_env()?;
        let rag = RagConfig::from_env()?;
        let accounts = AccountsConfig::from_env();
        let assistant = AssistantConfig::from_env();
        Ok(Self {
            api_port,
            database,
            rag,
            accounts,
            assistant,
        })
    }

    pub fn new(api_port: u16, database: DatabaseConfig, rag: RagConfig) -> Self {
        Self {
            api_port,
            database,
            rag,
            accounts: AccountsConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }

    pub fn with_ta_code(mut self, code: impl Into<String>) -> Self {
        self.accounts.ta_verification_code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    File(PathBuf),
    InMemory,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let raw = env::var("DATABASE_URL")
            .map_err(|_| anyhow!("DATABASE_URL must be set to a SQLite path"))?;
        Self::parse(&raw)
    }

    /// Accepts a bare path, a `sqlite://` URL or `:memory:`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let path = trimmed.strip_prefix("sqlite://").unwrap_or(trimmed);
        if path.is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if path == ":memory:" {
            return Ok(Self::InMemory);
        }
        Ok(Self::File(PathBuf::from(path)))
    }

    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl RagConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    pub fn from_env() -> Result<Self> {
        let endpoint = env::var("RAG_API_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| anyhow!("RAG_API_URL must be set"))?;
        // No timeout unless explicitly configured.
        let timeout = env::var("RAG_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Ok(Self { endpoint, timeout })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountsConfig {
    /// Shared secret a registrant must present to become a TA. `None` rejects
    /// every TA registration.
    pub ta_verification_code: Option<String>,
}

impl AccountsConfig {
    pub fn from_env() -> Self {
        let ta_verification_code = env::var("TA_VERIFICATION_CODE").ok().and_then(|raw| {
            if raw.is_empty() {
                None
            } else {
                Some(raw)
            }
        });
        Self {
            ta_verification_code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub name: String,
    pub avatar_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "ETA".into(),
            avatar_url: DEFAULT_ASSISTANT_AVATAR_URL.into(),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("ETA_AVATAR_URL") {
            if !url.trim().is_empty() {
                config.avatar_url = url;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_accepts_sqlite_prefix_and_memory() {
        assert_eq!(
            DatabaseConfig::parse("sqlite://data/forum.db").unwrap(),
            DatabaseConfig::File(PathBuf::from("data/forum.db"))
        );
        assert_eq!(
            DatabaseConfig::parse("/var/lib/forum.db").unwrap(),
            DatabaseConfig::File(PathBuf::from("/var/lib/forum.db"))
        );
        assert_eq!(
            DatabaseConfig::parse("sqlite://:memory:").unwrap(),
            DatabaseConfig::InMemory
        );
        assert!(DatabaseConfig::parse("  ").is_err());
    }

    #[test]
    fn new_config_has_no_ta_code() {
        let config = ForumConfig::new(
            DEFAULT_API_PORT,
            DatabaseConfig::InMemory,
            RagConfig::new("http://localhost:9000/query"),
        );
        assert!(config.accounts.ta_verification_code.is_none());
        assert_eq!(config.assistant.name, "ETA");
        let config = config.with_ta_code("s3cret");
        assert_eq!(config.accounts.ta_verification_code.as_deref(), Some("s3cret"));
    }
}
