use crate::config::AccountsConfig;
use crate::database::models::UserRecord;
use crate::database::repositories::{StoreError, UserRepository};
use crate::database::Database;
use crate::utils::{new_id, now_utc_iso};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid verification code for TA.")]
    InvalidTaCode,
    #[error("User validation failed: {0} is required")]
    MissingField(&'static str),
    #[error("{0}")]
    UsernameTaken(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, rename = "isTA")]
    pub is_ta: Option<bool>,
    #[serde(default, rename = "verificationCode")]
    pub verification_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The only user fields ever sent back to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "isTA")]
    pub is_ta: bool,
}

#[derive(Clone)]
pub struct AccountService {
    database: Database,
    config: AccountsConfig,
}

impl AccountService {
    pub fn new(database: Database, config: AccountsConfig) -> Self {
        Self { database, config }
    }

    /// Creates a user and returns its id.
    pub fn register(&self, input: RegisterInput) -> Result<String, AccountError> {
        let is_ta = input.is_ta.unwrap_or(false);
        if is_ta && !self.ta_code_matches(input.verification_code.as_deref()) {
            return Err(AccountError::InvalidTaCode);
        }

        let username = input
            .username
            .filter(|name| !name.is_empty())
            .ok_or(AccountError::MissingField("username"))?;
        let password = input
            .password
            .filter(|password| !password.is_empty())
            .ok_or(AccountError::MissingField("password"))?;

        let record = UserRecord {
            id: new_id(),
            username,
            password_hash: hash_password(&password)?,
            created_at: now_utc_iso(),
            is_ta,
            verification_code: input.verification_code.unwrap_or_default(),
        };

        self.database
            .with_repositories(|repos| repos.users().create(&record))
            .map_err(|err| match err.downcast::<StoreError>() {
                Ok(conflict) => AccountError::UsernameTaken(conflict.to_string()),
                Err(other) => AccountError::Store(other),
            })?;
        Ok(record.id)
    }

    pub fn login(&self, input: LoginInput) -> Result<PublicUser, AccountError> {
        let username = input.username.unwrap_or_default();
        let user = self
            .database
            .with_repositories(|repos| repos.users().find_by_username(&username))?
            .ok_or(AccountError::UserNotFound)?;

        let password = input.password.unwrap_or_default();
        if !verify_password(&password, &user.password_hash)? {
            return Err(AccountError::IncorrectPassword);
        }

        Ok(PublicUser {
            id: user.id,
            username: user.username,
            is_ta: user.is_ta,
        })
    }

    fn ta_code_matches(&self, supplied: Option<&str>) -> bool {
        match (self.config.ta_verification_code.as_deref(), supplied) {
            (Some(expected), Some(supplied)) => expected == supplied,
            _ => false,
        }
    }
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hashing(err.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AccountError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| AccountError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
