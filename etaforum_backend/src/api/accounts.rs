use super::{ApiError, AppState};
use crate::accounts::{AccountError, AccountService, LoginInput, PublicUser, RegisterInput};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct RegisterResponse {
    message: &'static str,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    user: PublicUser,
}

fn service(state: &AppState) -> AccountService {
    AccountService::new(state.database.clone(), state.config.accounts.clone())
}

/// Runs password hashing off the async workers.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<Result<T, AccountError>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(AccountService) -> Result<T, AccountError> + Send + 'static,
{
    let service = service(state);
    tokio::task::spawn_blocking(move || f(service))
        .await
        .map_err(|err| ApiError::internal("account task failed", err.into()))
}

pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(input) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "unreadable registration body");
        ApiError::Rejected {
            message: "Error creating user".into(),
            error: rejection.body_text(),
        }
    })?;
    match run_blocking(&state, move |service| service.register(input)).await? {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "new user registered");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "User created successfully",
                    user_id,
                }),
            ))
        }
        Err(AccountError::InvalidTaCode) => {
            tracing::warn!("TA registration rejected: wrong verification code");
            Err(ApiError::BadRequest(AccountError::InvalidTaCode.to_string()))
        }
        Err(err) => {
            tracing::error!(error = %err, "error creating user");
            Err(ApiError::Rejected {
                message: "Error creating user".into(),
                error: err.to_string(),
            })
        }
    }
}

pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(input) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let username = input.username.clone().unwrap_or_default();
    match run_blocking(&state, move |service| service.login(input)).await? {
        Ok(user) => {
            tracing::info!(%username, "user logged in");
            Ok(Json(LoginResponse { user }))
        }
        Err(AccountError::UserNotFound) => {
            tracing::info!(%username, "login failed: user not found");
            Err(ApiError::NotFound(AccountError::UserNotFound.to_string()))
        }
        Err(AccountError::IncorrectPassword) => {
            tracing::info!(%username, "login failed: incorrect password");
            Err(ApiError::Unauthorized(
                AccountError::IncorrectPassword.to_string(),
            ))
        }
        Err(AccountError::Store(err)) => Err(ApiError::internal("Failed to log in", err)),
        Err(other) => Err(ApiError::internal("Failed to log in", other.into())),
    }
}
