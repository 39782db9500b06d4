use super::{ApiError, ApiResult, AppState};
use crate::discussions::{CreateDiscussionInput, DiscussionService, DiscussionView};
use crate::enrichment;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    #[serde(default, rename = "isVerified")]
    is_verified: Option<bool>,
}

fn service(state: &AppState) -> DiscussionService {
    DiscussionService::new(state.database.clone(), state.config.assistant.clone())
}

pub(crate) async fn list_discussions(
    State(state): State<AppState>,
) -> ApiResult<Vec<DiscussionView>> {
    let discussions = service(&state)
        .list_discussions()
        .map_err(|err| ApiError::internal("Failed to fetch discussions", err))?;
    tracing::info!(count = discussions.len(), "fetched discussions");
    Ok(Json(discussions))
}

pub(crate) async fn get_discussion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DiscussionView> {
    match service(&state).get_discussion(&id) {
        Ok(Some(discussion)) => {
            tracing::info!(discussion_id = %id, "fetched discussion");
            Ok(Json(discussion))
        }
        Ok(None) => Err(ApiError::NotFound("Discussion not found".into())),
        Err(err) => Err(ApiError::internal("Failed to fetch discussion", err)),
    }
}

/// Stores the discussion, answers 201, and leaves the AI lookup running in
/// the background.
pub(crate) async fn create_discussion(
    State(state): State<AppState>,
    body: Result<Json<CreateDiscussionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DiscussionView>), ApiError> {
    let Json(input) = body.map_err(|rejection| ApiError::BadRequestText(rejection.body_text()))?;
    let service = service(&state);
    let query = input.content.clone().unwrap_or_default();
    let created = service.create_discussion(input).map_err(|err| {
        let message = format!("{err:#}");
        ApiError::internal_text(message, err)
    })?;
    tracing::info!(discussion_id = %created.id, "new discussion created");

    // Dropping the handle detaches the task.
    let _ = enrichment::spawn(
        service,
        state.answers.clone(),
        created.id.clone(),
        query,
    );

    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn verify_discussion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<DiscussionView> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequestText(rejection.body_text()))?;
    let service = service(&state);
    let result = match request.is_verified {
        Some(is_verified) => service.set_verified(&id, is_verified),
        None => service.get_discussion(&id),
    };
    match result {
        Ok(Some(discussion)) => {
            tracing::info!(
                discussion_id = %id,
                is_verified = discussion.is_verified,
                "discussion verification updated"
            );
            Ok(Json(discussion))
        }
        Ok(None) => Err(ApiError::NotFound("Discussion not found".into())),
        Err(err) => Err(ApiError::internal_text("Failed to verify discussion", err)),
    }
}
