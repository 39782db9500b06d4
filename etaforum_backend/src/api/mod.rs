mod accounts;
mod discussions;

use crate::config::ForumConfig;
use crate::database::Database;
use crate::rag::AnswerSource;
use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: ForumConfig,
    pub database: Database,
    pub answers: Arc<dyn AnswerSource>,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{message}`.
    BadRequest(String),
    /// 400 with a plain-text body.
    BadRequestText(String),
    /// 400 with `{message, error}`.
    Rejected { message: String, error: String },
    Unauthorized(String),
    NotFound(String),
    /// 500 with `{message}`; the source is only logged.
    Internal {
        message: String,
        source: anyhow::Error,
    },
    /// 500 with a plain-text body.
    InternalText {
        message: String,
        source: anyhow::Error,
    },
}

impl ApiError {
    pub(crate) fn internal(message: impl Into<String>, source: anyhow::Error) -> Self {
        ApiError::Internal {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn internal_text(message: impl Into<String>, source: anyhow::Error) -> Self {
        ApiError::InternalText {
            message: message.into(),
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let json = |status: StatusCode, message: String| {
            (
                status,
                Json(ErrorResponse {
                    message,
                    error: None,
                }),
            )
                .into_response()
        };
        match self {
            ApiError::BadRequest(msg) => json(StatusCode::BAD_REQUEST, msg),
            ApiError::BadRequestText(msg) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                msg,
            )
                .into_response(),
            ApiError::Rejected { message, error } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message,
                    error: Some(error),
                }),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => json(StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => json(StatusCode::NOT_FOUND, msg),
            ApiError::Internal { message, source } => {
                tracing::error!(error = ?source, "{message}");
                json(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            ApiError::InternalText { message, source } => {
                tracing::error!(error = ?source, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    message,
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal("internal server error", err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full route table around shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/discussions",
            get(discussions::list_discussions).post(discussions::create_discussion),
        )
        .route("/api/discussions/:id", get(discussions::get_discussion))
        .route(
            "/api/discussions/verify/:id",
            post(discussions::verify_discussion),
        )
        .route("/api/register", post(accounts::register))
        .route("/api/login", post(accounts::login))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve_http(
    config: ForumConfig,
    database: Database,
    answers: Arc<dyn AnswerSource>,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;

    let state = AppState {
        config,
        database,
        answers,
    };

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
