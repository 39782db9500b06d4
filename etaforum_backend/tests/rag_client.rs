use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use etaforum_backend::config::RagConfig;
use etaforum_backend::rag::{AnswerSource, RagClient, RagError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_upstream(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });
    (format!("http://127.0.0.1:{port}/query"), handle)
}

#[tokio::test]
async fn posts_query_and_parses_answer() {
    let router = Router::new().route(
        "/query",
        post(|Json(body): Json<Value>| async move {
            let query = body["query"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "answer": format!("echo: {query}"),
                "sources": [
                    { "document": "notes.pdf", "page": "3" },
                    { "document": "ytvid_week2", "page": "10:02" }
                ]
            }))
        }),
    );
    let (endpoint, upstream) = spawn_upstream(router).await;

    let client = RagClient::new(&RagConfig::new(endpoint)).expect("client");
    let answer = client.get_answer("what is ownership").await.expect("answer");
    assert_eq!(answer.answer, "echo: what is ownership");
    assert_eq!(answer.sources.len(), 2);

    let patch = answer.to_patch();
    assert_eq!(patch.yt_embed_link, "ytvid_week2");
    assert_eq!(patch.book_src, "notes.pdf");

    upstream.abort();
}

#[tokio::test]
async fn non_success_status_is_an_upstream_error() {
    let router = Router::new().route(
        "/query",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "index rebuilding") }),
    );
    let (endpoint, upstream) = spawn_upstream(router).await;

    let client = RagClient::new(&RagConfig::new(endpoint)).expect("client");
    match client.get_answer("anything").await {
        Err(RagError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "index rebuilding");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    upstream.abort();
}

#[tokio::test]
async fn malformed_body_is_an_upstream_error() {
    let router = Router::new().route(
        "/query",
        post(|| async { Json(json!({ "answer": "missing sources" })) }),
    );
    let (endpoint, upstream) = spawn_upstream(router).await;

    let client = RagClient::new(&RagConfig::new(endpoint)).expect("client");
    let result = client.get_answer("anything").await;
    assert!(matches!(result, Err(RagError::Malformed(_))));

    upstream.abort();
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let client = RagClient::new(&RagConfig::new(format!("http://127.0.0.1:{port}/query")))
        .expect("client");
    let result = client.get_answer("anything").await;
    assert!(matches!(result, Err(RagError::Transport(_))));
}
