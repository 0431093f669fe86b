// ./api/src/main.rs
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::{ApplicationError, DocumentService, SearchRequest};
use domain::Document;
use infrastructure::InMemoryDocumentRepository;

#[derive(Clone)]
struct AppState {
    document_service: Arc<DocumentService>,
}

const DEFAULT_PORT: u16 = 3000;

/// Reads `PORT`, falling back to [`DEFAULT_PORT`] when unset or unparsable.
fn configured_port() -> u16 {
    match env::var("PORT") {
        Ok(port_str) => match u16::from_str(&port_str) {
            Ok(port_num) => {
                info!("Using port {} from environment variable PORT.", port_num);
                port_num
            }
            Err(_) => {
                warn!(
                    "Invalid PORT value '{}' in environment variable. Using default port {}.",
                    port_str, DEFAULT_PORT
                );
                DEFAULT_PORT
            }
        },
        Err(_) => {
            info!(
                "PORT environment variable not set. Using default port {}.",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats_handler))
        .route("/documents", post(save_document_handler))
        .route("/documents/batch", post(save_batch_handler))
        .route("/documents/search", post(search_documents_handler))
        .route("/documents/:id", get(get_document_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // --- Logger Initialization ---
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let port = configured_port();

    // --- Dependency Injection ---
    let document_repository = Arc::new(InMemoryDocumentRepository::new());
    let document_service = Arc::new(DocumentService::new(document_repository));
    let app = router(AppState { document_service });
    info!("API routes configured.");

    // --- Server Startup ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn get_stats_handler(State(state): State<AppState>) -> Response {
    match state.document_service.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// Upsert (POST /documents). Returns the document as stored.
async fn save_document_handler(
    State(state): State<AppState>,
    Json(document): Json<Document>,
) -> Response {
    info!(doc_id = ?document.id, "Received request to save document");
    match state.document_service.save_document(document).await {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(e) => {
            error!("Failed to save document via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

async fn save_batch_handler(
    State(state): State<AppState>,
    Json(documents): Json<Vec<Document>>,
) -> Response {
    info!(batch_size = documents.len(), "Received request to save batch");
    match state.document_service.save_batch(documents).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => {
            error!("Batch save failed via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

async fn get_document_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.document_service.get_document(&id).await {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

async fn search_documents_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    info!(?request, "Received search request");
    match state.document_service.search_documents(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to search documents via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

fn map_application_error_to_response(err: ApplicationError) -> Response {
    let status = match &err {
        ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
        ApplicationError::InvalidInput(_) | ApplicationError::DomainError(_) => {
            warn!("Rejected request: {}", err);
            StatusCode::BAD_REQUEST
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use domain::DomainError;
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        let repository = Arc::new(InMemoryDocumentRepository::new());
        router(AppState {
            document_service: Arc::new(DocumentService::new(repository)),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn errors_map_to_http_statuses() {
        let cases = [
            (ApplicationError::NotFound("7".into()), StatusCode::NOT_FOUND),
            (
                ApplicationError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::DomainError(DomainError::InvalidId(String::new())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(map_application_error_to_response(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn saved_document_is_served_by_id() {
        let app = test_app();
        let (status, saved) = send(
            &app,
            Method::POST,
            "/documents",
            Some(json!({ "title": "Alpha notes", "author": { "id": "a1", "name": "Ada" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["id"], "1");
        assert!(saved["created"].is_string());

        let (status, fetched) = send(&app, Method::GET, "/documents/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/documents/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn update_over_http_keeps_created() {
        let app = test_app();
        let created = "2024-01-01T00:00:00Z";
        send(
            &app,
            Method::POST,
            "/documents",
            Some(json!({ "id": "ext", "title": "Draft", "created": created })),
        )
        .await;
        let (status, updated) = send(
            &app,
            Method::POST,
            "/documents",
            Some(json!({ "id": "ext", "title": "Final", "created": "2030-01-01T00:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["created"], created);
    }

    #[tokio::test]
    async fn search_reports_matching_documents() {
        let app = test_app();
        let (status, batch) = send(
            &app,
            Method::POST,
            "/documents/batch",
            Some(json!([
                { "title": "Alpha notes", "created": "2024-01-01T00:00:00Z" },
                { "title": "Beta report", "created": "2024-01-01T00:00:10Z" },
                { "title": "Alpha report", "created": "2024-01-01T00:00:20Z" }
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(batch["total_processed"], 3);

        let (status, response) = send(
            &app,
            Method::POST,
            "/documents/search",
            Some(json!({
                "titlePrefixes": ["Alpha"],
                "createdFrom": "2024-01-01T00:00:05Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["nb_hits"], 1);
        assert_eq!(response["hits"][0]["title"], "Alpha report");

        let (_, stats) = send(&app, Method::GET, "/stats", None).await;
        assert_eq!(stats["total_documents"], 3);
    }
}
