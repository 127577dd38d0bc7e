//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for ingestion, RAG queries and library management.
//! Every route except `/health` acts on behalf of the owner named in the
//! owner header, which the authenticating proxy in front of the server sets.

use crate::cli::Output;
use crate::analysis::VideoAnalysis;
use crate::comments::{CommentAnswer, CommentInsights, CommentRecord};
use crate::config::Settings;
use crate::content::ContentType;
use crate::error::VidsageError;
use crate::ingest::{IngestReport, IngestRequest};
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use crate::vector_store::IndexedSource;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    owner_header: String,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let owner_header = settings.server.owner_header.to_lowercase();

    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState {
        orchestrator,
        owner_header,
    });

    let app = router(state.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidsage API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Owner header", &state.owner_header);
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Ingest text", "POST   /ingest");
    Output::kv("Ingest comments", "POST   /comments");
    Output::kv("Ask (RAG)", "POST   /ask");
    Output::kv("Ask comments", "POST   /comments/ask");
    Output::kv("List sources", "GET    /sources");
    Output::kv("Delete source", "DELETE /sources/{content_type}/{source_id}");
    Output::kv("Comment insights", "GET    /comments/{video_id}/insights");
    Output::kv("Video analysis", "POST   /videos/{video_id}/analysis");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/comments", post(ingest_comments))
        .route("/ask", post(ask))
        .route("/comments/ask", post(ask_comments))
        .route("/sources", get(list_sources))
        .route("/sources/{content_type}/{source_id}", delete(delete_source))
        .route("/comments/{video_id}/insights", get(comment_insights))
        .route("/videos/{video_id}/analysis", post(analyze_video))
        .layer(cors)
        .with_state(state)
}

// === Owner extraction and errors ===

/// The authenticated owner, read from the owner header.
#[derive(Debug)]
struct OwnerId(String);

impl FromRequestParts<Arc<AppState>> for OwnerId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(state.owner_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .map(|owner| OwnerId(owner.to_string()))
            .ok_or_else(ApiError::unauthorized)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error response. Backend details are logged, never returned.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized".to_string(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn from_error(e: VidsageError, generic: &str) -> Self {
        match e {
            VidsageError::InvalidInput(message) => Self::bad_request(message),
            VidsageError::NotFound(message) => Self {
                status: StatusCode::NOT_FOUND,
                message,
            },
            other => {
                error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: generic.to_string(),
                }
            }
        }
    }

    fn question(e: VidsageError) -> Self {
        Self::from_error(e, "Could not process your question")
    }

    fn request(e: VidsageError) -> Self {
        Self::from_error(e, "Could not process your request")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestBody {
    text: String,
    content_type: ContentType,
    #[serde(alias = "videoId", alias = "documentId")]
    source_id: String,
    #[serde(default)]
    source_title: Option<String>,
    #[serde(default)]
    extra: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    replace_existing: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsBody {
    video_id: String,
    #[serde(default)]
    video_title: Option<String>,
    comments: Vec<CommentRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskBody {
    question: String,
    #[serde(default = "default_content_type")]
    content_type: ContentType,
    #[serde(default, alias = "videoId", alias = "documentId")]
    source_id: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

fn default_content_type() -> ContentType {
    ContentType::Transcript
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsAskBody {
    question: String,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Deserialize)]
struct AnalysisParams {
    #[serde(default)]
    duration: Option<u64>,
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<IndexedSource>,
    total: usize,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: usize,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestReport>, ApiError> {
    if body.content_type == ContentType::Comment {
        return Err(ApiError::bad_request("Use /comments to ingest comments"));
    }

    let title = body.source_title.unwrap_or_else(|| body.source_id.clone());
    let request = IngestRequest::new(owner, body.content_type, body.source_id, title, body.text)
        .with_extra(body.extra)
        .replacing(body.replace_existing);

    state
        .orchestrator
        .ingest(request)
        .await
        .map(Json)
        .map_err(ApiError::request)
}

async fn ingest_comments(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(body): Json<CommentsBody>,
) -> Result<Json<IngestReport>, ApiError> {
    let title = body.video_title.unwrap_or_else(|| body.video_id.clone());

    state
        .orchestrator
        .ingest_comments(&owner, &body.video_id, &title, &body.comments)
        .await
        .map(Json)
        .map_err(ApiError::request)
}

async fn ask(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(body): Json<AskBody>,
) -> Result<Json<Answer>, ApiError> {
    state
        .orchestrator
        .ask(
            body.content_type,
            &owner,
            &body.question,
            body.source_id.as_deref(),
            body.max_results,
        )
        .await
        .map(Json)
        .map_err(ApiError::question)
}

async fn ask_comments(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(body): Json<CommentsAskBody>,
) -> Result<Json<CommentAnswer>, ApiError> {
    state
        .orchestrator
        .ask_comments(&owner, &body.question, body.video_id.as_deref(), body.max_results)
        .await
        .map(Json)
        .map_err(ApiError::question)
}

async fn list_sources(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
) -> Result<Json<SourcesResponse>, ApiError> {
    let sources = state
        .orchestrator
        .list_sources(&owner)
        .await
        .map_err(ApiError::request)?;

    Ok(Json(SourcesResponse {
        total: sources.len(),
        sources,
    }))
}

async fn delete_source(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path((content_type, source_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let content_type: ContentType = content_type.parse().map_err(ApiError::bad_request)?;

    let deleted = state
        .orchestrator
        .delete_source(&owner, &source_id, Some(content_type))
        .await
        .map_err(ApiError::request)?;

    Ok(Json(DeleteResponse { deleted }))
}

async fn comment_insights(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(video_id): Path<String>,
) -> Result<Json<CommentInsights>, ApiError> {
    state
        .orchestrator
        .comment_insights(&owner, &video_id)
        .await
        .map(Json)
        .map_err(ApiError::request)
}

async fn analyze_video(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(video_id): Path<String>,
    Query(params): Query<AnalysisParams>,
) -> Result<Json<VideoAnalysis>, ApiError> {
    state
        .orchestrator
        .analyze_video(&owner, &video_id, params.duration)
        .await
        .map(Json)
        .map_err(ApiError::request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorStoreProvider;
    use crate::orchestrator::RagServices;
    use crate::testing::{FailingStore, HashingEmbedder, RecordingChat};
    use crate::vector_store::MemoryVectorStore;
    use axum::http::Request;

    fn state_with(services: RagServices) -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Memory;

        Arc::new(AppState {
            orchestrator: Orchestrator::with_services(settings, services).unwrap(),
            owner_header: "x-owner-id".to_string(),
        })
    }

    fn state() -> Arc<AppState> {
        state_with(RagServices {
            embedder: Arc::new(HashingEmbedder::new(64)),
            store: Arc::new(MemoryVectorStore::new()),
            chat: Arc::new(RecordingChat::new("answer")),
        })
    }

    async fn extract_owner(state: &Arc<AppState>, header: Option<&str>) -> Result<OwnerId, ApiError> {
        let mut builder = Request::builder().uri("/ask");
        if let Some(value) = header {
            builder = builder.header("X-Owner-Id", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        OwnerId::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_owner_header_is_required() {
        let state = state();

        let OwnerId(owner) = extract_owner(&state, Some(" u1 ")).await.unwrap();
        assert_eq!(owner, "u1");

        let err = extract_owner(&state, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = extract_owner(&state, Some("  ")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ask_maps_invalid_input_to_bad_request() {
        let body = AskBody {
            question: "   ".to_string(),
            content_type: ContentType::Transcript,
            source_id: None,
            max_results: None,
        };

        let err = ask(State(state()), OwnerId("u1".to_string()), Json(body))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backend_errors_are_generic() {
        let state = state_with(RagServices {
            embedder: Arc::new(HashingEmbedder::new(64)),
            store: Arc::new(FailingStore::new().failing_search()),
            chat: Arc::new(RecordingChat::new("answer")),
        });
        let body: AskBody = serde_json::from_str(r#"{"question": "What is covered?"}"#).unwrap();

        let err = ask(State(state), OwnerId("u1".to_string()), Json(body))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Could not process your question");
    }

    #[tokio::test]
    async fn test_ingest_then_ask() {
        let state = state();
        let body: IngestBody = serde_json::from_str(
            r#"{"text": "Discussing unit testing and CI pipelines.", "contentType": "transcript", "videoId": "v1", "sourceTitle": "CI talk"}"#,
        )
        .unwrap();

        let Json(report) = ingest(State(state.clone()), OwnerId("u1".to_string()), Json(body))
            .await
            .unwrap();
        assert_eq!(report.chunks_written, 1);

        let body: AskBody =
            serde_json::from_str(r#"{"question": "What is discussed?", "videoId": "v1", "maxResults": 50}"#)
                .unwrap();
        let Json(answer) = ask(State(state), OwnerId("u1".to_string()), Json(body))
            .await
            .unwrap();
        assert!(answer.has_answer);
        assert_eq!(answer.sources[0].source_title, "CI talk");
    }

    #[tokio::test]
    async fn test_analysis_of_unknown_video_is_not_found() {
        let state = state();
        let body: IngestBody = serde_json::from_str(
            r#"{"text": "Discussing unit testing and CI pipelines.", "contentType": "transcript", "videoId": "v1"}"#,
        )
        .unwrap();
        ingest(State(state.clone()), OwnerId("u1".to_string()), Json(body))
            .await
            .unwrap();

        let params = || Query(AnalysisParams { duration: None });
        let err = analyze_video(
            State(state.clone()),
            OwnerId("u2".to_string()),
            Path("v1".to_string()),
            params(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let Json(analysis) = analyze_video(
            State(state),
            OwnerId("u1".to_string()),
            Path("v1".to_string()),
            params(),
        )
        .await
        .unwrap();
        assert_eq!(analysis.description, "answer");
        assert!(analysis.qa_pairs.is_empty());
    }
}
