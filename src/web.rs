use crate::{
    ResourceType, SearchConfig, expand_query, extract_keywords, find_matches, rank,
    rank_suggestions, sanitize_text, search, similarity,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;
const MAX_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub default_search: SearchConfig,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub search: SearchConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        default_search: config.search.normalized(),
    });
    let router = build_router(state);
    info!(
        %config.addr,
        threshold = config.search.threshold,
        limit = config.search.limit,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/similarity", get(api_similarity))
        .route("/api/keywords", get(api_keywords))
        .route("/api/suggest", get(api_suggest))
        .route("/api/match", post(api_match))
        .route("/api/search", post(api_search))
        .route("/api/moderate", post(api_moderate))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "study-search" }))
}

#[derive(Debug, Deserialize)]
struct SimilarityParams {
    a: Option<String>,
    b: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SimilarityPayload {
    a: String,
    b: String,
    similarity: f64,
}

async fn api_similarity(Query(params): Query<SimilarityParams>) -> Json<SimilarityPayload> {
    let a = params.a.unwrap_or_default();
    let b = params.b.unwrap_or_default();
    let similarity = similarity(&a, &b);
    Json(SimilarityPayload { a, b, similarity })
}

#[derive(Debug, Deserialize)]
struct KeywordParams {
    q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeywordPayload {
    query: String,
    expanded: String,
    keywords: Vec<String>,
}

async fn api_keywords(Query(params): Query<KeywordParams>) -> Json<KeywordPayload> {
    let query = params.q.unwrap_or_default();
    Json(KeywordPayload {
        expanded: expand_query(&query),
        keywords: extract_keywords(&query),
        query,
    })
}

#[derive(Debug, Deserialize)]
struct SuggestParams {
    input: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SuggestionPayload {
    suggestion: String,
    score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SuggestResponsePayload {
    input: String,
    resource_type: Option<ResourceType>,
    suggestions: Vec<SuggestionPayload>,
}

async fn api_suggest(Query(params): Query<SuggestParams>) -> Json<SuggestResponsePayload> {
    let input = params.input.unwrap_or_default();
    // Unrecognised types still get pattern suggestions.
    let resource_type = params
        .resource_type
        .as_deref()
        .and_then(|value| value.parse::<ResourceType>().ok());
    let suggestions = rank_suggestions(&input, resource_type)
        .into_iter()
        .map(|(suggestion, score)| SuggestionPayload { suggestion, score })
        .collect();
    Json(SuggestResponsePayload {
        input,
        resource_type,
        suggestions,
    })
}

#[derive(Debug, Deserialize)]
struct MatchRequest {
    query: String,
    items: Vec<String>,
    threshold: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatchResponsePayload {
    query: String,
    threshold: f64,
    matches: Vec<String>,
}

async fn api_match(
    State(state): State<SharedState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponsePayload>, ApiError> {
    let threshold = match request.threshold {
        Some(value) if !(0.0..=1.0).contains(&value) => {
            return Err(ApiError::bad_request("`threshold` must be between 0 and 1"));
        }
        Some(value) => value,
        None => state.default_search.threshold,
    };
    let matches = find_matches(&request.query, &request.items, threshold)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(Json(MatchResponsePayload {
        query: request.query,
        threshold,
        matches,
    }))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    records: Vec<Value>,
    limit: Option<usize>,
    /// Rank every record instead of filtering to plausible hits first.
    #[serde(default)]
    rank_only: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchHitPayload {
    index: usize,
    score: f64,
    record: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchResponsePayload {
    query: String,
    total: usize,
    results: Vec<SearchHitPayload>,
}

async fn api_search(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponsePayload> {
    let limit = request
        .limit
        .unwrap_or(state.default_search.limit)
        .clamp(1, MAX_LIMIT);
    let hits = if request.rank_only {
        rank(&request.query, &request.records)
    } else {
        search(&request.query, &request.records)
    };
    let total = hits.len();
    let results = hits
        .into_iter()
        .take(limit)
        .map(|hit| SearchHitPayload {
            index: hit.index,
            score: hit.score,
            record: hit.record.clone(),
        })
        .collect();
    Json(SearchResponsePayload {
        query: request.query,
        total,
        results,
    })
}

#[derive(Debug, Deserialize)]
struct ModerateRequest {
    text: String,
}

async fn api_moderate(Json(request): Json<ModerateRequest>) -> Result<Json<Value>, ApiError> {
    let sanitized =
        sanitize_text(&request.text).map_err(|err| ApiError::unprocessable(err.to_string()))?;
    Ok(Json(json!({ "ok": true, "sanitized": sanitized })))
}
