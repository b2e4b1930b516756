use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::state::AppState;

const SINGLE_TIMEOUT: Duration = Duration::from_secs(30);
const BATCH_TIMEOUT: Duration = Duration::from_secs(60);
const PLUGIN_TIMEOUT: Duration = Duration::from_secs(120);

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route("/translate", post(handle_translate))
        .route("/translate/batch", post(handle_translate_batch))
        .route("/language/translate/v2", post(handle_google_translate))
        .with_state(state)
}

fn bearer_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Absence of a configured token disables the check entirely (spec §6).
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.auth_token.as_deref() else {
        return Ok(());
    };
    match bearer_token_from_headers(headers) {
        Some(observed) if observed == expected => Ok(()),
        _ => Err(ApiError::unauthorized()),
    }
}

async fn handle_health() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    from: String,
    to: String,
    text: String,
    #[serde(default)]
    html: bool,
}

#[derive(Debug, Serialize)]
struct TranslateResponse {
    result: String,
}

async fn handle_translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TranslateRequest>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err.into_response();
    }
    if req.text.is_empty() {
        return ApiError::bad_request("text must not be empty").into_response();
    }

    let result = tokio::time::timeout(
        SINGLE_TIMEOUT,
        state
            .planner
            .translate(&req.from, &req.to, &req.text, req.html),
    )
    .await;

    match result {
        Ok(Ok(result)) => Json(TranslateResponse { result }).into_response(),
        Ok(Err(err)) => ApiError::from(err).into_response(),
        Err(_) => ApiError::timeout("translation timed out").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct TranslateBatchRequest {
    from: String,
    to: String,
    texts: Vec<String>,
    #[serde(default)]
    html: bool,
}

#[derive(Debug, Serialize)]
struct TranslateBatchResponse {
    results: Vec<String>,
}

async fn handle_translate_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TranslateBatchRequest>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err.into_response();
    }
    if req.texts.is_empty() {
        return ApiError::bad_request("texts must not be empty").into_response();
    }

    let work = async {
        let mut results = Vec::with_capacity(req.texts.len());
        for text in &req.texts {
            let translated = state
                .planner
                .translate(&req.from, &req.to, text, req.html)
                .await?;
            results.push(translated);
        }
        Ok::<_, mtran_planner::PlannerError>(results)
    };

    match tokio::time::timeout(BATCH_TIMEOUT, work).await {
        Ok(Ok(results)) => Json(TranslateBatchResponse { results }).into_response(),
        Ok(Err(err)) => ApiError::from(err).into_response(),
        Err(_) => ApiError::timeout("batch translation timed out").into_response(),
    }
}

/// Google Translate v2-compatible request/response shape: `q`/`source`/`target`
/// instead of `text`/`from`/`to`, and `format == "html"` instead of a `html` flag.
#[derive(Debug, Deserialize)]
struct GoogleTranslateRequest {
    q: String,
    source: String,
    target: String,
    #[serde(default)]
    format: String,
}

#[derive(Debug, Serialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct GoogleTranslateData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Serialize)]
struct GoogleTranslateResponse {
    data: GoogleTranslateData,
}

async fn handle_google_translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GoogleTranslateRequest>,
) -> Response {
    if let Err(err) = authorize(&state, &headers) {
        return err.into_response();
    }
    if req.q.is_empty() {
        return ApiError::bad_request("q must not be empty").into_response();
    }

    let html = req.format == "html";
    let result = tokio::time::timeout(
        PLUGIN_TIMEOUT,
        state.planner.translate(&req.source, &req.target, &req.q, html),
    )
    .await;

    match result {
        Ok(Ok(translated_text)) => Json(GoogleTranslateResponse {
            data: GoogleTranslateData {
                translations: vec![GoogleTranslation { translated_text }],
            },
        })
        .into_response(),
        Ok(Err(err)) => ApiError::from(err).into_response(),
        Err(_) => ApiError::timeout("translation timed out").into_response(),
    }
}
