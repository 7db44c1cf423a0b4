//! Route handler functions for all API endpoints.
//!
//! Request bodies are read as raw bytes and parsed here so that clients
//! sending JSON without a `content-type` header are still served, and so
//! that malformed bodies get the same JSON error shape as everything else.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tina_core::types::{
    ChatReply, ChatRequest, DispatchMode, PingResponse, SessionSummary, TranscriptResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
    pub knowledge_entries: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /ping - liveness probe with the assistant's name.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        name: "Tina".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health - uptime and state counters.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.sessions.len()?,
        knowledge_entries: state.knowledge.len()?,
    }))
}

/// POST /chat - run one utterance through the dialogue engine.
///
/// The search path holds the session's lock for the whole turn. The
/// generation path is stateless and never touches the registry.
pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatReply>, ApiError> {
    let request: ChatRequest = parse_body(&body)?;
    let mode = request.mode.unwrap_or(state.config.chat.dispatch);

    debug!(
        mode = ?mode,
        allow_web = request.allow_web,
        session = request.session_id.as_deref().unwrap_or(tina_chat::DEFAULT_SESSION),
        "Chat request"
    );

    let reply = match mode {
        DispatchMode::Search => {
            let memory = state.sessions.session(request.session_id.as_deref())?;
            let mut memory = memory.lock().await;
            let turn = state
                .orchestrator
                .respond(&mut memory, &request.message, request.allow_web)
                .await;
            info!(
                intent = turn.intent.map(|i| i.as_str()).unwrap_or("none"),
                substituted = turn.input != turn.resolved,
                "Turn completed"
            );
            turn.reply
        }
        DispatchMode::Generation => {
            state
                .orchestrator
                .get_reply(&request.message, request.allow_web)
                .await
        }
    };

    Ok(Json(ChatReply { reply }))
}

/// POST /sessions - open an isolated conversation.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let session_id = Uuid::new_v4().to_string();
    state.sessions.create(&session_id)?;
    info!(session = %session_id, "Session created");
    Ok((StatusCode::CREATED, Json(SessionCreated { session_id })))
}

/// GET /sessions - summaries of all known conversations.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state.sessions.summaries().await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// GET /sessions/{id}/transcript - full transcript of one conversation.
pub async fn session_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    Ok(Json(state.sessions.transcript(&id).await?))
}

/// DELETE /sessions/{id} - forget one conversation.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(&id)?;
    info!(session = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /knowledge - the whole knowledge document.
pub async fn get_knowledge(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(Value::Object(state.knowledge.snapshot()?)))
}

/// PUT /knowledge - replace the document wholesale and persist it.
pub async fn put_knowledge(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let entries: Map<String, Value> = match parse_body::<Value>(&body)? {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Knowledge document must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    state.knowledge.replace(entries)?;
    if let Err(e) = state.knowledge.save() {
        warn!(error = %e, path = %state.knowledge.path().display(), "Failed to persist knowledge");
        return Err(e.into());
    }

    let document = state.knowledge.snapshot()?;
    info!(entries = document.len(), "Knowledge document replaced");
    Ok(Json(Value::Object(document)))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
