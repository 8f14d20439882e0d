//! HTTP routes (spec §6) and the per-request state machine (spec §4.5
//! "State machine").
//!
//! Grounded on the teacher's `omni-daemon::ipc::dispatch` shape (acquire →
//! parse params → dispatch to engine → map errors to a structured response),
//! adapted from JSON-RPC-over-socket to HTTP-over-axum.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use beingdb_core::{BeingDbError, Engine};

use crate::admission::AdmissionGate;
use crate::config::ServerConfig;
use crate::protocol::{self, PredicateSummary, QueryRequest, VersionResponse};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub admission: Arc<AdmissionGate>,
    pub max_results: usize,
}

impl AppState {
    pub fn new(engine: Engine, config: &ServerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            admission: Arc::new(AdmissionGate::new(config.max_concurrent)),
            max_results: config.max_results,
        }
    }
}

/// Build the router (spec §6 HTTP surface table).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/version", get(version))
        .route("/predicates", get(list_predicates))
        .route("/query/:predicate", get(query_predicate_all))
        .route("/query", post(post_query))
        .with_state(state)
}

/// Wraps [`BeingDbError`] with the HTTP status spec §7 assigns it.
struct ApiError(BeingDbError);

impl From<BeingDbError> for ApiError {
    fn from(err: BeingDbError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BeingDbError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(error = %self.0, status = status.as_u16(), "request failed");
        (status, Json(protocol::error_body(&self.0))).into_response()
    }
}

async fn root() -> &'static str {
    "OK"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse::default())
}

async fn list_predicates(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let _permit = state.admission.try_acquire()?;
    let predicates = state.engine.list_predicates_with_arity().await?;
    let predicates: Vec<PredicateSummary> =
        predicates.into_iter().map(|(name, arity)| PredicateSummary { name, arity }).collect();
    Ok(Json(json!({ "predicates": predicates })))
}

async fn query_predicate_all(
    State(state): State<AppState>,
    Path(predicate): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let _permit = state.admission.try_acquire()?;
    if !beingdb_core::safety::is_valid_predicate_name(&predicate) {
        return Err(BeingDbError::InvalidPredicateName(predicate).into());
    }
    let facts = state.engine.query_all(&predicate).await?;
    let facts: Vec<Vec<String>> =
        facts.into_iter().map(|args| args.iter().map(|a| a.text().to_string()).collect()).collect();
    Ok(Json(json!({ "predicate": predicate, "facts": facts })))
}

async fn post_query(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // 1. Admission.
    let _permit = state.admission.try_acquire()?;
    tracing::debug!(query = %body.query, "request received");

    // 2. Parse (the query parser also performs step 4, optimization).
    let query = beingdb_core::parse_query(&body.query).ok_or(BeingDbError::ParseError)?;

    // 3. Validate.
    beingdb_core::validate_query(&query, body.offset, body.limit)?;
    tracing::debug!("query validated");

    // 5. Execute under the deadline/cap guards, choosing the streaming path
    // only when the request asked for pagination on a multi-pattern query
    // (spec §4.5 "Request ceiling").
    let effective_limit = body.limit.map(|l| l.min(state.max_results as i64)).unwrap_or(state.max_results as i64);
    let wants_pagination = body.offset.is_some() || body.limit.is_some();

    let result = if query.patterns.len() > 1 && wants_pagination {
        state.engine.execute_streaming(&query, body.offset, Some(effective_limit)).await?
    } else {
        let mut full = state.engine.execute(&query).await?;
        if wants_pagination {
            let offset = body.offset.unwrap_or(0) as usize;
            let limit = effective_limit as usize;
            let total = full.total;
            full.bindings = full.bindings.into_iter().skip(offset).take(limit).collect();
            full.total = total;
        }
        full
    };
    tracing::debug!(count = result.bindings.len(), "query completed");

    // 6. Render.
    Ok(Json(protocol::result_to_json(&result, body.offset, body.limit)))
}
