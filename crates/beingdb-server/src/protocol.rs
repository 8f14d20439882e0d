//! Wire types for the HTTP surface (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use beingdb_core::{BeingDbError, ExecutionResult};

/// Body of `POST /query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// `{"name", "version"}` body of `GET /version`.
#[derive(Debug, Clone, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for VersionResponse {
    fn default() -> Self {
        Self { name: "beingdb", version: env!("CARGO_PKG_VERSION") }
    }
}

/// One entry of `GET /predicates`' `predicates` array.
#[derive(Debug, Clone, Serialize)]
pub struct PredicateSummary {
    pub name: String,
    pub arity: usize,
}

/// Render an [`ExecutionResult`] into the result envelope (spec §4.5
/// "Result envelope"): `variables`, `results`, `count`, `total`, and
/// `offset`/`limit` echoed back only when the request supplied them.
pub fn result_to_json(result: &ExecutionResult, offset: Option<i64>, limit: Option<i64>) -> Value {
    let results: Vec<Value> = result
        .bindings
        .iter()
        .map(|binding| {
            let mut obj = Map::new();
            for var in &result.variables {
                if let Some(value) = binding.get(var) {
                    obj.insert(var.clone(), Value::String(value.clone()));
                }
            }
            Value::Object(obj)
        })
        .collect();

    let mut envelope = Map::new();
    envelope.insert("variables".into(), Value::Array(result.variables.iter().cloned().map(Value::String).collect()));
    envelope.insert("count".into(), Value::from(results.len()));
    envelope.insert("results".into(), Value::Array(results));
    if let Some(total) = result.total {
        envelope.insert("total".into(), Value::from(total));
    }
    if let Some(offset) = offset {
        envelope.insert("offset".into(), Value::from(offset));
    }
    if let Some(limit) = limit {
        envelope.insert("limit".into(), Value::from(limit));
    }

    Value::Object(envelope)
}

/// `{"error": message}` body used for every non-2xx response.
pub fn error_body(err: &BeingDbError) -> Value {
    serde_json::json!({ "error": err.to_string() })
}
