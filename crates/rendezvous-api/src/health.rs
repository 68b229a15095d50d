use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::{AppState, blocking};

/// Liveness plus a round-trip to the store.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    blocking(&state, |db| db.ping()).await?;
    Ok(Json(json!({ "status": "ok" })))
}
