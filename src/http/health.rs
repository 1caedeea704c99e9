//! Liveness endpoint: verifies the record store is reachable.

use super::AppState;
use axum::extract::State;
use axum::Json;
use std::time::Duration;

use crate::error::Result;

const STORE_PROBE_ATTEMPTS: u32 = 3;
const STORE_PROBE_BACKOFF: Duration = Duration::from_secs(2);

pub async fn healthz(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state
        .catalog
        .ping_with_retry(STORE_PROBE_ATTEMPTS, STORE_PROBE_BACKOFF)
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
