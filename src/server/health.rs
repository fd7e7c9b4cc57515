use axum::{Json, extract::State};
use serde_json::{Map, Value, json};
use tracing::warn;

use super::AppState;

/// GET /health: liveness plus which integrations have credentials.
pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.db.run(|db| db.ping()).await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("health: database ping failed: {e}");
            "error"
        }
    };

    let integrations: Map<String, Value> = state
        .config
        .secrets
        .configured()
        .into_iter()
        .map(|(name, present)| (name.to_string(), Value::Bool(present)))
        .collect();

    Json(json!({
        "status": if database == "ok" { "healthy" } else { "degraded" },
        "service": state.config.server.name,
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "integrations": integrations,
    }))
}
