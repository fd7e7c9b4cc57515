use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::AppState;
use crate::error::AppError;
use crate::models::ToonConfig;
use crate::toon::{self, MessageType, Savings};

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct CreateConfig {
    #[serde(default)]
    agent_name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    config: Option<Value>,
    config_id: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Deserialize)]
pub(super) struct Toggle {
    enabled: bool,
}

#[derive(Deserialize)]
pub(super) struct EncodeRequest {
    data: Value,
    message_type: Option<String>,
    agent_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(super) enum Format {
    Toon,
    Json,
}

#[derive(Serialize)]
pub(super) struct EncodeResponse {
    format: Format,
    encoded: String,
    message_type: MessageType,
    savings: Savings,
}

#[derive(Deserialize)]
pub(super) struct DecodeRequest {
    encoded: String,
    message_type: Option<String>,
}

#[derive(Serialize)]
pub(super) struct DecodeResponse {
    data: Value,
    message_type: MessageType,
}

fn message_type(raw: Option<&str>) -> Result<MessageType, AppError> {
    Ok(raw.map(str::parse).transpose()?.unwrap_or_default())
}

// ── Config handlers ───────────────────────────────────────────────────────────

/// POST /api/toon/config
pub(super) async fn create_config(
    State(state): State<AppState>,
    Json(req): Json<CreateConfig>,
) -> Result<(StatusCode, Json<ToonConfig>), AppError> {
    let config = req.config.unwrap_or_else(|| Value::Object(Default::default()));
    let created = state
        .db
        .run(move |db| db.create_toon_config(&req.agent_name, req.enabled, config, req.config_id))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/toon/config/{agent_name}
pub(super) async fn get_config(
    State(state): State<AppState>,
    Path(agent_name): Path<String>,
) -> Result<Json<ToonConfig>, AppError> {
    Ok(Json(state.db.run(move |db| db.toon_config(&agent_name)).await?))
}

/// PATCH /api/toon/config/{agent_name}/toggle
pub(super) async fn toggle_config(
    State(state): State<AppState>,
    Path(agent_name): Path<String>,
    Json(req): Json<Toggle>,
) -> Result<Json<ToonConfig>, AppError> {
    Ok(Json(
        state
            .db
            .run(move |db| db.set_toon_enabled(&agent_name, req.enabled))
            .await?,
    ))
}

// ── Codec handlers ────────────────────────────────────────────────────────────

/// POST /api/toon/encode
///
/// With `agent_name`, the agent's Toon config decides the output format: a
/// disabled config yields compact JSON. Agents without a config get Toon.
pub(super) async fn encode(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, AppError> {
    let message_type = message_type(req.message_type.as_deref())?;
    let data = message_type.canonicalize(req.data)?;

    let enabled = match req.agent_name {
        Some(name) => state.db.run(move |db| toon_enabled_for(db, &name)).await?,
        None => true,
    };

    let json_text = data.to_string();
    let (format, encoded) = if enabled {
        (Format::Toon, toon::encode(&data))
    } else {
        (Format::Json, json_text.clone())
    };
    let savings = toon::savings(&json_text, &encoded);
    debug!(%message_type, ?format, saved = savings.savings_chars, "payload encoded");

    Ok(Json(EncodeResponse { format, encoded, message_type, savings }))
}

fn toon_enabled_for(db: &crate::db::Database, agent_name: &str) -> Result<bool, AppError> {
    match db.toon_config(agent_name) {
        Ok(cfg) => Ok(cfg.enabled),
        // Distinguish "no config" from "no such agent".
        Err(AppError::NotFound(_)) => db.agent_by_name(agent_name.trim()).map(|_| true),
        Err(e) => Err(e),
    }
}

/// POST /api/toon/decode
pub(super) async fn decode(Json(req): Json<DecodeRequest>) -> Result<Json<DecodeResponse>, AppError> {
    let message_type = message_type(req.message_type.as_deref())?;
    let data = message_type.canonicalize(toon::decode(&req.encoded)?)?;
    Ok(Json(DecodeResponse { data, message_type }))
}
