use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::context::{self, ChatMessage, ContextStats};

#[derive(Deserialize)]
pub(super) struct StatsRequest {
    history: Vec<ChatMessage>,
    max_tokens: Option<usize>,
}

#[derive(Deserialize)]
pub(super) struct OptimizeRequest {
    history: Vec<ChatMessage>,
    max_tokens: Option<usize>,
    keep_last: Option<usize>,
}

#[derive(Serialize)]
pub(super) struct OptimizeResponse {
    history: Vec<ChatMessage>,
    before: ContextStats,
    after: ContextStats,
}

/// POST /api/context/stats
pub(super) async fn stats(State(state): State<AppState>, Json(req): Json<StatsRequest>) -> Json<ContextStats> {
    let max_tokens = req.max_tokens.unwrap_or(state.config.context.max_tokens);
    Json(context::stats(&req.history, max_tokens))
}

/// POST /api/context/optimize
pub(super) async fn optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> Json<OptimizeResponse> {
    let max_tokens = req.max_tokens.unwrap_or(state.config.context.max_tokens);
    let keep_last = req.keep_last.unwrap_or(state.config.context.keep_last);

    let before = context::stats(&req.history, max_tokens);
    let history = context::optimize_history(req.history, max_tokens, keep_last);
    let after = context::stats(&history, max_tokens);
    Json(OptimizeResponse { history, before, after })
}
