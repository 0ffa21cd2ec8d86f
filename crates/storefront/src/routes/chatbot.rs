//! Ayurveda chatbot, dosha analyzer and tips.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::services::chat::{
    ChatService, HistoryTurn, Language, ReplySource, analyze_dosha, tips::tips,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub message: String,
    pub language: Option<String>,
    pub history: Vec<HistoryTurn>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoshaRequest {
    pub answers: BTreeMap<String, f64>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TipsQuery {
    pub language: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub message: String,
    pub language: Language,
    pub timestamp: String,
    pub source: ReplySource,
    pub slok: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn language(raw: Option<&str>) -> Language {
    Language::parse(raw.unwrap_or_default())
}

/// Answer a chat message, falling back to canned replies.
#[instrument(skip(state, body))]
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let language = language(body.language.as_deref());
    let reply = ChatService::new(state.chat())
        .reply(&body.message, language, &body.history)
        .await?;

    Ok(Json(ChatResponse {
        status: "success",
        message: reply.message,
        language: reply.language,
        timestamp: Utc::now().to_rfc3339(),
        source: reply.source,
        slok: reply.slok,
        model: reply.model,
    }))
}

/// Score questionnaire answers into a dosha profile.
#[instrument(skip(body))]
pub async fn dosha_analyzer(Json(body): Json<DoshaRequest>) -> Result<Json<Value>> {
    let analysis = analyze_dosha(&body.answers, language(body.language.as_deref()))?;
    Ok(Json(json!({ "status": "success", "result": analysis })))
}

/// Ayurvedic tips, optionally limited to one type.
pub async fn ayurveda_tips(Query(query): Query<TipsQuery>) -> Json<Value> {
    let tips = tips(language(query.language.as_deref()), query.kind.as_deref());
    Json(json!({ "status": "success", "count": tips.len(), "tips": tips }))
}
