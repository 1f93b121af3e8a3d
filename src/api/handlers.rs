//! API request handlers

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::chapters::{find_chapter_at_timestamp, parse_chapters_from_context};
use crate::context::{create_video_context_message, VideoContextInfo};
use crate::report::build_conversation_report;
use crate::scoring::{score_color, score_label};
use crate::session::SessionRegistry;
use crate::storage::Database;
use crate::tavus::{CreateConversationRequest, TavusClient};
use crate::webhook::handlers::handle_conversation_ended;

use super::models::{CreateConversationBody, VideoContextBody};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "domo-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Create a conversation via the Tavus API and record it locally
pub async fn create_conversation(
    db: &Database,
    tavus: Option<&Arc<TavusClient>>,
    body: CreateConversationBody,
) -> Result<Value> {
    let tavus = tavus.ok_or_else(|| anyhow!("Tavus API key not configured"))?;

    let created = tavus
        .create_conversation(CreateConversationRequest {
            replica_id: None,
            persona_id: None,
            conversation_name: body.conversation_name,
            conversational_context: body.agent_context,
            callback_url: body.callback_url,
        })
        .await?;

    db.upsert_conversation(
        &created.conversation_id,
        created.conversation_url.clone(),
        Utc::now(),
    )
    .await?;

    Ok(serde_json::to_value(created)?)
}

/// List known conversations for the dashboard
pub async fn list_conversations(db: &Database) -> Result<Value> {
    let conversations = db.list_conversations().await?;

    Ok(serde_json::json!({
        "conversations": conversations,
        "total": conversations.len()
    }))
}

/// Full report for one conversation, score included
pub async fn get_conversation_report(db: &Database, conversation_id: &str) -> Result<Value> {
    let report = build_conversation_report(db, conversation_id).await?;
    Ok(serde_json::to_value(report)?)
}

/// Score-only view of one conversation
pub async fn get_conversation_score(db: &Database, conversation_id: &str) -> Result<Value> {
    let report = build_conversation_report(db, conversation_id).await?;

    Ok(serde_json::json!({
        "conversation_id": conversation_id,
        "score": report.score.score,
        "max_score": report.score.max_score,
        "breakdown": report.score.breakdown,
        "color": score_color(report.score.score),
        "label": score_label(report.score.score)
    }))
}

/// Client-initiated end of conversation. Exactly-once with the vendor's
/// shutdown webhook via the leave-guard; ending at the vendor is best effort.
pub async fn leave_conversation(
    db: &Database,
    sessions: &SessionRegistry,
    tavus: Option<&Arc<TavusClient>>,
    conversation_id: &str,
) -> Result<Value> {
    handle_conversation_ended(db, sessions, conversation_id, "user_click").await;

    if let Some(tavus) = tavus {
        if let Err(e) = tavus.end_conversation(conversation_id).await {
            warn!("Failed to end conversation {} at vendor: {}", conversation_id, e);
        }
    }

    Ok(serde_json::json!({
        "conversation_id": conversation_id,
        "status": "ended"
    }))
}

/// Record that the participant clicked the CTA
pub async fn record_cta_clicked(db: &Database, conversation_id: &str) -> Result<Value> {
    let clicked_at = Utc::now();
    db.record_cta_clicked(conversation_id, clicked_at).await?;

    Ok(serde_json::json!({
        "conversation_id": conversation_id,
        "cta_clicked_at": clicked_at.to_rfc3339()
    }))
}

/// Build the `video_context_update` payload for the current player state
pub async fn build_video_context(body: VideoContextBody) -> Result<Value> {
    let chapters = body
        .agent_context
        .as_deref()
        .map(parse_chapters_from_context)
        .unwrap_or_default();

    let current_chapter = find_chapter_at_timestamp(&chapters, body.timestamp).cloned();

    let message = create_video_context_message(&VideoContextInfo {
        video_title: body.video_title,
        timestamp: body.timestamp,
        is_paused: body.is_paused,
        current_chapter,
    });

    Ok(serde_json::to_value(message)?)
}
