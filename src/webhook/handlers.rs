/// Per-concern capture handlers
///
/// Each handler normalizes the fields it knows about and upserts one row.
/// Storage failures are logged with context and swallowed: the webhook
/// endpoint must stay available so the vendor does not retry-storm over a
/// local hiccup. A dropped insert is invisible data loss, accepted because
/// these rows feed analytics and scoring, not billing.
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{normalize_pain_points, WebhookEvent};
use crate::session::SessionRegistry;
use crate::storage::{Database, NewProductInterest, NewQualification};

/// Capture contact/qualification fields.
pub async fn handle_qualification(db: &Database, event: &WebhookEvent) {
    let record = NewQualification {
        conversation_id: event.conversation_id.clone(),
        first_name: event.string_var("first_name"),
        last_name: event.string_var("last_name"),
        email: event.string_var("email"),
        position: event.string_var("position"),
        objective_name: event.objective_name.clone(),
        event_type: event.event_type(),
        raw_payload: event.raw_payload(),
        received_at: Utc::now(),
    };

    if let Err(e) = db.upsert_qualification(record).await {
        error!(
            "Failed to store qualification data for {}: {e:#}",
            event.conversation_id
        );
    } else {
        info!("📇 Captured qualification data for {}", event.conversation_id);
    }
}

/// Capture product-interest fields, normalizing `pain_points`.
pub async fn handle_product_interest(db: &Database, event: &WebhookEvent) {
    let record = NewProductInterest {
        conversation_id: event.conversation_id.clone(),
        primary_interest: event.string_var("primary_interest"),
        pain_points: normalize_pain_points(event.output_variables.get("pain_points")),
        objective_name: event.objective_name.clone(),
        event_type: event.event_type(),
        raw_payload: event.raw_payload(),
        received_at: Utc::now(),
    };

    if let Err(e) = db.upsert_product_interest(record).await {
        error!(
            "Failed to store product interest for {}: {e:#}",
            event.conversation_id
        );
    } else {
        info!("🎯 Captured product interest for {}", event.conversation_id);
    }
}

/// Append the fetched video title to the conversation's showcase row.
pub async fn handle_video_showcase(db: &Database, event: &WebhookEvent) {
    let Some(video_title) = event
        .string_var("video_title")
        .or_else(|| event.string_var("fetched_video"))
    else {
        debug!(
            "Video showcase event for {} carried no video title, ignoring",
            event.conversation_id
        );
        return;
    };

    let result = db
        .append_showcase_video(
            &event.conversation_id,
            event.objective_name.clone(),
            &video_title,
            event.event_type(),
            Utc::now(),
        )
        .await;

    if let Err(e) = result {
        error!(
            "Failed to store video showcase for {}: {e:#}",
            event.conversation_id
        );
    } else {
        info!(
            "🎬 Recorded video \"{}\" shown in {}",
            video_title, event.conversation_id
        );
    }
}

/// Record that the CTA tool was invoked for this conversation.
pub async fn handle_cta_tracking(db: &Database, event: &WebhookEvent) {
    let demo_id = event.string_var("demo_id");
    let cta_url = event.string_var("cta_url");

    if let Err(e) = db
        .record_cta_shown(&event.conversation_id, demo_id, cta_url, Utc::now())
        .await
    {
        error!("Failed to store CTA tracking for {}: {e:#}", event.conversation_id);
    } else {
        info!("🔔 Recorded CTA shown in {}", event.conversation_id);
    }
}

/// Store the perception-analysis payload delivered at conversation end.
pub async fn handle_perception_analysis(db: &Database, event: &WebhookEvent) {
    let analysis = event
        .event
        .get("properties")
        .and_then(|props| props.get("analysis"))
        .cloned()
        .unwrap_or(Value::Null);

    if analysis.is_null() {
        debug!(
            "Perception analysis event for {} carried no analysis, ignoring",
            event.conversation_id
        );
        return;
    }

    let result = db
        .upsert_perception_analysis(
            &event.conversation_id,
            analysis,
            event.event_type(),
            event.raw_payload(),
            Utc::now(),
        )
        .await;

    if let Err(e) = result {
        error!(
            "Failed to store perception analysis for {}: {e:#}",
            event.conversation_id
        );
    } else {
        info!("👁️ Captured perception analysis for {}", event.conversation_id);
    }
}

/// Finalize a conversation exactly once, whichever trigger arrives first.
pub async fn handle_conversation_ended(
    db: &Database,
    sessions: &SessionRegistry,
    conversation_id: &str,
    source: &str,
) {
    if !sessions.try_finish(conversation_id, source).await {
        debug!(
            "Conversation {} already finalized, ignoring end signal from '{}'",
            conversation_id, source
        );
        return;
    }

    if let Err(e) = db.mark_conversation_ended(conversation_id, Utc::now()).await {
        error!("Failed to mark conversation {} ended: {e:#}", conversation_id);
    } else {
        info!("👋 Conversation {} ended by '{}'", conversation_id, source);
    }
}
