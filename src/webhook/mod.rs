/// Vendor webhook intake
///
/// The conversational-AI vendor posts lifecycle and objective-completion
/// events here. Payloads are treated as a loosely-typed bag: every field
/// except the conversation id is optional, unknown fields are ignored, and
/// a capture that cannot be stored is logged and dropped rather than
/// bounced back to the vendor (availability over guaranteed persistence).

pub mod handlers;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::session::SessionRegistry;
use crate::storage::Database;

/// An incoming webhook event, deserialized leniently
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub conversation_id: String,
    #[serde(default)]
    pub objective_name: Option<String>,
    #[serde(default)]
    pub output_variables: Map<String, Value>,
    #[serde(default)]
    pub event: Value,
}

impl WebhookEvent {
    /// The vendor's event type, e.g. `application.objective_completed`.
    pub fn event_type(&self) -> Option<String> {
        self.event
            .get("event_type")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The raw event object, stored verbatim for forensic replay.
    pub fn raw_payload(&self) -> Value {
        self.event.clone()
    }

    /// Extract a named output variable as a non-empty trimmed string.
    pub fn string_var(&self, key: &str) -> Option<String> {
        self.output_variables
            .get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Normalize the vendor's stringly-typed `pain_points` field.
///
/// The vendor may deliver a single string or an array; a lone string is
/// wrapped in a one-element array, an absent or unusable value stores null.
pub fn normalize_pain_points(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(vec![s.clone()]),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Some(_) => None,
    }
}

/// Which concern table an objective event feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Qualification,
    ProductInterest,
    VideoShowcase,
    CtaTracking,
}

/// Route an objective event to its concern table.
///
/// Objective names configured by demo owners are not guaranteed stable, so
/// the name match is a keyword match with a fallback on which known output
/// variables the event actually carries.
pub fn classify_event(event: &WebhookEvent) -> Option<Concern> {
    if let Some(name) = event.objective_name.as_deref() {
        let name = name.to_lowercase();
        if name.contains("qualification") || name.contains("contact") {
            return Some(Concern::Qualification);
        }
        if name.contains("interest") || name.contains("discovery") {
            return Some(Concern::ProductInterest);
        }
        if name.contains("showcase") || name.contains("video") {
            return Some(Concern::VideoShowcase);
        }
        if name.contains("cta") || name.contains("call_to_action") {
            return Some(Concern::CtaTracking);
        }
    }

    let vars = &event.output_variables;
    if ["email", "first_name", "last_name", "position"].iter().any(|k| vars.contains_key(*k)) {
        return Some(Concern::Qualification);
    }
    if vars.contains_key("primary_interest") || vars.contains_key("pain_points") {
        return Some(Concern::ProductInterest);
    }
    if vars.contains_key("video_title") || vars.contains_key("fetched_video") {
        return Some(Concern::VideoShowcase);
    }
    if vars.contains_key("cta_url") || vars.contains_key("cta_shown") {
        return Some(Concern::CtaTracking);
    }

    None
}

/// Process one webhook delivery end to end. Never fails: the vendor always
/// gets a success acknowledgment regardless of what happens locally.
pub async fn process_webhook_event(db: &Database, sessions: &SessionRegistry, event: WebhookEvent) {
    let event_type = event.event_type();
    debug!(
        "Webhook event for {}: type={:?} objective={:?}",
        event.conversation_id, event_type, event.objective_name
    );

    match event_type.as_deref() {
        Some("system.replica_joined") => {
            if let Err(e) = db
                .upsert_conversation(&event.conversation_id, None, chrono::Utc::now())
                .await
            {
                warn!("Failed to mark conversation {} active: {e:#}", event.conversation_id);
            }
        }
        Some("system.shutdown") => {
            handlers::handle_conversation_ended(db, sessions, &event.conversation_id, "webhook").await;
        }
        Some("application.perception_analysis") => {
            handlers::handle_perception_analysis(db, &event).await;
        }
        _ => match classify_event(&event) {
            Some(Concern::Qualification) => handlers::handle_qualification(db, &event).await,
            Some(Concern::ProductInterest) => handlers::handle_product_interest(db, &event).await,
            Some(Concern::VideoShowcase) => handlers::handle_video_showcase(db, &event).await,
            Some(Concern::CtaTracking) => handlers::handle_cta_tracking(db, &event).await,
            None => {
                info!(
                    "Unrecognized webhook event for {} (type={:?}), ignoring",
                    event.conversation_id, event_type
                );
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(objective: Option<&str>, vars: Value) -> WebhookEvent {
        WebhookEvent {
            conversation_id: "conv-1".to_string(),
            objective_name: objective.map(str::to_string),
            output_variables: vars.as_object().cloned().unwrap_or_default(),
            event: json!({"event_type": "application.objective_completed"}),
        }
    }

    #[test]
    fn test_normalize_pain_points_wraps_single_string() {
        let normalized = normalize_pain_points(Some(&json!("single string")));
        assert_eq!(normalized, Some(vec!["single string".to_string()]));
    }

    #[test]
    fn test_normalize_pain_points_passes_arrays_through() {
        let normalized = normalize_pain_points(Some(&json!(["a", "b"])));
        assert_eq!(normalized, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_normalize_pain_points_absent_is_none() {
        assert_eq!(normalize_pain_points(None), None);
        assert_eq!(normalize_pain_points(Some(&Value::Null)), None);
        assert_eq!(normalize_pain_points(Some(&json!(42))), None);
    }

    #[test]
    fn test_classify_by_objective_name() {
        assert_eq!(
            classify_event(&event(Some("collect_contact_qualification"), json!({}))),
            Some(Concern::Qualification)
        );
        assert_eq!(
            classify_event(&event(Some("product_interest_discovery"), json!({}))),
            Some(Concern::ProductInterest)
        );
        assert_eq!(
            classify_event(&event(Some("video_showcase"), json!({}))),
            Some(Concern::VideoShowcase)
        );
        assert_eq!(
            classify_event(&event(Some("present_cta"), json!({}))),
            Some(Concern::CtaTracking)
        );
    }

    #[test]
    fn test_classify_falls_back_to_variable_keys() {
        assert_eq!(
            classify_event(&event(None, json!({"email": "a@b.co"}))),
            Some(Concern::Qualification)
        );
        assert_eq!(
            classify_event(&event(None, json!({"pain_points": "slow"}))),
            Some(Concern::ProductInterest)
        );
        assert_eq!(
            classify_event(&event(None, json!({"video_title": "Intro"}))),
            Some(Concern::VideoShowcase)
        );
        assert_eq!(classify_event(&event(None, json!({"unrelated": 1}))), None);
    }

    #[test]
    fn test_lenient_deserialization() {
        let minimal: WebhookEvent = serde_json::from_value(json!({
            "conversation_id": "conv-9"
        }))
        .unwrap();

        assert_eq!(minimal.conversation_id, "conv-9");
        assert!(minimal.objective_name.is_none());
        assert!(minimal.output_variables.is_empty());
        assert!(minimal.event_type().is_none());
    }

    #[test]
    fn test_string_var_trims_and_rejects_empty() {
        let e = event(None, json!({"email": "  a@b.co  ", "first_name": "", "age": 3}));
        assert_eq!(e.string_var("email").as_deref(), Some("a@b.co"));
        assert_eq!(e.string_var("first_name"), None);
        assert_eq!(e.string_var("age"), None);
        assert_eq!(e.string_var("missing"), None);
    }
}
