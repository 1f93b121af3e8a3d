/// Thin client for the Tavus conversational-AI REST API
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::TavusConfig;

#[derive(Debug, Error)]
pub enum TavusError {
    #[error("Tavus API key not configured")]
    MissingApiKey,
    #[error("Tavus API error {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Request body for creating a conversation
#[derive(Debug, Clone, Serialize)]
pub struct CreateConversationRequest {
    pub replica_id: Option<String>,
    pub persona_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,
    /// Agent grounding context; carries the "## Video Chapters" section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversational_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Vendor response for a created conversation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub conversation_url: Option<String>,
    pub status: Option<String>,
}

pub struct TavusClient {
    config: TavusConfig,
    client: reqwest::Client,
}

impl TavusClient {
    pub fn new(config: TavusConfig) -> Result<Self, TavusError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(TavusError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<&str, TavusError> {
        self.config.api_key.as_deref().ok_or(TavusError::MissingApiKey)
    }

    /// Create a new conversation with the configured replica/persona.
    pub async fn create_conversation(
        &self,
        mut request: CreateConversationRequest,
    ) -> Result<ConversationResponse, TavusError> {
        if request.replica_id.is_none() {
            request.replica_id = self.config.replica_id.clone();
        }
        if request.persona_id.is_none() {
            request.persona_id = self.config.persona_id.clone();
        }

        let url = format!("{}/conversations", self.config.base_url);
        debug!("Creating Tavus conversation via {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TavusError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// End a conversation. Used best-effort during finalization.
    pub async fn end_conversation(&self, conversation_id: &str) -> Result<(), TavusError> {
        let url = format!("{}/conversations/{}/end", self.config.base_url, conversation_id);
        debug!("Ending Tavus conversation via {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TavusError::Api { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TavusConfig;

    #[test]
    fn test_client_requires_api_key() {
        let config = TavusConfig::default();
        assert!(matches!(TavusClient::new(config), Err(TavusError::MissingApiKey)));

        let config = TavusConfig {
            api_key: Some(String::new()),
            ..TavusConfig::default()
        };
        assert!(matches!(TavusClient::new(config), Err(TavusError::MissingApiKey)));
    }

    #[test]
    fn test_create_request_skips_absent_fields() {
        let request = CreateConversationRequest {
            replica_id: Some("r1".to_string()),
            persona_id: None,
            conversation_name: None,
            conversational_context: None,
            callback_url: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["replica_id"], "r1");
        assert!(json.get("conversation_name").is_none());
        assert!(json.get("callback_url").is_none());
    }
}
