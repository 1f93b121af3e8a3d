//! API data models

use serde::{Deserialize, Serialize};

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Body for creating a conversation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConversationBody {
    #[serde(default)]
    pub conversation_name: Option<String>,
    /// Agent grounding context, may include a "## Video Chapters" section
    #[serde(default)]
    pub agent_context: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Body for building a video-context update
#[derive(Debug, Clone, Deserialize)]
pub struct VideoContextBody {
    pub video_title: String,
    pub timestamp: f64,
    #[serde(default)]
    pub is_paused: bool,
    /// Agent context text to pull the chapter list from
    #[serde(default)]
    pub agent_context: Option<String>,
}
