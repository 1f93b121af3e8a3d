/// Video-context messages for the live conversational agent
///
/// The embedded player reports where the viewer is in the demo video; these
/// builders turn that snapshot into a one-line description and a structured
/// `video_context_update` payload the agent can be grounded with.
use serde::{Deserialize, Serialize};

use crate::chapters::{format_time, VideoChapter};

/// Snapshot of the player state for one instant
#[derive(Debug, Clone, Deserialize)]
pub struct VideoContextInfo {
    /// Title of the video being played
    pub video_title: String,
    /// Playback position in seconds (may be fractional)
    pub timestamp: f64,
    /// Whether playback is currently paused
    pub is_paused: bool,
    /// Chapter containing the playback position, if known
    pub current_chapter: Option<VideoChapter>,
}

/// Structured payload sent to the agent for grounding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContextMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub video_title: String,
    pub timestamp: f64,
    pub formatted_time: String,
    pub is_paused: bool,
    pub current_chapter: Option<VideoChapter>,
    pub description: String,
}

/// Build the human-readable sentence describing the player state.
///
/// Produces `User is {watching|paused} "{title}" at {m:ss}`, with
/// `. Currently viewing: "{chapter}"` appended only when a chapter is known.
pub fn build_video_context_description(info: &VideoContextInfo) -> String {
    let verb = if info.is_paused { "paused" } else { "watching" };
    let mut description = format!(
        "User is {} \"{}\" at {}",
        verb,
        info.video_title,
        format_time(info.timestamp)
    );

    if let Some(chapter) = &info.current_chapter {
        description.push_str(&format!(". Currently viewing: \"{}\"", chapter.title));
    }

    description
}

/// Build the full `video_context_update` message for one player snapshot.
pub fn create_video_context_message(info: &VideoContextInfo) -> VideoContextMessage {
    VideoContextMessage {
        message_type: "video_context_update".to_string(),
        video_title: info.video_title.clone(),
        timestamp: info.timestamp,
        formatted_time: format_time(info.timestamp),
        is_paused: info.is_paused,
        current_chapter: info.current_chapter.clone(),
        description: build_video_context_description(info),
    }
}
