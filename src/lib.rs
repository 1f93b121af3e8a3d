/// Domo Server
///
/// Backend for Domo: captures webhook analytics from the conversational-AI
/// vendor, computes per-conversation Domo Scores, and builds video-context
/// grounding for the live agent.

pub mod api;
pub mod chapters;
pub mod config;
pub mod context;
pub mod report;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod tavus;
pub mod webhook;

// Re-export main types for easy access
pub use crate::chapters::{find_chapter_at_timestamp, format_time, parse_chapters_from_context, VideoChapter};
pub use crate::config::Config;
pub use crate::context::{build_video_context_description, create_video_context_message, VideoContextInfo, VideoContextMessage};
pub use crate::report::{build_conversation_report, ConversationReport};
pub use crate::scoring::{calculate_domo_score, is_valid_perception_analysis, score_color, score_label, DomoScoreBreakdown, DomoScoreResult, ScoreColor};
pub use crate::session::{LeaveGuard, SessionRegistry};
pub use crate::storage::Database;
pub use crate::tavus::{TavusClient, TavusError};
pub use crate::webhook::{normalize_pain_points, process_webhook_event, WebhookEvent};
