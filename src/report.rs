/// Conversation report assembly
///
/// Joins the per-concern capture rows for one conversation and attaches the
/// computed Domo Score. The score is derived on every read; only the
/// capture rows are stored.
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::scoring::{
    calculate_domo_score, score_color, score_label, ContactInfo, CtaTrackingData,
    DomoScoreResult, ProductInterestData, ScoreColor, VideoShowcaseData,
};
use crate::storage::{ConversationRecord, Database};

/// Everything the reporting dashboard shows for one conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationReport {
    pub conversation_id: String,
    pub conversation: Option<ConversationRecord>,
    pub contact: Option<ContactInfo>,
    pub product_interest: Option<ProductInterestData>,
    pub video_showcase: Option<VideoShowcaseData>,
    pub cta_tracking: Option<CtaTrackingData>,
    pub perception_analysis: Option<Value>,
    pub score: DomoScoreResult,
    pub score_color: ScoreColor,
    pub score_label: &'static str,
}

/// Fetch all concern rows for a conversation and compute its score.
pub async fn build_conversation_report(
    db: &Database,
    conversation_id: &str,
) -> Result<ConversationReport> {
    let conversation = db.get_conversation(conversation_id).await?;
    let contact = db.get_contact_info(conversation_id).await?;
    let product_interest = db.get_product_interest(conversation_id).await?;
    let video_showcase = db.get_video_showcase(conversation_id).await?;
    let cta_tracking = db.get_cta_tracking(conversation_id).await?;
    let perception_analysis = db.get_perception_analysis(conversation_id).await?;

    let score = calculate_domo_score(
        contact.as_ref(),
        product_interest.as_ref(),
        video_showcase.as_ref(),
        cta_tracking.as_ref(),
        perception_analysis.as_ref(),
    );

    Ok(ConversationReport {
        conversation_id: conversation_id.to_string(),
        conversation,
        contact,
        product_interest,
        video_showcase,
        cta_tracking,
        perception_analysis,
        score_color: score_color(score.score),
        score_label: score_label(score.score),
        score,
    })
}
