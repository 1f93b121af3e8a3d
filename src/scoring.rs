/// Domo Score calculation
///
/// The Domo Score is a 0-5 integer summarizing how much useful signal one
/// conversation produced: contact info captured, stated reason for visiting,
/// feature interest (videos actually shown), CTA conversion, and whether a
/// perception analysis was produced. Each criterion contributes exactly 0 or
/// 1; the score is derived on every read and never persisted.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum attainable Domo Score
pub const MAX_SCORE: u8 = 5;

/// Contact/qualification record captured from the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub id: String,
    pub conversation_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Product interest record captured from the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInterestData {
    pub id: String,
    pub conversation_id: String,
    pub primary_interest: Option<String>,
    pub pain_points: Option<Vec<String>>,
    pub received_at: DateTime<Utc>,
}

/// Accumulating record of videos shown during the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoShowcaseData {
    pub id: String,
    pub conversation_id: String,
    pub videos_shown: Vec<String>,
    pub objective_name: String,
    pub received_at: DateTime<Utc>,
}

/// CTA tracking record; `cta_clicked_at` is the sole signal of conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtaTrackingData {
    pub id: String,
    pub conversation_id: String,
    pub demo_id: Option<String>,
    pub cta_shown_at: Option<DateTime<Utc>>,
    pub cta_clicked_at: Option<DateTime<Utc>>,
    pub cta_url: Option<String>,
}

/// Per-criterion breakdown of the score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomoScoreBreakdown {
    pub contact_confirmation: bool,
    pub reason_for_visit: bool,
    pub platform_feature_interest: bool,
    pub cta_execution: bool,
    pub perception_analysis: bool,
}

/// Computed score plus its breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DomoScoreResult {
    pub score: u8,
    pub max_score: u8,
    pub breakdown: DomoScoreBreakdown,
}

/// Semantic color token for a score badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreColor {
    Green,
    Blue,
    Yellow,
    Red,
}

impl ScoreColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreColor::Green => "green",
            ScoreColor::Blue => "blue",
            ScoreColor::Yellow => "yellow",
            ScoreColor::Red => "red",
        }
    }
}

fn is_truthy(field: Option<&String>) -> bool {
    field.map_or(false, |s| !s.is_empty())
}

/// Whether a perception-analysis value counts as "produced output".
///
/// Strings need at least 10 characters after trimming, arrays and objects
/// need at least one element/key; contents are not inspected, so a string
/// describing a failure state still counts. Anything else is invalid.
pub fn is_valid_perception_analysis(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s.trim().chars().count() >= 10,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => false,
    }
}

/// Compute the Domo Score from up to five independently-sourced records.
///
/// Every input is nullable and every combination, including all-null,
/// produces a well-defined result.
pub fn calculate_domo_score(
    contact: Option<&ContactInfo>,
    product_interest: Option<&ProductInterestData>,
    video_showcase: Option<&VideoShowcaseData>,
    cta_tracking: Option<&CtaTrackingData>,
    perception_analysis: Option<&Value>,
) -> DomoScoreResult {
    let breakdown = DomoScoreBreakdown {
        contact_confirmation: contact.map_or(false, |c| {
            is_truthy(c.email.as_ref())
                || is_truthy(c.first_name.as_ref())
                || is_truthy(c.last_name.as_ref())
        }),
        reason_for_visit: product_interest.map_or(false, |p| {
            is_truthy(p.primary_interest.as_ref())
                || p.pain_points.as_ref().map_or(false, |points| !points.is_empty())
        }),
        platform_feature_interest: video_showcase.map_or(false, |v| !v.videos_shown.is_empty()),
        cta_execution: cta_tracking.map_or(false, |c| c.cta_clicked_at.is_some()),
        perception_analysis: is_valid_perception_analysis(perception_analysis),
    };

    let score = [
        breakdown.contact_confirmation,
        breakdown.reason_for_visit,
        breakdown.platform_feature_interest,
        breakdown.cta_execution,
        breakdown.perception_analysis,
    ]
    .iter()
    .filter(|&&hit| hit)
    .count() as u8;

    DomoScoreResult {
        score,
        max_score: MAX_SCORE,
        breakdown,
    }
}

/// Map a score to its badge color: 4-5 green, 3 blue, 2 yellow, 0-1 red.
pub fn score_color(score: u8) -> ScoreColor {
    match score {
        4..=u8::MAX => ScoreColor::Green,
        3 => ScoreColor::Blue,
        2 => ScoreColor::Yellow,
        _ => ScoreColor::Red,
    }
}

/// Map a score to its badge label, same buckets as `score_color`.
pub fn score_label(score: u8) -> &'static str {
    match score {
        4..=u8::MAX => "Excellent",
        3 => "Good",
        2 => "Fair",
        _ => "Poor",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact(email: Option<&str>, first: Option<&str>, last: Option<&str>) -> ContactInfo {
        ContactInfo {
            id: "q1".to_string(),
            conversation_id: "conv-1".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: email.map(str::to_string),
            position: None,
            received_at: Utc::now(),
        }
    }

    fn interest(primary: Option<&str>, pain_points: Option<Vec<&str>>) -> ProductInterestData {
        ProductInterestData {
            id: "p1".to_string(),
            conversation_id: "conv-1".to_string(),
            primary_interest: primary.map(str::to_string),
            pain_points: pain_points.map(|v| v.into_iter().map(str::to_string).collect()),
            received_at: Utc::now(),
        }
    }

    fn showcase(videos: Vec<&str>) -> VideoShowcaseData {
        VideoShowcaseData {
            id: "v1".to_string(),
            conversation_id: "conv-1".to_string(),
            videos_shown: videos.into_iter().map(str::to_string).collect(),
            objective_name: "video_showcase".to_string(),
            received_at: Utc::now(),
        }
    }

    fn cta(clicked: bool) -> CtaTrackingData {
        CtaTrackingData {
            id: "c1".to_string(),
            conversation_id: "conv-1".to_string(),
            demo_id: Some("demo-1".to_string()),
            cta_shown_at: Some(Utc::now()),
            cta_clicked_at: clicked.then(Utc::now),
            cta_url: Some("https://example.com/trial".to_string()),
        }
    }

    #[test]
    fn test_all_null_scores_zero() {
        let result = calculate_domo_score(None, None, None, None, None);

        assert_eq!(result.score, 0);
        assert_eq!(result.max_score, 5);
        assert_eq!(result.breakdown, DomoScoreBreakdown::default());
    }

    #[test]
    fn test_email_only_contact_scores_one() {
        let c = contact(Some("lead@example.com"), None, None);
        let result = calculate_domo_score(Some(&c), None, None, None, None);

        assert_eq!(result.score, 1);
        assert!(result.breakdown.contact_confirmation);
        assert!(!result.breakdown.reason_for_visit);
        assert!(!result.breakdown.platform_feature_interest);
        assert!(!result.breakdown.cta_execution);
        assert!(!result.breakdown.perception_analysis);
    }

    #[test]
    fn test_any_single_contact_field_suffices() {
        for c in [
            contact(None, Some("Ada"), None),
            contact(None, None, Some("Lovelace")),
            contact(Some("a@b.co"), None, None),
        ] {
            let result = calculate_domo_score(Some(&c), None, None, None, None);
            assert!(result.breakdown.contact_confirmation);
        }

        // Row exists but every field is empty or missing
        let empty = contact(Some(""), None, None);
        let result = calculate_domo_score(Some(&empty), None, None, None, None);
        assert!(!result.breakdown.contact_confirmation);
    }

    #[test]
    fn test_reason_for_visit_from_either_field() {
        let by_interest = interest(Some("analytics"), None);
        let by_pain = interest(None, Some(vec!["slow reporting"]));
        let neither = interest(None, Some(vec![]));

        assert!(calculate_domo_score(None, Some(&by_interest), None, None, None).breakdown.reason_for_visit);
        assert!(calculate_domo_score(None, Some(&by_pain), None, None, None).breakdown.reason_for_visit);
        assert!(!calculate_domo_score(None, Some(&neither), None, None, None).breakdown.reason_for_visit);
    }

    #[test]
    fn test_empty_showcase_row_does_not_count() {
        let empty = showcase(vec![]);
        let result = calculate_domo_score(None, None, Some(&empty), None, None);

        assert!(!result.breakdown.platform_feature_interest);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_cta_shown_but_not_clicked_does_not_count() {
        let shown = cta(false);
        assert!(!calculate_domo_score(None, None, None, Some(&shown), None).breakdown.cta_execution);

        let clicked = cta(true);
        assert!(calculate_domo_score(None, None, None, Some(&clicked), None).breakdown.cta_execution);
    }

    #[test]
    fn test_full_house_scores_five() {
        let c = contact(Some("lead@example.com"), Some("Ada"), None);
        let p = interest(Some("analytics"), Some(vec!["manual exports"]));
        let v = showcase(vec!["Dashboard Walkthrough"]);
        let t = cta(true);
        let perception = json!("User appeared engaged throughout the walkthrough");

        let result = calculate_domo_score(Some(&c), Some(&p), Some(&v), Some(&t), Some(&perception));

        assert_eq!(result.score, 5);
        assert!(result.breakdown.contact_confirmation);
        assert!(result.breakdown.reason_for_visit);
        assert!(result.breakdown.platform_feature_interest);
        assert!(result.breakdown.cta_execution);
        assert!(result.breakdown.perception_analysis);
    }

    #[test]
    fn test_perception_analysis_truth_table() {
        assert!(!is_valid_perception_analysis(None));
        assert!(!is_valid_perception_analysis(Some(&Value::Null)));
        assert!(!is_valid_perception_analysis(Some(&json!(""))));
        assert!(!is_valid_perception_analysis(Some(&json!("short"))));
        assert!(is_valid_perception_analysis(Some(&json!("exactly ten"))));
        // Unfavorable text still counts as "analysis was produced"
        assert!(is_valid_perception_analysis(Some(&json!("completely black screen"))));
        assert!(!is_valid_perception_analysis(Some(&json!({}))));
        assert!(is_valid_perception_analysis(Some(&json!({"a": 1}))));
        assert!(!is_valid_perception_analysis(Some(&json!([]))));
        assert!(is_valid_perception_analysis(Some(&json!(["x"]))));
        assert!(!is_valid_perception_analysis(Some(&json!(42))));
        assert!(!is_valid_perception_analysis(Some(&json!(true))));
    }

    #[test]
    fn test_color_and_label_buckets() {
        for score in 0u8..=5 {
            let (color, label) = (score_color(score), score_label(score));
            match score {
                4 | 5 => {
                    assert_eq!(color, ScoreColor::Green);
                    assert_eq!(label, "Excellent");
                }
                3 => {
                    assert_eq!(color, ScoreColor::Blue);
                    assert_eq!(label, "Good");
                }
                2 => {
                    assert_eq!(color, ScoreColor::Yellow);
                    assert_eq!(label, "Fair");
                }
                _ => {
                    assert_eq!(color, ScoreColor::Red);
                    assert_eq!(label, "Poor");
                }
            }
        }
    }
}
