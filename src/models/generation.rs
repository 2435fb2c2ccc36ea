//! Generation sessions: source text in, suggestions out, then the user's verdict on each.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A proposed flashcard, not yet stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashcardSuggestion {
    pub id: i64,
    pub front: String,
    pub back: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerateFlashcardsResponse {
    pub generation_id: i64,
    pub suggestions: Vec<FlashcardSuggestion>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionAction {
    Accept,
    Reject,
    Edit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionReview {
    pub suggestion_id: i64,
    pub action: SuggestionAction,
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
}

/// The user's verdicts for one generation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewSuggestionsCommand {
    pub generation_id: i64,
    pub reviews: Vec<SuggestionReview>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionReviewCounts {
    pub accepted: u32,
    pub rejected: u32,
    pub edited: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: i64,
    pub model: String,
    pub source_text_hash: String,
    pub source_text_length: u32,
    pub generated_count: u32,
    pub accepted_unedited_count: u32,
    pub accepted_edited_count: u32,
    pub rejected_count: u32,
    pub generation_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Totals over every generation session of a user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    pub total_generated: u64,
    pub accepted_unedited: u64,
    pub accepted_edited: u64,
    pub rejected: u64,
}

impl GenerationStatistics {
    /// Share of generated suggestions that ended up stored, edited or not.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.total_generated == 0 {
            return None;
        }
        Some((self.accepted_unedited + self.accepted_edited) as f64 / self.total_generated as f64)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationErrorLog {
    pub id: i64,
    pub model: String,
    pub source_text_hash: String,
    pub source_text_length: u32,
    pub error_code: String,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_command_from_json() {
        let json = r#"{
  "generation_id": 3,
  "reviews": [
    { "suggestion_id": 1, "action": "accept", "front": "Q", "back": "A" },
    { "suggestion_id": 2, "action": "reject" }
  ]
}"#;

        let command: ReviewSuggestionsCommand = serde_json::from_str(json).unwrap();
        assert_eq!(command.generation_id, 3);
        assert_eq!(command.reviews.len(), 2);
        assert_eq!(command.reviews[0].action, SuggestionAction::Accept);
        assert_eq!(command.reviews[1].front, None);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let json = r#"{ "suggestion_id": 1, "action": "maybe" }"#;
        assert!(serde_json::from_str::<SuggestionReview>(json).is_err());
    }

    #[test]
    fn test_acceptance_rate() {
        let stats = GenerationStatistics {
            total_generated: 6,
            accepted_unedited: 2,
            accepted_edited: 1,
            rejected: 3,
        };
        assert_eq!(stats.acceptance_rate(), Some(0.5));
        assert_eq!(GenerationStatistics::default().acceptance_rate(), None);
    }
}
