//! Flashcard is a pair <front, back>. Only text is used on both sides.
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ReviewRecord;

/// Where a flashcard came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashcardSource {
    /// Generated suggestion accepted as is
    AiFull,
    /// Generated suggestion accepted after editing
    AiEdited,
    Manual,
}

impl FlashcardSource {
    pub const ALL: [FlashcardSource; 3] = [
        FlashcardSource::AiFull,
        FlashcardSource::AiEdited,
        FlashcardSource::Manual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlashcardSource::AiFull => "ai-full",
            FlashcardSource::AiEdited => "ai-edited",
            FlashcardSource::Manual => "manual",
        }
    }
}

impl fmt::Display for FlashcardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlashcardSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai-full" => Ok(FlashcardSource::AiFull),
            "ai-edited" => Ok(FlashcardSource::AiEdited),
            "manual" => Ok(FlashcardSource::Manual),
            other => Err(format!("unknown flashcard source '{}'", other)),
        }
    }
}

impl ToSql for FlashcardSource {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FlashcardSource {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flashcard together with its newest review, if it was ever reviewed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlashcardWithReview {
    #[serde(flatten)]
    pub flashcard: Flashcard,
    pub latest_review: Option<ReviewRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> Flashcard {
        Flashcard {
            id: 1,
            front: "hello".to_string(),
            back: "cześć".to_string(),
            source: FlashcardSource::Manual,
            generation_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_source_parsing() {
        for source in FlashcardSource::ALL {
            assert_eq!(source.as_str().parse::<FlashcardSource>(), Ok(source));
        }
        assert!("ai".parse::<FlashcardSource>().is_err());
    }

    #[test]
    fn test_source_serializes_kebab_case() {
        let json = serde_json::to_string(&FlashcardSource::AiEdited).unwrap();
        assert_eq!(json, "\"ai-edited\"");
    }

    #[test]
    fn test_flashcard_with_review_is_flattened() {
        let card = FlashcardWithReview {
            flashcard: sample_card(),
            latest_review: None,
        };

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["front"], "hello");
        assert_eq!(value["source"], "manual");
        assert!(value["latest_review"].is_null());
    }
}
