//! Scheduling state of a flashcard and the review records it is persisted as.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sm2::{INITIAL_EASE_FACTOR, INITIAL_INTERVAL};

/// Ease factor and interval carried from one review to the next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval: u32,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval: INITIAL_INTERVAL,
        }
    }
}

/// One rating event, as stored. The newest record of a card is its current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub flashcard_id: i64,
    pub rating: i32,
    pub ease_factor: f64,
    pub interval: u32,
    pub next_review_date: DateTime<Utc>,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    pub fn state(&self) -> ReviewState {
        ReviewState {
            ease_factor: self.ease_factor,
            interval: self.interval,
        }
    }
}

/// Read access to the latest scheduling state of a card.
///
/// Returns `None` when the card has never been reviewed.
pub trait ReviewStateLookup {
    fn latest_review_state(&self, flashcard_id: i64) -> rusqlite::Result<Option<ReviewState>>;
}
