//! Study session over the flashcards that are due.
//! Handles multi-round review: every rating is submitted to the scheduler, and cards
//! rated below 3 come back in the next round until they are passed.

use super::{Flashcard, FlashcardWithReview, ReviewRecord};
use crate::error::ServiceResult;
use crate::services::RequestContext;
use crate::services::reviews::submit_review;

/// Lowest rating that counts as recalled for this session.
pub const PASSING_RATING: i32 = 3;

#[derive(Clone, Debug)]
pub struct StudyCard {
    pub flashcard: Flashcard,
    pub latest_review: Option<ReviewRecord>,
    pub passed: bool,
}

/// Manages a study session with multiple review rounds.
pub struct StudySession {
    pub cards: Vec<StudyCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub round_number: usize,
}

impl StudySession {
    pub fn new(due: Vec<FlashcardWithReview>) -> Self {
        let cards: Vec<_> = due
            .into_iter()
            .map(|item| StudyCard {
                flashcard: item.flashcard,
                latest_review: item.latest_review,
                passed: false,
            })
            .collect();

        let indices: Vec<usize> = (0..cards.len()).collect();

        Self {
            cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&StudyCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_back = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that were not passed.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|card| !card.passed))
            .collect();

        if !failed.is_empty() {
            self.current_round_cards = failed;
            self.current_index = 0;
            self.show_back = false;
            self.round_number += 1;
        }
    }

    /// Submits `rating` for the current card and records whether it was passed.
    ///
    /// Returns `Ok(None)` when there is no current card.
    pub fn rate_current_card(
        &mut self,
        ctx: &RequestContext<'_>,
        rating: i32,
    ) -> ServiceResult<Option<ReviewRecord>> {
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.cards.get_mut(idx) else {
            return Ok(None);
        };

        let review = submit_review(ctx, card.flashcard.id, rating)?;
        card.passed = rating >= PASSING_RATING;
        card.latest_review = Some(review.clone());
        Ok(Some(review))
    }

    pub fn passed_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.cards.get(idx).is_some_and(|card| card.passed))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    /// True when the round is empty or every card in it was passed.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.passed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
