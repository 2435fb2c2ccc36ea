//! Turning source text into flashcard suggestions and storing the ones the user keeps.
use chrono::Utc;
use sha2::{Digest, Sha256};

use super::RequestContext;
use crate::database::db::{self, NewFlashcard, NewGenerationError};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    FlashcardSource, FlashcardSuggestion, GenerateFlashcardsResponse, ReviewSuggestionsCommand,
    SuggestionAction, SuggestionReviewCounts,
};
use crate::validation;

/// Source of flashcard suggestions for a piece of text.
pub trait SuggestionGenerator {
    fn generate(&self, source_text: &str, model: &str) -> ServiceResult<Vec<FlashcardSuggestion>>;
}

/// Fixed suggestions, used until a real model is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSuggestionGenerator;

impl SuggestionGenerator for MockSuggestionGenerator {
    fn generate(&self, _source_text: &str, _model: &str) -> ServiceResult<Vec<FlashcardSuggestion>> {
        let suggestions = [
            ("What is the capital of France?", "Paris"),
            ("What is the largest planet in our solar system?", "Jupiter"),
            ("Who wrote \"Romeo and Juliet\"?", "William Shakespeare"),
        ];

        Ok(suggestions
            .iter()
            .zip(1..)
            .map(|(&(front, back), id)| FlashcardSuggestion {
                id,
                front: front.to_string(),
                back: back.to_string(),
            })
            .collect())
    }
}

/// Hex SHA-256 of the source text; the text itself is never stored.
pub fn source_text_hash(source_text: &str) -> String {
    hex::encode(Sha256::digest(source_text.as_bytes()))
}

/// Opens a generation session for `source_text` and returns its suggestions.
///
/// Failures after validation are written to the generation error log before being returned.
pub fn generate_flashcards(
    ctx: &RequestContext<'_>,
    generator: &dyn SuggestionGenerator,
    model: &str,
    source_text: &str,
) -> ServiceResult<GenerateFlashcardsResponse> {
    validation::validate_source_text(source_text)?;

    let hash = source_text_hash(source_text);
    let length = source_text.chars().count() as u32;

    let result = run_generation(ctx, generator, model, source_text, &hash, length);
    if let Err(err) = &result {
        tracing::error!(error = %err, code = err.code(), "flashcard generation failed");
        let logged = db::insert_generation_error(
            &NewGenerationError {
                user_id: ctx.user_id,
                model,
                source_text_hash: &hash,
                source_text_length: length,
                error_code: err.code(),
                error_message: &err.to_string(),
            },
            ctx.conn,
        );
        if let Err(log_err) = logged {
            tracing::warn!(error = %log_err, "failed to log generation error");
        }
    }
    result
}

fn run_generation(
    ctx: &RequestContext<'_>,
    generator: &dyn SuggestionGenerator,
    model: &str,
    source_text: &str,
    hash: &str,
    length: u32,
) -> ServiceResult<GenerateFlashcardsResponse> {
    let generation_id = db::create_generation_session(ctx.user_id, model, hash, length, ctx.conn)?;
    let suggestions = generator.generate(source_text, model)?;
    db::set_generation_result(generation_id, suggestions.len() as u32, Utc::now(), ctx.conn)?;

    tracing::info!(generation_id, count = suggestions.len(), model, "suggestions generated");
    Ok(GenerateFlashcardsResponse {
        generation_id,
        suggestions,
    })
}

/// Applies the user's verdicts on a session's suggestions.
///
/// Accepted suggestions are stored as `ai-full`, edited ones as `ai-edited`; the session's
/// counts are replaced by this batch's totals. All writes commit together or not at all.
pub fn review_suggestions(
    ctx: &RequestContext<'_>,
    command: &ReviewSuggestionsCommand,
) -> ServiceResult<SuggestionReviewCounts> {
    validation::validate_review_command(command)?;

    if db::get_generation_session(command.generation_id, ctx.user_id, ctx.conn)?.is_none() {
        tracing::warn!(generation_id = command.generation_id, "generation session not found");
        return Err(ServiceError::NotFound(format!(
            "Generation session {} not found",
            command.generation_id
        )));
    }

    let tx = ctx.conn.unchecked_transaction()?;
    let mut counts = SuggestionReviewCounts::default();

    for review in &command.reviews {
        let source = match review.action {
            SuggestionAction::Accept => {
                counts.accepted += 1;
                FlashcardSource::AiFull
            }
            SuggestionAction::Edit => {
                counts.edited += 1;
                FlashcardSource::AiEdited
            }
            SuggestionAction::Reject => {
                counts.rejected += 1;
                tracing::debug!(suggestion_id = review.suggestion_id, "suggestion rejected");
                continue;
            }
        };

        db::insert_flashcard(
            &NewFlashcard {
                user_id: ctx.user_id,
                front: review.front.as_deref().unwrap_or_default(),
                back: review.back.as_deref().unwrap_or_default(),
                source,
                generation_id: Some(command.generation_id),
            },
            &tx,
        )?;
    }

    db::set_session_review_counts(command.generation_id, &counts, &tx)?;
    tx.commit()?;

    tracing::info!(
        generation_id = command.generation_id,
        accepted = counts.accepted,
        edited = counts.edited,
        rejected = counts.rejected,
        "suggestions reviewed"
    );
    Ok(counts)
}
