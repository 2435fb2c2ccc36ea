//! Input checks run by the services before touching storage.
use crate::error::ServiceError;
use crate::models::query::MAX_PER_PAGE;
use crate::models::{Pagination, ReviewSuggestionsCommand, SuggestionAction};

pub const MAX_FRONT_LENGTH: usize = 200;
pub const MAX_BACK_LENGTH: usize = 500;
pub const MIN_SOURCE_TEXT_LENGTH: usize = 1000;
pub const MAX_SOURCE_TEXT_LENGTH: usize = 10000;
pub const MAX_SUGGESTION_REVIEWS: usize = 100;
pub const MIN_RATING: i32 = 0;
pub const MAX_RATING: i32 = 5;

fn invalid(message: impl Into<String>) -> ServiceError {
    ServiceError::Validation(message.into())
}

/// Front side: required, at most 200 characters
pub fn validate_front(front: &str) -> Result<(), ServiceError> {
    let count = front.chars().count();
    if count == 0 {
        return Err(invalid("Front side text is required"));
    }
    if count > MAX_FRONT_LENGTH {
        return Err(invalid(format!(
            "Front side text cannot exceed {} characters",
            MAX_FRONT_LENGTH
        )));
    }
    Ok(())
}

/// Back side: required, at most 500 characters
pub fn validate_back(back: &str) -> Result<(), ServiceError> {
    let count = back.chars().count();
    if count == 0 {
        return Err(invalid("Back side text is required"));
    }
    if count > MAX_BACK_LENGTH {
        return Err(invalid(format!(
            "Back side text cannot exceed {} characters",
            MAX_BACK_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: i32) -> Result<(), ServiceError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(invalid(format!(
            "Rating must be an integer between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        )));
    }
    Ok(())
}

pub fn validate_id(id: i64, what: &str) -> Result<(), ServiceError> {
    if id <= 0 {
        return Err(invalid(format!("{} id must be positive, got {}", what, id)));
    }
    Ok(())
}

pub fn validate_pagination(pagination: &Pagination) -> Result<(), ServiceError> {
    if pagination.page == 0 {
        return Err(invalid("Page must be at least 1"));
    }
    if pagination.per_page == 0 || pagination.per_page > MAX_PER_PAGE {
        return Err(invalid(format!(
            "Items per page must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }
    Ok(())
}

pub fn validate_source_text(source_text: &str) -> Result<(), ServiceError> {
    let count = source_text.chars().count();
    if count < MIN_SOURCE_TEXT_LENGTH {
        return Err(invalid(format!(
            "Text must be at least {} characters long",
            MIN_SOURCE_TEXT_LENGTH
        )));
    }
    if count > MAX_SOURCE_TEXT_LENGTH {
        return Err(invalid(format!(
            "Text cannot exceed {} characters",
            MAX_SOURCE_TEXT_LENGTH
        )));
    }
    Ok(())
}

/// Checks the whole batch of suggestion verdicts.
///
/// Accepted and edited suggestions must carry both sides; rejected ones may omit them,
/// but whatever is sent still has to respect the length limits.
pub fn validate_review_command(command: &ReviewSuggestionsCommand) -> Result<(), ServiceError> {
    validate_id(command.generation_id, "Generation")?;
    if command.reviews.is_empty() {
        return Err(invalid("At least one review is required"));
    }
    if command.reviews.len() > MAX_SUGGESTION_REVIEWS {
        return Err(invalid(format!(
            "Maximum {} reviews allowed per request",
            MAX_SUGGESTION_REVIEWS
        )));
    }

    for review in &command.reviews {
        validate_id(review.suggestion_id, "Suggestion")?;
        match review.action {
            SuggestionAction::Accept | SuggestionAction::Edit => {
                validate_front(review.front.as_deref().unwrap_or_default())?;
                validate_back(review.back.as_deref().unwrap_or_default())?;
            }
            SuggestionAction::Reject => {
                if review.front.as_deref().map_or(0, |s| s.chars().count()) > MAX_FRONT_LENGTH
                    || review.back.as_deref().map_or(0, |s| s.chars().count()) > MAX_BACK_LENGTH
                {
                    return Err(invalid(format!(
                        "Suggestion {} exceeds the length limits",
                        review.suggestion_id
                    )));
                }
            }
        }
    }
    Ok(())
}
