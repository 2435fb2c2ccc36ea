//! Rating a flashcard and finding the ones due for study.
use chrono::{DateTime, Local, TimeZone};

use super::RequestContext;
use crate::database::db::{self, NewReview};
use crate::error::{ServiceError, ServiceResult};
use crate::models::sm2::{self, ReviewSchedule};
use crate::models::{DueFlashcardsParams, FlashcardWithReview, Page, ReviewRecord, ReviewStateLookup};
use crate::validation;

/// Schedules the next review of a stored card from whatever state `lookup` knows about.
pub fn schedule_next_review<L, Tz>(
    lookup: &L,
    flashcard_id: i64,
    rating: i32,
    now: &DateTime<Tz>,
) -> rusqlite::Result<ReviewSchedule>
where
    L: ReviewStateLookup + ?Sized,
    Tz: TimeZone,
{
    let previous = lookup.latest_review_state(flashcard_id)?;
    Ok(sm2::compute_next_review_at(
        rating,
        previous.map(|state| state.ease_factor),
        previous.map(|state| state.interval),
        now,
    ))
}

/// Records a 0-5 rating for a flashcard and returns the stored review.
///
/// Missing cards and cards of other users both report `NotFound`.
pub fn submit_review(
    ctx: &RequestContext<'_>,
    flashcard_id: i64,
    rating: i32,
) -> ServiceResult<ReviewRecord> {
    validation::validate_id(flashcard_id, "Flashcard")?;
    validation::validate_rating(rating)?;

    match db::get_flashcard_owner(flashcard_id, ctx.conn)? {
        Some(owner) if owner == ctx.user_id => {}
        _ => {
            tracing::warn!(flashcard_id, "review for missing or foreign flashcard");
            return Err(ServiceError::NotFound(format!(
                "Flashcard {} not found or access denied",
                flashcard_id
            )));
        }
    }

    // Schedule, count and insert must all see the same latest review
    let tx = ctx.conn.unchecked_transaction()?;
    let schedule = schedule_next_review(&*tx, flashcard_id, rating, &Local::now())?;
    let review_count = db::latest_review(flashcard_id, &tx)?
        .map_or(1, |review| review.review_count.saturating_add(1));

    let review = db::insert_review(
        &NewReview {
            flashcard_id,
            user_id: ctx.user_id,
            rating,
            schedule: &schedule,
            review_count,
        },
        &tx,
    )?;
    tx.commit()?;

    tracing::info!(
        flashcard_id,
        rating,
        ease_factor = review.ease_factor,
        interval = review.interval,
        next_review_date = %review.next_review_date,
        "review submitted"
    );
    Ok(review)
}

pub fn due_flashcards(
    ctx: &RequestContext<'_>,
    params: &DueFlashcardsParams,
) -> ServiceResult<Page<FlashcardWithReview>> {
    validation::validate_pagination(&params.pagination)?;
    let page = db::get_flashcards_due_for_review(ctx.user_id, params, ctx.conn)?;
    tracing::debug!(total = page.total, "due flashcards fetched");
    Ok(page)
}
