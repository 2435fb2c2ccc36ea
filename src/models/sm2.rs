//! SM-2 (SuperMemo 2) review scheduler.
//!
//! Computes the next scheduling state of a flashcard from the learner's rating:
//! - Ratings 0-2: failed recall, the interval goes back to 1 day
//! - Ratings 3-5: the card graduates to 6 days after its first interval, then grows by EF
//! - EF is adjusted after every review, failed or not, and never drops below 1.3
//! - The next review date is "now" plus the interval in calendar days

use super::ReviewState;
use chrono::{DateTime, Days, Duration, Local, TimeZone, Utc};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const INITIAL_INTERVAL: u32 = 1;
pub const GRADUATION_INTERVAL: u32 = 6;

/// Output of one scheduling step.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewSchedule {
    pub ease_factor: f64,
    pub interval: u32,
    pub next_review_date: DateTime<Utc>,
}

/// Schedules the next review relative to the local wall clock.
///
/// rating: 0-5 (0 = total failure, 5 = perfect recall). Missing previous values fall back
/// to the first-review defaults (EF 2.5, interval 1).
pub fn compute_next_review(
    rating: i32,
    previous_ease_factor: Option<f64>,
    previous_interval: Option<u32>,
) -> ReviewSchedule {
    compute_next_review_at(rating, previous_ease_factor, previous_interval, &Local::now())
}

/// Same as [`compute_next_review`] with an explicit "now".
///
/// The rating is not range-checked. Values outside 0-5 still go through the formula
/// (6 raises EF by 0.16, -1 lowers it by 1.1) and the result is clamped at the floor.
pub fn compute_next_review_at<Tz: TimeZone>(
    rating: i32,
    previous_ease_factor: Option<f64>,
    previous_interval: Option<u32>,
    now: &DateTime<Tz>,
) -> ReviewSchedule {
    let first_review = ReviewState::default();
    let previous_ease_factor = previous_ease_factor.unwrap_or(first_review.ease_factor);
    let previous_interval = previous_interval.unwrap_or(first_review.interval);

    let interval = if rating < 3 {
        INITIAL_INTERVAL
    } else if previous_interval == 1 {
        GRADUATION_INTERVAL
    } else {
        scaled_interval(previous_interval, previous_ease_factor)
    };

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
    let q = f64::from(rating);
    let modifier = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    let ease_factor = (previous_ease_factor + modifier).max(MIN_EASE_FACTOR);

    ReviewSchedule {
        ease_factor,
        interval,
        next_review_date: add_calendar_days(now, interval),
    }
}

/// round(interval * EF), kept inside 1..=u32::MAX so the interval stays a positive day count
/// even for a previous interval of 0 or a degenerate EF.
fn scaled_interval(previous_interval: u32, previous_ease_factor: f64) -> u32 {
    let scaled = (f64::from(previous_interval) * previous_ease_factor).round();
    if scaled.is_nan() || scaled < 1.0 {
        1
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Adds whole days to the local date of `now`, keeping its time of day.
///
/// Falls back to 24h steps when the wall-clock time does not exist on the target date
/// (DST gap) and saturates at the latest representable instant.
fn add_calendar_days<Tz: TimeZone>(now: &DateTime<Tz>, days: u32) -> DateTime<Utc> {
    now.clone()
        .checked_add_days(Days::new(u64::from(days)))
        .or_else(|| {
            now.clone()
                .checked_add_signed(Duration::days(i64::from(days)))
        })
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
