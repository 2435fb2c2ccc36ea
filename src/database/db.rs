//! Database operations for the flashcard application
//!
//! Handles SQLite database initialization, CRUD operations for flashcards,
//! review records for the SM-2 scheduler, and generation session bookkeeping.

use crate::models::{
    DueFlashcardsParams, Flashcard, FlashcardListParams, FlashcardSource, FlashcardWithReview,
    GenerationErrorListParams, GenerationErrorLog, GenerationSession, GenerationStatistics, Page,
    Pagination, ReviewRecord, ReviewSchedule, ReviewState, ReviewStateLookup,
    SuggestionReviewCounts,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Result, Row, params, params_from_iter};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS generation_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    model TEXT NOT NULL,
    source_text_hash TEXT NOT NULL,
    source_text_length INTEGER NOT NULL,
    generated_count INTEGER NOT NULL DEFAULT 0,
    accepted_unedited_count INTEGER NOT NULL DEFAULT 0,
    accepted_edited_count INTEGER NOT NULL DEFAULT 0,
    rejected_count INTEGER NOT NULL DEFAULT 0,
    generation_time INTEGER,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS flashcards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    source TEXT NOT NULL CHECK (source IN ('ai-full', 'ai-edited', 'manual')),
    generation_id INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (generation_id) REFERENCES generation_sessions(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS flashcard_reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    flashcard_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5),
    ease_factor REAL NOT NULL,
    interval_days INTEGER NOT NULL,
    next_review_date INTEGER NOT NULL,
    review_count INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_flashcards_user ON flashcards(user_id);
CREATE INDEX IF NOT EXISTS idx_reviews_flashcard ON flashcard_reviews(flashcard_id, created_at);

CREATE TABLE IF NOT EXISTS generation_error_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    model TEXT NOT NULL,
    source_text_hash TEXT NOT NULL,
    source_text_length INTEGER NOT NULL,
    error_code TEXT NOT NULL,
    error_message TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
";

const FLASHCARD_COLUMNS: &str = "id, front, back, source, generation_id, created_at, updated_at";
const REVIEW_COLUMNS: &str =
    "id, flashcard_id, rating, ease_factor, interval_days, next_review_date, review_count, created_at";
const SESSION_COLUMNS: &str = "id, model, source_text_hash, source_text_length, generated_count,
    accepted_unedited_count, accepted_edited_count, rejected_count, generation_time, created_at";

/// Opens (or creates) the SQLite database at `path` and makes sure all tables exist.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    prepare_connection(&conn)?;
    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Same schema as [`init_database`], kept in memory.
pub fn init_in_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare_connection(&conn)?;
    Ok(conn)
}

fn prepare_connection(conn: &Connection) -> Result<()> {
    // Needed for review cascade on flashcard delete
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn to_timestamp(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

pub fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn flashcard_from_row(row: &Row<'_>) -> Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        front: row.get(1)?,
        back: row.get(2)?,
        source: row.get(3)?,
        generation_id: row.get(4)?,
        created_at: from_timestamp(row.get(5)?),
        updated_at: from_timestamp(row.get(6)?),
    })
}

/// Reads review columns starting at `offset`, in `REVIEW_COLUMNS` order.
fn review_from_row(row: &Row<'_>, offset: usize) -> Result<ReviewRecord> {
    Ok(ReviewRecord {
        id: row.get(offset)?,
        flashcard_id: row.get(offset + 1)?,
        rating: row.get(offset + 2)?,
        ease_factor: row.get(offset + 3)?,
        interval: row.get(offset + 4)?,
        next_review_date: from_timestamp(row.get(offset + 5)?),
        review_count: row.get(offset + 6)?,
        created_at: from_timestamp(row.get(offset + 7)?),
    })
}

fn session_from_row(row: &Row<'_>) -> Result<GenerationSession> {
    Ok(GenerationSession {
        id: row.get(0)?,
        model: row.get(1)?,
        source_text_hash: row.get(2)?,
        source_text_length: row.get(3)?,
        generated_count: row.get(4)?,
        accepted_unedited_count: row.get(5)?,
        accepted_edited_count: row.get(6)?,
        rejected_count: row.get(7)?,
        generation_time: row.get::<_, Option<i64>>(8)?.map(from_timestamp),
        created_at: from_timestamp(row.get(9)?),
    })
}

fn page_args(args: &mut Vec<Value>, pagination: &Pagination) {
    args.push(Value::Integer(i64::from(pagination.per_page)));
    args.push(Value::Integer(pagination.offset()));
}

pub struct NewFlashcard<'a> {
    pub user_id: &'a str,
    pub front: &'a str,
    pub back: &'a str,
    pub source: FlashcardSource,
    pub generation_id: Option<i64>,
}

/// Inserts a flashcard and returns it as stored.
pub fn insert_flashcard(card: &NewFlashcard<'_>, conn: &Connection) -> Result<Flashcard> {
    let now = to_timestamp(Utc::now());
    conn.execute(
        "INSERT INTO flashcards (user_id, front, back, source, generation_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            card.user_id,
            card.front,
            card.back,
            card.source,
            card.generation_id,
            now
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_flashcard(id, conn)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get_flashcard(id: i64, conn: &Connection) -> Result<Option<Flashcard>> {
    conn.query_row(
        &format!("SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE id = ?1"),
        params![id],
        flashcard_from_row,
    )
    .optional()
}

/// Owner of a flashcard, or `None` if it does not exist.
pub fn get_flashcard_owner(id: i64, conn: &Connection) -> Result<Option<String>> {
    conn.query_row(
        "SELECT user_id FROM flashcards WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

/// Replaces the sides that are given and bumps `updated_at`.
pub fn update_flashcard(
    id: i64,
    front: Option<&str>,
    back: Option<&str>,
    conn: &Connection,
) -> Result<Option<Flashcard>> {
    let changed = conn.execute(
        "UPDATE flashcards
         SET front = COALESCE(?1, front), back = COALESCE(?2, back), updated_at = ?3
         WHERE id = ?4",
        params![front, back, to_timestamp(Utc::now()), id],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_flashcard(id, conn)
}

/// Deletes a flashcard owned by `user_id`. Its reviews go with it.
pub fn delete_flashcard(id: i64, user_id: &str, conn: &Connection) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM flashcards WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(deleted > 0)
}

pub fn list_flashcards(
    user_id: &str,
    list: &FlashcardListParams,
    conn: &Connection,
) -> Result<Page<Flashcard>> {
    let mut filter = String::from("user_id = ?");
    let mut args = vec![Value::Text(user_id.to_string())];
    if let Some(source) = list.source {
        filter.push_str(" AND source = ?");
        args.push(Value::Text(source.as_str().to_string()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM flashcards WHERE {filter}"),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let order = list.order.keyword();
    let sql = format!(
        "SELECT {FLASHCARD_COLUMNS} FROM flashcards WHERE {filter}
         ORDER BY {} {order}, id {order} LIMIT ? OFFSET ?",
        list.sort.column()
    );
    page_args(&mut args, &list.pagination);

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(args.iter()), flashcard_from_row)?
        .collect::<Result<Vec<_>>>()?;

    Ok(Page {
        items,
        total: total as u64,
        page: list.pagination.page,
        per_page: list.pagination.per_page,
    })
}

/// Newest review of a flashcard. Ties on `created_at` go to the later insert.
pub fn latest_review(flashcard_id: i64, conn: &Connection) -> Result<Option<ReviewRecord>> {
    conn.query_row(
        &format!(
            "SELECT {REVIEW_COLUMNS} FROM flashcard_reviews
             WHERE flashcard_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        ),
        params![flashcard_id],
        |row| review_from_row(row, 0),
    )
    .optional()
}

impl ReviewStateLookup for Connection {
    fn latest_review_state(&self, flashcard_id: i64) -> Result<Option<ReviewState>> {
        Ok(latest_review(flashcard_id, self)?.map(|review| review.state()))
    }
}

pub struct NewReview<'a> {
    pub flashcard_id: i64,
    pub user_id: &'a str,
    pub rating: i32,
    pub schedule: &'a ReviewSchedule,
    pub review_count: u32,
}

/// Stores a review; it becomes the flashcard's latest scheduling state.
pub fn insert_review(review: &NewReview<'_>, conn: &Connection) -> Result<ReviewRecord> {
    conn.execute(
        "INSERT INTO flashcard_reviews
            (flashcard_id, user_id, rating, ease_factor, interval_days, next_review_date, review_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            review.flashcard_id,
            review.user_id,
            review.rating,
            review.schedule.ease_factor,
            review.schedule.interval,
            to_timestamp(review.schedule.next_review_date),
            review.review_count,
            to_timestamp(Utc::now()),
        ],
    )?;

    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM flashcard_reviews WHERE id = ?1"),
        params![id],
        |row| review_from_row(row, 0),
    )
}

const DUE_FROM: &str = "
    FROM flashcards f
    LEFT JOIN flashcard_reviews r ON r.id = (
        SELECT id FROM flashcard_reviews
        WHERE flashcard_id = f.id
        ORDER BY created_at DESC, id DESC
        LIMIT 1
    )
    WHERE f.user_id = ?1 AND (r.id IS NULL OR r.next_review_date <= ?2)";

/// Flashcards that were never reviewed or whose latest review is due by `params.before`.
///
/// Oldest due first; never-reviewed cards are ordered by creation time.
pub fn get_flashcards_due_for_review(
    user_id: &str,
    due: &DueFlashcardsParams,
    conn: &Connection,
) -> Result<Page<FlashcardWithReview>> {
    let before = to_timestamp(due.before.unwrap_or_else(Utc::now));

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) {DUE_FROM}"),
        params![user_id, before],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT f.id, f.front, f.back, f.source, f.generation_id, f.created_at, f.updated_at,
                r.id, r.flashcard_id, r.rating, r.ease_factor, r.interval_days,
                r.next_review_date, r.review_count, r.created_at
         {DUE_FROM}
         ORDER BY COALESCE(r.next_review_date, f.created_at) ASC, f.id ASC
         LIMIT ?3 OFFSET ?4"
    ))?;

    let items = stmt
        .query_map(
            params![
                user_id,
                before,
                i64::from(due.pagination.per_page),
                due.pagination.offset()
            ],
            |row| {
                let review_id: Option<i64> = row.get(7)?;
                Ok(FlashcardWithReview {
                    flashcard: flashcard_from_row(row)?,
                    latest_review: match review_id {
                        Some(_) => Some(review_from_row(row, 7)?),
                        None => None,
                    },
                })
            },
        )?
        .collect::<Result<Vec<_>>>()?;

    Ok(Page {
        items,
        total: total as u64,
        page: due.pagination.page,
        per_page: due.pagination.per_page,
    })
}

/// Starts a generation session and returns its id.
pub fn create_generation_session(
    user_id: &str,
    model: &str,
    source_text_hash: &str,
    source_text_length: u32,
    conn: &Connection,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO generation_sessions (user_id, model, source_text_hash, source_text_length, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            model,
            source_text_hash,
            source_text_length,
            to_timestamp(Utc::now())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_generation_result(
    session_id: i64,
    generated_count: u32,
    generation_time: DateTime<Utc>,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "UPDATE generation_sessions SET generated_count = ?1, generation_time = ?2 WHERE id = ?3",
        params![generated_count, to_timestamp(generation_time), session_id],
    )?;
    Ok(())
}

/// Session `id` if it belongs to `user_id`.
pub fn get_generation_session(
    id: i64,
    user_id: &str,
    conn: &Connection,
) -> Result<Option<GenerationSession>> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM generation_sessions WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        session_from_row,
    )
    .optional()
}

/// Overwrites the verdict counts of a session.
pub fn set_session_review_counts(
    session_id: i64,
    counts: &SuggestionReviewCounts,
    conn: &Connection,
) -> Result<()> {
    conn.execute(
        "UPDATE generation_sessions
         SET accepted_unedited_count = ?1, accepted_edited_count = ?2, rejected_count = ?3
         WHERE id = ?4",
        params![counts.accepted, counts.edited, counts.rejected, session_id],
    )?;
    Ok(())
}

pub fn get_generation_statistics(user_id: &str, conn: &Connection) -> Result<GenerationStatistics> {
    conn.query_row(
        "SELECT COALESCE(SUM(generated_count), 0),
                COALESCE(SUM(accepted_unedited_count), 0),
                COALESCE(SUM(accepted_edited_count), 0),
                COALESCE(SUM(rejected_count), 0)
         FROM generation_sessions WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(GenerationStatistics {
                total_generated: row.get::<_, i64>(0)? as u64,
                accepted_unedited: row.get::<_, i64>(1)? as u64,
                accepted_edited: row.get::<_, i64>(2)? as u64,
                rejected: row.get::<_, i64>(3)? as u64,
            })
        },
    )
}

pub struct NewGenerationError<'a> {
    pub user_id: &'a str,
    pub model: &'a str,
    pub source_text_hash: &'a str,
    pub source_text_length: u32,
    pub error_code: &'a str,
    pub error_message: &'a str,
}

pub fn insert_generation_error(entry: &NewGenerationError<'_>, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT INTO generation_error_logs
            (user_id, model, source_text_hash, source_text_length, error_code, error_message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.user_id,
            entry.model,
            entry.source_text_hash,
            entry.source_text_length,
            entry.error_code,
            entry.error_message,
            to_timestamp(Utc::now())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Error log entries of a user, newest first, optionally filtered by time range and code.
pub fn list_generation_errors(
    user_id: &str,
    list: &GenerationErrorListParams,
    conn: &Connection,
) -> Result<Page<GenerationErrorLog>> {
    let mut filter = String::from("user_id = ?");
    let mut args = vec![Value::Text(user_id.to_string())];
    if let Some(start) = list.start {
        filter.push_str(" AND created_at >= ?");
        args.push(Value::Integer(to_timestamp(start)));
    }
    if let Some(end) = list.end {
        filter.push_str(" AND created_at <= ?");
        args.push(Value::Integer(to_timestamp(end)));
    }
    if let Some(code) = &list.error_code {
        filter.push_str(" AND error_code = ?");
        args.push(Value::Text(code.clone()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM generation_error_logs WHERE {filter}"),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT id, model, source_text_hash, source_text_length, error_code, error_message, created_at
         FROM generation_error_logs WHERE {filter}
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    page_args(&mut args, &list.pagination);

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            Ok(GenerationErrorLog {
                id: row.get(0)?,
                model: row.get(1)?,
                source_text_hash: row.get(2)?,
                source_text_length: row.get(3)?,
                error_code: row.get(4)?,
                error_message: row.get(5)?,
                created_at: from_timestamp(row.get(6)?),
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(Page {
        items,
        total: total as u64,
        page: list.pagination.page,
        per_page: list.pagination.per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sm2::compute_next_review_at;
    use crate::models::{SortField, SortOrder};
    use chrono::Duration;

    const USER: &str = "user-a";

    fn manual<'a>(front: &'a str, back: &'a str) -> NewFlashcard<'a> {
        NewFlashcard {
            user_id: USER,
            front,
            back,
            source: FlashcardSource::Manual,
            generation_id: None,
        }
    }

    fn review_at(
        flashcard_id: i64,
        rating: i32,
        now: DateTime<Utc>,
        conn: &Connection,
    ) -> ReviewRecord {
        let previous = latest_review(flashcard_id, conn).unwrap();
        let schedule = compute_next_review_at(
            rating,
            previous.as_ref().map(|r| r.ease_factor),
            previous.as_ref().map(|r| r.interval),
            &now,
        );
        insert_review(
            &NewReview {
                flashcard_id,
                user_id: USER,
                rating,
                schedule: &schedule,
                review_count: previous.map_or(1, |r| r.review_count + 1),
            },
            conn,
        )
        .unwrap()
    }

    #[test]
    fn test_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.sqlite3");

        {
            let conn = init_database(&path).unwrap();
            insert_flashcard(&manual("hello", "cześć"), &conn).unwrap();
        }

        assert!(path.exists());
        let conn = init_database(&path).unwrap();
        let page = list_flashcards(USER, &FlashcardListParams::default(), &conn).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].front, "hello");
    }

    #[test]
    fn test_insert_and_get_flashcard() {
        let conn = init_in_memory_database().unwrap();
        let card = insert_flashcard(&manual("hello", "cześć"), &conn).unwrap();

        assert_eq!(card.source, FlashcardSource::Manual);
        assert_eq!(card.created_at, card.updated_at);
        assert_eq!(get_flashcard(card.id, &conn).unwrap(), Some(card.clone()));
        assert_eq!(get_flashcard_owner(card.id, &conn).unwrap().as_deref(), Some(USER));
        assert_eq!(get_flashcard(card.id + 1, &conn).unwrap(), None);
    }

    #[test]
    fn test_update_flashcard_keeps_missing_sides() {
        let conn = init_in_memory_database().unwrap();
        let card = insert_flashcard(&manual("hello", "cześć"), &conn).unwrap();

        let updated = update_flashcard(card.id, None, Some("dzień dobry"), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(updated.front, "hello");
        assert_eq!(updated.back, "dzień dobry");

        assert_eq!(update_flashcard(999, Some("x"), None, &conn).unwrap(), None);
    }

    #[test]
    fn test_delete_cascades_reviews() {
        let conn = init_in_memory_database().unwrap();
        let card = insert_flashcard(&manual("hello", "cześć"), &conn).unwrap();
        review_at(card.id, 4, Utc::now(), &conn);

        assert!(!delete_flashcard(card.id, "someone-else", &conn).unwrap());
        assert!(delete_flashcard(card.id, USER, &conn).unwrap());

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM flashcard_reviews", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_list_flashcards_filters_and_pages() {
        let conn = init_in_memory_database().unwrap();
        for i in 0..5 {
            insert_flashcard(&manual(&format!("front {i}"), "back"), &conn).unwrap();
        }
        insert_flashcard(
            &NewFlashcard {
                source: FlashcardSource::AiFull,
                ..manual("generated", "back")
            },
            &conn,
        )
        .unwrap();
        insert_flashcard(
            &NewFlashcard {
                user_id: "user-b",
                ..manual("foreign", "back")
            },
            &conn,
        )
        .unwrap();

        let page = list_flashcards(
            USER,
            &FlashcardListParams {
                pagination: Pagination { page: 2, per_page: 2 },
                source: Some(FlashcardSource::Manual),
                sort: SortField::CreatedAt,
                order: SortOrder::Asc,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
        let fronts: Vec<_> = page.items.iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, vec!["front 2", "front 3"]);

        let all = list_flashcards(USER, &FlashcardListParams::default(), &conn).unwrap();
        assert_eq!(all.total, 6);
        assert_eq!(all.items[0].front, "generated");
    }

    #[test]
    fn test_latest_review_and_lookup() {
        let conn = init_in_memory_database().unwrap();
        let card = insert_flashcard(&manual("hello", "cześć"), &conn).unwrap();

        assert_eq!(conn.latest_review_state(card.id).unwrap(), None);

        let first = review_at(card.id, 5, Utc::now(), &conn);
        assert_eq!(first.interval, 6);
        assert_eq!(first.review_count, 1);

        // round(6 * 2.6)
        let second = review_at(card.id, 4, Utc::now(), &conn);
        assert_eq!(second.interval, 16);
        assert_eq!(second.review_count, 2);

        assert_eq!(
            conn.latest_review_state(card.id).unwrap(),
            Some(second.state())
        );
    }

    #[test]
    fn test_due_flashcards() {
        let conn = init_in_memory_database().unwrap();
        let never_reviewed = insert_flashcard(&manual("new", "card"), &conn).unwrap();
        let overdue = insert_flashcard(&manual("overdue", "card"), &conn).unwrap();
        let later = insert_flashcard(&manual("later", "card"), &conn).unwrap();

        review_at(overdue.id, 0, Utc::now() - Duration::days(5), &conn);
        review_at(later.id, 5, Utc::now(), &conn);

        let page = get_flashcards_due_for_review(USER, &DueFlashcardsParams::default(), &conn)
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.flashcard.id).collect();
        assert_eq!(page.total, 2);
        assert!(ids.contains(&never_reviewed.id));
        assert!(ids.contains(&overdue.id));

        let overdue_item = page
            .items
            .iter()
            .find(|c| c.flashcard.id == overdue.id)
            .unwrap();
        assert_eq!(overdue_item.latest_review.as_ref().unwrap().interval, 1);

        let in_a_week = DueFlashcardsParams {
            before: Some(Utc::now() + Duration::days(7)),
            ..DueFlashcardsParams::default()
        };
        let page = get_flashcards_due_for_review(USER, &in_a_week, &conn).unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_generation_sessions_and_statistics() {
        let conn = init_in_memory_database().unwrap();
        let first = create_generation_session(USER, "gpt4", "abc", 1200, &conn).unwrap();
        let second = create_generation_session(USER, "gpt4", "def", 3000, &conn).unwrap();
        create_generation_session("user-b", "gpt4", "ghi", 3000, &conn).unwrap();

        set_generation_result(first, 3, Utc::now(), &conn).unwrap();
        set_generation_result(second, 3, Utc::now(), &conn).unwrap();
        set_session_review_counts(
            first,
            &SuggestionReviewCounts {
                accepted: 1,
                edited: 1,
                rejected: 1,
            },
            &conn,
        )
        .unwrap();
        set_session_review_counts(
            second,
            &SuggestionReviewCounts {
                accepted: 2,
                edited: 0,
                rejected: 1,
            },
            &conn,
        )
        .unwrap();

        let session = get_generation_session(first, USER, &conn).unwrap().unwrap();
        assert_eq!(session.generated_count, 3);
        assert!(session.generation_time.is_some());
        assert!(get_generation_session(first, "user-b", &conn).unwrap().is_none());

        let stats = get_generation_statistics(USER, &conn).unwrap();
        assert_eq!(
            stats,
            GenerationStatistics {
                total_generated: 6,
                accepted_unedited: 3,
                accepted_edited: 1,
                rejected: 2,
            }
        );
        assert_eq!(
            get_generation_statistics("nobody", &conn).unwrap(),
            GenerationStatistics::default()
        );
    }

    #[test]
    fn test_generation_error_log_filters() {
        let conn = init_in_memory_database().unwrap();
        for code in ["GENERATION_ERROR", "DATABASE_ERROR", "GENERATION_ERROR"] {
            insert_generation_error(
                &NewGenerationError {
                    user_id: USER,
                    model: "gpt4",
                    source_text_hash: "abc",
                    source_text_length: 1500,
                    error_code: code,
                    error_message: "failed",
                },
                &conn,
            )
            .unwrap();
        }

        let all = list_generation_errors(USER, &GenerationErrorListParams::default(), &conn)
            .unwrap();
        assert_eq!(all.total, 3);
        assert!(all.items[0].id > all.items[1].id);

        let filtered = list_generation_errors(
            USER,
            &GenerationErrorListParams {
                error_code: Some("GENERATION_ERROR".to_string()),
                ..GenerationErrorListParams::default()
            },
            &conn,
        )
        .unwrap();
        assert_eq!(filtered.total, 2);

        let future = list_generation_errors(
            USER,
            &GenerationErrorListParams {
                start: Some(Utc::now() + Duration::days(1)),
                ..GenerationErrorListParams::default()
            },
            &conn,
        )
        .unwrap();
        assert_eq!(future.total, 0);
    }
}
