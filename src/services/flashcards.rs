//! Manual flashcard management: create, edit, delete, list.
use super::RequestContext;
use crate::database::db::{self, NewFlashcard};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Flashcard, FlashcardListParams, FlashcardSource, Page};
use crate::validation;

pub fn create_flashcard(ctx: &RequestContext<'_>, front: &str, back: &str) -> ServiceResult<Flashcard> {
    validation::validate_front(front)?;
    validation::validate_back(back)?;

    let card = db::insert_flashcard(
        &NewFlashcard {
            user_id: ctx.user_id,
            front,
            back,
            source: FlashcardSource::Manual,
            generation_id: None,
        },
        ctx.conn,
    )?;

    tracing::info!(flashcard_id = card.id, "flashcard created");
    Ok(card)
}

/// Looks up the owner and maps "missing" and "someone else's" to their error kinds.
fn ensure_owned(ctx: &RequestContext<'_>, flashcard_id: i64, action: &str) -> ServiceResult<()> {
    match db::get_flashcard_owner(flashcard_id, ctx.conn)? {
        None => Err(ServiceError::NotFound(format!(
            "Flashcard with id {} not found",
            flashcard_id
        ))),
        Some(owner) if owner != ctx.user_id => {
            tracing::warn!(flashcard_id, action, "flashcard access denied");
            Err(ServiceError::Unauthorized(format!(
                "You do not have permission to {} flashcard {}",
                action, flashcard_id
            )))
        }
        Some(_) => Ok(()),
    }
}

/// Changes the given sides. Absent or empty sides stay as they are.
pub fn update_flashcard(
    ctx: &RequestContext<'_>,
    flashcard_id: i64,
    front: Option<&str>,
    back: Option<&str>,
) -> ServiceResult<Flashcard> {
    validation::validate_id(flashcard_id, "Flashcard")?;
    let front = front.filter(|s| !s.is_empty());
    let back = back.filter(|s| !s.is_empty());
    if let Some(front) = front {
        validation::validate_front(front)?;
    }
    if let Some(back) = back {
        validation::validate_back(back)?;
    }

    ensure_owned(ctx, flashcard_id, "update")?;

    let card = db::update_flashcard(flashcard_id, front, back, ctx.conn)?.ok_or_else(|| {
        ServiceError::NotFound(format!("Flashcard with id {} not found", flashcard_id))
    })?;

    tracing::info!(flashcard_id, "flashcard updated");
    Ok(card)
}

pub fn delete_flashcard(ctx: &RequestContext<'_>, flashcard_id: i64) -> ServiceResult<()> {
    validation::validate_id(flashcard_id, "Flashcard")?;
    ensure_owned(ctx, flashcard_id, "delete")?;

    if !db::delete_flashcard(flashcard_id, ctx.user_id, ctx.conn)? {
        return Err(ServiceError::NotFound(format!(
            "Flashcard with id {} not found",
            flashcard_id
        )));
    }

    tracing::info!(flashcard_id, "flashcard deleted");
    Ok(())
}

pub fn list_flashcards(
    ctx: &RequestContext<'_>,
    params: &FlashcardListParams,
) -> ServiceResult<Page<Flashcard>> {
    validation::validate_pagination(&params.pagination)?;
    let page = db::list_flashcards(ctx.user_id, params, ctx.conn)?;
    tracing::debug!(total = page.total, page = page.page, "flashcards listed");
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::init_in_memory_database;
    use crate::models::Pagination;

    #[test]
    fn test_create_flashcard() {
        let conn = init_in_memory_database().unwrap();
        let ctx = RequestContext::new(&conn, "user-a");

        let card = create_flashcard(&ctx, "What is Rust?", "A systems language").unwrap();
        assert_eq!(card.source, FlashcardSource::Manual);
        assert_eq!(card.generation_id, None);

        let err = create_flashcard(&ctx, "", "back").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = create_flashcard(&ctx, "front", &"b".repeat(501)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_update_flashcard() {
        let conn = init_in_memory_database().unwrap();
        let ctx = RequestContext::new(&conn, "user-a");
        let card = create_flashcard(&ctx, "front", "back").unwrap();

        let updated = update_flashcard(&ctx, card.id, Some("new front"), Some("")).unwrap();
        assert_eq!(updated.front, "new front");
        assert_eq!(updated.back, "back");
        assert!(updated.updated_at >= card.updated_at);
    }

    #[test]
    fn test_update_missing_or_foreign_flashcard() {
        let conn = init_in_memory_database().unwrap();
        let owner = RequestContext::new(&conn, "user-a");
        let other = RequestContext::new(&conn, "user-b");
        let card = create_flashcard(&owner, "front", "back").unwrap();

        let err = update_flashcard(&owner, card.id + 10, Some("x"), None).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = update_flashcard(&other, card.id, Some("x"), None).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_delete_flashcard() {
        let conn = init_in_memory_database().unwrap();
        let owner = RequestContext::new(&conn, "user-a");
        let other = RequestContext::new(&conn, "user-b");
        let card = create_flashcard(&owner, "front", "back").unwrap();

        assert!(matches!(
            delete_flashcard(&other, card.id).unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
        delete_flashcard(&owner, card.id).unwrap();
        assert!(matches!(
            delete_flashcard(&owner, card.id).unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_validates_pagination() {
        let conn = init_in_memory_database().unwrap();
        let ctx = RequestContext::new(&conn, "user-a");

        let params = FlashcardListParams {
            pagination: Pagination { page: 1, per_page: 500 },
            ..FlashcardListParams::default()
        };
        assert!(matches!(
            list_flashcards(&ctx, &params).unwrap_err(),
            ServiceError::Validation(_)
        ));

        create_flashcard(&ctx, "front", "back").unwrap();
        let page = list_flashcards(&ctx, &FlashcardListParams::default()).unwrap();
        assert_eq!(page.total, 1);
    }
}
