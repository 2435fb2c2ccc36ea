//! Generation statistics and the generation error log.
use super::RequestContext;
use crate::database::db;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{GenerationErrorListParams, GenerationErrorLog, GenerationStatistics, Page};
use crate::validation;

pub fn generation_statistics(ctx: &RequestContext<'_>) -> ServiceResult<GenerationStatistics> {
    let stats = db::get_generation_statistics(ctx.user_id, ctx.conn)?;
    tracing::debug!(total_generated = stats.total_generated, "generation statistics computed");
    Ok(stats)
}

pub fn list_generation_errors(
    ctx: &RequestContext<'_>,
    params: &GenerationErrorListParams,
) -> ServiceResult<Page<GenerationErrorLog>> {
    validation::validate_pagination(&params.pagination)?;
    if let (Some(start), Some(end)) = (params.start, params.end) {
        if start > end {
            return Err(ServiceError::Validation(
                "Start date must not be after end date".to_string(),
            ));
        }
    }
    Ok(db::list_generation_errors(ctx.user_id, params, ctx.conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::init_in_memory_database;
    use crate::models::{ReviewSuggestionsCommand, SuggestionAction, SuggestionReview};
    use crate::services::generation::{MockSuggestionGenerator, generate_flashcards, review_suggestions};
    use chrono::{Duration, Utc};

    #[test]
    fn test_statistics_follow_reviews() {
        let conn = init_in_memory_database().unwrap();
        let ctx = RequestContext::new(&conn, "user-a");
        assert_eq!(generation_statistics(&ctx).unwrap(), GenerationStatistics::default());

        let text = "x".repeat(1500);
        let generated = generate_flashcards(&ctx, &MockSuggestionGenerator, "gpt4", &text).unwrap();
        review_suggestions(
            &ctx,
            &ReviewSuggestionsCommand {
                generation_id: generated.generation_id,
                reviews: vec![
                    SuggestionReview {
                        suggestion_id: 1,
                        action: SuggestionAction::Accept,
                        front: Some("Q".to_string()),
                        back: Some("A".to_string()),
                    },
                    SuggestionReview {
                        suggestion_id: 2,
                        action: SuggestionAction::Reject,
                        front: None,
                        back: None,
                    },
                ],
            },
        )
        .unwrap();

        let stats = generation_statistics(&ctx).unwrap();
        assert_eq!(stats.total_generated, 3);
        assert_eq!(stats.accepted_unedited, 1);
        assert_eq!(stats.accepted_edited, 0);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_error_list_rejects_inverted_range() {
        let conn = init_in_memory_database().unwrap();
        let ctx = RequestContext::new(&conn, "user-a");

        let params = GenerationErrorListParams {
            start: Some(Utc::now()),
            end: Some(Utc::now() - Duration::days(1)),
            ..GenerationErrorListParams::default()
        };
        assert!(matches!(
            list_generation_errors(&ctx, &params).unwrap_err(),
            ServiceError::Validation(_)
        ));

        let page = list_generation_errors(&ctx, &GenerationErrorListParams::default()).unwrap();
        assert_eq!(page.total, 0);
    }
}
