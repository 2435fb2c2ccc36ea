pub mod flashcard;
pub mod generation;
pub mod query;
pub mod review_data;
pub mod sm2;
pub mod study_session;

pub use flashcard::{Flashcard, FlashcardSource, FlashcardWithReview};
pub use generation::{
    FlashcardSuggestion, GenerateFlashcardsResponse, GenerationErrorLog, GenerationSession,
    GenerationStatistics, ReviewSuggestionsCommand, SuggestionAction, SuggestionReview,
    SuggestionReviewCounts,
};
pub use query::{
    DueFlashcardsParams, FlashcardListParams, GenerationErrorListParams, Page, Pagination,
    SortField, SortOrder,
};
pub use review_data::{ReviewRecord, ReviewState, ReviewStateLookup};
pub use sm2::ReviewSchedule;
pub use study_session::StudySession;
