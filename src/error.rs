//! Error type shared by the service operations.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Unauthorized(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::Generation(_) => "GENERATION_ERROR",
            ServiceError::Database(_) => "DATABASE_ERROR",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors caused by the request rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::NotFound(_) | ServiceError::Unauthorized(_)
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ServiceError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(ServiceError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(ServiceError::Unauthorized("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(
            ServiceError::from(rusqlite::Error::QueryReturnedNoRows).code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(ServiceError::Validation("x".into()).is_client_error());
        assert!(!ServiceError::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_display() {
        let err = ServiceError::NotFound("flashcard 4".into());
        assert_eq!(err.to_string(), "Not found: flashcard 4");
    }
}
