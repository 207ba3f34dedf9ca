use sea_orm::DbErr;

/// Result type for gamification operations.
pub type GamificationResult<T> = Result<T, GamificationError>;

/// Failures of the gamification core.
///
/// Expected business outcomes (an exam the user is not yet eligible for, a
/// submission past its deadline, a badge already unlocked) are not errors;
/// they are reported through the outcome types of each operation.
#[derive(Debug, thiserror::Error)]
pub enum GamificationError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Profile not found: {0}")]
    ProfileNotFound(i64),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(i64),

    #[error("Technology not found: {0}")]
    TechnologyNotFound(i64),

    #[error("Exam attempt not found: {0}")]
    AttemptNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not generate a free certificate number after {0} tries")]
    CertificateNumberSpace(usize),
}

impl From<validator::ValidationErrors> for GamificationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GamificationError::InvalidInput(errors.to_string())
    }
}

/// Whether a store error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
