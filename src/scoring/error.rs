// src/scoring/error.rs

use thiserror::Error;

use super::{
    analysis::ReviewTarget,
    quota::{AytField, ExamKind, Subject},
};

/// Failure of a scoring operation. Both families are local and final;
/// nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// Input does not match the quota table for its exam kind.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The (examType, field) pair is not in the quota table.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),

    #[error("subject '{subject}' is not part of {kind}")]
    UnexpectedSubject { subject: Subject, kind: ExamKind },

    #[error("subject '{0}' appears more than once")]
    DuplicateSubject(Subject),

    #[error("subject '{subject}' is required for {kind}")]
    MissingSubject { subject: Subject, kind: ExamKind },

    #[error("exam record has neither a subject breakdown nor flat totals")]
    EmptyRecord,

    #[error("'{0}' has nothing to review in this exam")]
    UnknownReviewTarget(String),

    #[error("'{target}' was solved with a teacher {count} times but only has {max} reviewable questions")]
    TeacherCountTooLarge {
        target: ReviewTarget,
        count: u32,
        max: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown exam type '{0}'")]
    UnknownExamType(String),

    #[error("unknown AYT field '{0}'")]
    UnknownField(String),

    #[error("TYT exams do not take a field (got {0})")]
    FieldNotAllowed(AytField),

    #[error("AYT exams require a field")]
    FieldRequired,

    #[error("quota table has no questions for {0}")]
    EmptyQuota(ExamKind),
}
