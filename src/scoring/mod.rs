//! Exam score aggregation for TYT and AYT attempts.
//!
//! Everything in here is pure: records go in, derived figures come out.
//! Persistence and HTTP live in the handlers.

pub mod aggregate;
pub mod analysis;
pub mod breakdown;
pub mod error;
pub mod quota;
pub mod record;
pub mod totals;

pub use aggregate::{
    Aggregation, ExamSummary, GroupBy, SubjectAverage, TrendPoint, aggregate_across_exams,
    summarize,
};
pub use analysis::{
    ExamAnalysis, ReviewItem, ReviewTarget, SubjectGap, compute_analysis_completion,
    derive_subject_analysis,
};
pub use breakdown::{ExamBreakdown, RawSubjects, SubjectLine, SubjectScore};
pub use error::{ConfigurationError, ScoringError, ValidationError};
pub use quota::{AytField, ExamKind, ExamType, QUOTA_TABLE_VERSION, Subject};
pub use record::{ExamRecord, ExamSubjects, FlatTotals};
pub use totals::{ExamTotals, compute_totals};
