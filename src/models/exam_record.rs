// src/models/exam_record.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::scoring::{
    AytField, ExamBreakdown, ExamKind, ExamRecord, ExamSubjects, ExamTotals, ExamType, FlatTotals,
    RawSubjects, ScoringError, SubjectLine, ValidationError,
};

/// Represents the 'exam_records' table in the database.
/// Holds raw answer counts only.
#[derive(Debug, Clone, FromRow)]
pub struct ExamRow {
    pub id: i64,
    pub student_id: String,
    pub exam_type: String,
    pub field: Option<String>,
    pub exam_date: NaiveDate,
    /// Subject key -> counts. NULL for legacy imports.
    pub subjects: Option<Json<RawSubjects>>,
    pub legacy_correct: Option<i64>,
    pub legacy_wrong: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ExamRow> for ExamRecord {
    type Error = ScoringError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let kind = ExamKind::parse(&row.exam_type, row.field.as_deref())?;

        let subjects = match (row.subjects, row.legacy_correct, row.legacy_wrong) {
            (Some(Json(raw)), _, _) => ExamSubjects::Detailed(ExamBreakdown::parse(kind, &raw)?),
            (None, Some(correct), Some(wrong)) => ExamSubjects::Legacy {
                kind,
                totals: FlatTotals {
                    total_correct: to_count(correct),
                    total_wrong: to_count(wrong),
                },
            },
            _ => return Err(ValidationError::EmptyRecord.into()),
        };

        Ok(ExamRecord {
            id: row.id,
            student_id: row.student_id,
            date: row.exam_date,
            created_at: row.created_at,
            subjects,
        })
    }
}

fn to_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// DTO for returning an exam with its recomputed figures.
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    pub id: i64,
    pub student_id: String,
    pub exam_type: ExamType,
    pub field: Option<AytField>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    /// True when the record only has flat totals.
    pub legacy: bool,
    pub subjects: Vec<SubjectLine>,
    pub totals: ExamTotals,
}

impl ExamResponse {
    pub fn from_record(record: &ExamRecord) -> Result<Self, ScoringError> {
        let kind = record.kind();
        Ok(Self {
            id: record.id,
            student_id: record.student_id.clone(),
            exam_type: kind.exam_type(),
            field: kind.field(),
            date: record.date,
            created_at: record.created_at,
            legacy: record.is_legacy(),
            subjects: record.subject_lines(),
            totals: record.totals()?,
        })
    }
}

/// DTO for submitting a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 8))]
    pub exam_type: String,
    #[validate(length(max = 8))]
    pub field: Option<String>,
    pub date: NaiveDate,
    #[validate(custom(function = validate_subject_counts))]
    pub subjects: RawSubjects,
}

/// DTO for previewing totals without storing anything.
#[derive(Debug, Deserialize, Validate)]
pub struct ComputeTotalsRequest {
    #[validate(length(min = 1, max = 8))]
    pub exam_type: String,
    #[validate(length(max = 8))]
    pub field: Option<String>,
    #[validate(custom(function = validate_subject_counts))]
    pub subjects: RawSubjects,
}

/// DTO for importing a record that only kept whole-exam counts.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportLegacyExamRequest {
    #[validate(length(min = 1, max = 8))]
    pub exam_type: String,
    #[validate(length(max = 8))]
    pub field: Option<String>,
    pub date: NaiveDate,
    #[validate(range(max = 120))]
    pub total_correct: u32,
    #[validate(range(max = 120))]
    pub total_wrong: u32,
}

/// Query parameters for listing a student's exams.
#[derive(Debug, Deserialize)]
pub struct ExamListParams {
    pub exam_type: Option<String>,
    pub limit: Option<i64>,
}

/// No exam has more than 80 questions in one subject.
const MAX_SUBJECT_COUNT: u32 = 80;

fn validate_subject_counts(subjects: &RawSubjects) -> Result<(), validator::ValidationError> {
    if subjects.is_empty() {
        return Err(validator::ValidationError::new("subjects_cannot_be_empty"));
    }
    if subjects.len() > 16 {
        return Err(validator::ValidationError::new("too_many_subjects"));
    }
    for score in subjects.values() {
        if score.correct > MAX_SUBJECT_COUNT || score.wrong > MAX_SUBJECT_COUNT {
            return Err(validator::ValidationError::new("subject_count_out_of_range"));
        }
    }
    Ok(())
}
