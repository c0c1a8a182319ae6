// src/scoring/record.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    breakdown::{ExamBreakdown, SubjectLine},
    error::ScoringError,
    quota::ExamKind,
    totals::ExamTotals,
};

/// Flat counts kept by records that predate per-subject entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTotals {
    pub total_correct: u32,
    pub total_wrong: u32,
}

/// What a record knows about its answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamSubjects {
    Detailed(ExamBreakdown),
    /// Degraded shape: only whole-exam counts survive.
    Legacy { kind: ExamKind, totals: FlatTotals },
}

/// One exam attempt by one student, holding raw counts only.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamRecord {
    pub id: i64,
    pub student_id: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub subjects: ExamSubjects,
}

impl ExamRecord {
    pub fn kind(&self) -> ExamKind {
        match &self.subjects {
            ExamSubjects::Detailed(breakdown) => breakdown.kind(),
            ExamSubjects::Legacy { kind, .. } => *kind,
        }
    }

    pub fn breakdown(&self) -> Option<&ExamBreakdown> {
        match &self.subjects {
            ExamSubjects::Detailed(breakdown) => Some(breakdown),
            ExamSubjects::Legacy { .. } => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self.subjects, ExamSubjects::Legacy { .. })
    }

    pub fn subject_lines(&self) -> Vec<SubjectLine> {
        self.breakdown().map(ExamBreakdown::subjects).unwrap_or_default()
    }

    /// Recomputes score, net and blank from the raw counts.
    pub fn totals(&self) -> Result<ExamTotals, ScoringError> {
        match &self.subjects {
            ExamSubjects::Detailed(breakdown) => breakdown.totals(),
            ExamSubjects::Legacy { kind, totals } => {
                ExamTotals::tally(*kind, totals.total_correct, totals.total_wrong)
            }
        }
    }
}
