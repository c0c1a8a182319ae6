// src/scoring/totals.rs

use serde::Serialize;

use super::{
    breakdown::{ExamBreakdown, RawSubjects},
    error::{ConfigurationError, ScoringError},
    quota::{AytField, ExamKind, ExamType},
};

/// Share of a correct answer that one wrong answer cancels.
pub const WRONG_PENALTY: f64 = 0.25;

/// Figures derived from an exam's raw counts. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExamTotals {
    pub total_correct: u32,
    pub total_wrong: u32,
    pub total_questions: u32,
    pub blank: u32,
    /// Percentage of correct answers, 0-100.
    pub score: u32,
    /// `total_correct - total_wrong / 4`, unrounded.
    pub net: f64,
}

impl ExamTotals {
    /// Builds totals from summed counts. `total_questions` always comes from the quota table.
    pub fn tally(kind: ExamKind, total_correct: u32, total_wrong: u32) -> Result<Self, ScoringError> {
        let total_questions = kind.total_questions();
        if total_questions == 0 {
            return Err(ConfigurationError::EmptyQuota(kind).into());
        }

        Ok(Self {
            total_correct,
            total_wrong,
            total_questions,
            blank: total_questions.saturating_sub(total_correct.saturating_add(total_wrong)),
            score: percentage(total_correct, total_questions).min(100),
            net: net(total_correct, total_wrong),
        })
    }
}

impl ExamBreakdown {
    pub fn totals(&self) -> Result<ExamTotals, ScoringError> {
        let (correct, wrong) = self
            .subjects()
            .iter()
            .fold((0u32, 0u32), |(c, w), line| {
                (c.saturating_add(line.correct), w.saturating_add(line.wrong))
            });
        ExamTotals::tally(self.kind(), correct, wrong)
    }
}

/// Computes the derived figures for a raw (examType, field, breakdown) triple.
///
/// The breakdown is validated against the quota table first; a missing or
/// unknown subject fails instead of counting as zero.
pub fn compute_totals(
    exam_type: ExamType,
    field: Option<AytField>,
    subjects: &RawSubjects,
) -> Result<ExamTotals, ScoringError> {
    let kind = ExamKind::new(exam_type, field)?;
    ExamBreakdown::parse(kind, subjects)?.totals()
}

pub fn net(correct: u32, wrong: u32) -> f64 {
    f64::from(correct) - f64::from(wrong) * WRONG_PENALTY
}

/// `round(part / whole * 100)` with halves rounding up, in integer arithmetic.
/// Returns 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    u32::try_from((part * 200 + whole) / (whole * 2)).unwrap_or(u32::MAX)
}
