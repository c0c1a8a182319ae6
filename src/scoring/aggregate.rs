// src/scoring/aggregate.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{
    error::ScoringError,
    quota::{AytField, ExamType, Subject},
    record::ExamRecord,
    totals::net,
};

/// How [`aggregate_across_exams`] slices the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// Per-subject sums and averages over the exams of one type.
    Subject(ExamType),
    /// One point per exam, oldest first. `None` keeps every exam type.
    Chronological(Option<ExamType>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "group_by", content = "rows", rename_all = "snake_case")]
pub enum Aggregation {
    Subject(Vec<SubjectAverage>),
    Chronological(Vec<TrendPoint>),
}

/// Averages are taken over the exams that attempted the subject, not over every exam.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject: Subject,
    pub label: &'static str,
    pub exam_count: u32,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub average_correct: f64,
    pub average_wrong: f64,
    pub average_net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub exam_id: i64,
    pub date: NaiveDate,
    pub exam_type: ExamType,
    pub field: Option<AytField>,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub blank: u32,
    pub score: u32,
    pub net: f64,
}

/// Whole-history numbers for one exam type, used by the overview cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamSummary {
    pub exam_type: ExamType,
    pub exam_count: u32,
    pub average_net: f64,
    pub best_net: f64,
    pub latest_net: f64,
    pub average_score: f64,
}

pub fn aggregate_across_exams(
    records: &[ExamRecord],
    group_by: GroupBy,
) -> Result<Aggregation, ScoringError> {
    Ok(match group_by {
        GroupBy::Subject(exam_type) => Aggregation::Subject(subject_averages(records, exam_type)),
        GroupBy::Chronological(exam_type) => Aggregation::Chronological(trend(records, exam_type)?),
    })
}

/// Every exam whose kind carries a subject counts toward its average, blank or not.
/// Subjects nobody attempted in any exam are omitted rather than reported as zero.
/// Legacy records carry no per-subject data and are skipped.
pub fn subject_averages(records: &[ExamRecord], exam_type: ExamType) -> Vec<SubjectAverage> {
    // (exams, correct, wrong)
    let mut sums: BTreeMap<Subject, (u32, u32, u32)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.kind().exam_type() == exam_type) {
        for line in record.subject_lines() {
            let entry = sums.entry(line.subject).or_default();
            entry.0 = entry.0.saturating_add(1);
            entry.1 = entry.1.saturating_add(line.correct);
            entry.2 = entry.2.saturating_add(line.wrong);
        }
    }
    sums.retain(|_, (_, correct, wrong)| *correct > 0 || *wrong > 0);

    sums.into_iter()
        .map(|(subject, (exams, correct, wrong))| {
            let count = f64::from(exams);
            SubjectAverage {
                subject,
                label: subject.label(),
                exam_count: exams,
                total_correct: correct,
                total_wrong: wrong,
                average_correct: f64::from(correct) / count,
                average_wrong: f64::from(wrong) / count,
                average_net: net(correct, wrong) / count,
            }
        })
        .collect()
}

/// Ordered by exam date, then creation time, then id.
pub fn trend(
    records: &[ExamRecord],
    exam_type: Option<ExamType>,
) -> Result<Vec<TrendPoint>, ScoringError> {
    let mut selected: Vec<&ExamRecord> = records
        .iter()
        .filter(|r| exam_type.is_none_or(|t| r.kind().exam_type() == t))
        .collect();
    selected.sort_by_key(|r| (r.date, r.created_at, r.id));

    selected
        .into_iter()
        .map(|record| {
            let totals = record.totals()?;
            let kind = record.kind();
            Ok(TrendPoint {
                exam_id: record.id,
                date: record.date,
                exam_type: kind.exam_type(),
                field: kind.field(),
                total_correct: totals.total_correct,
                total_wrong: totals.total_wrong,
                blank: totals.blank,
                score: totals.score,
                net: totals.net,
            })
        })
        .collect()
}

/// One summary per exam type that has at least one record, TYT first.
pub fn summarize(records: &[ExamRecord]) -> Result<Vec<ExamSummary>, ScoringError> {
    let mut by_type: BTreeMap<ExamType, Vec<TrendPoint>> = BTreeMap::new();
    for point in trend(records, None)? {
        by_type.entry(point.exam_type).or_default().push(point);
    }

    Ok(by_type
        .into_iter()
        .filter_map(|(exam_type, points)| {
            let latest = points.last()?;
            let count = points.len() as f64;
            Some(ExamSummary {
                exam_type,
                exam_count: points.len() as u32,
                average_net: points.iter().map(|p| p.net).sum::<f64>() / count,
                best_net: points.iter().map(|p| p.net).fold(f64::MIN, f64::max),
                latest_net: latest.net,
                average_score: points.iter().map(|p| f64::from(p.score)).sum::<f64>() / count,
            })
        })
        .collect())
}
