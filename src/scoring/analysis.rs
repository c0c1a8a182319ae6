// src/scoring/analysis.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    error::{ScoringError, ValidationError},
    quota::Subject,
    record::{ExamRecord, ExamSubjects},
    totals::percentage,
};

const WEIGHT_STARTED: u32 = 20;
const WEIGHT_WRONG_REVIEWED: u32 = 30;
const WEIGHT_BLANK_REVIEWED: u32 = 20;
const WEIGHT_TEACHER: u32 = 30;

/// Something a student can review: a subject, or the whole exam for legacy records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReviewTarget {
    Subject(Subject),
    /// Synthetic entry for records without a per-subject breakdown.
    General,
}

impl ReviewTarget {
    pub const GENERAL_KEY: &'static str = "general";

    pub fn key(self) -> &'static str {
        match self {
            ReviewTarget::Subject(subject) => subject.key(),
            ReviewTarget::General => Self::GENERAL_KEY,
        }
    }
}

impl fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ReviewTarget {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::GENERAL_KEY {
            return Ok(ReviewTarget::General);
        }
        s.parse::<Subject>()
            .map(ReviewTarget::Subject)
            .map_err(|_| ValidationError::UnknownReviewTarget(s.to_string()).into())
    }
}

impl Serialize for ReviewTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ReviewTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Questions left to work through for one review target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubjectGap {
    pub wrong_count: u32,
    pub blank_count: u32,
}

impl SubjectGap {
    fn is_empty(&self) -> bool {
        self.wrong_count == 0 && self.blank_count == 0
    }
}

/// Lists what is worth reviewing in an exam.
///
/// Fully correct subjects are left out. A legacy record yields a single
/// [`ReviewTarget::General`] entry built from its flat totals.
pub fn derive_subject_analysis(record: &ExamRecord) -> BTreeMap<ReviewTarget, SubjectGap> {
    match &record.subjects {
        ExamSubjects::Detailed(breakdown) => breakdown
            .subjects()
            .into_iter()
            .map(|line| {
                (
                    ReviewTarget::Subject(line.subject),
                    SubjectGap {
                        wrong_count: line.wrong,
                        blank_count: line.blank,
                    },
                )
            })
            .filter(|(_, gap)| !gap.is_empty())
            .collect(),
        ExamSubjects::Legacy { kind, totals } => {
            let total_questions = kind.total_questions();
            let gap = SubjectGap {
                wrong_count: totals.total_wrong,
                blank_count: total_questions
                    .saturating_sub(totals.total_correct.saturating_add(totals.total_wrong)),
            };
            if gap.is_empty() {
                BTreeMap::new()
            } else {
                BTreeMap::from([(ReviewTarget::General, gap)])
            }
        }
    }
}

/// Review progress for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    #[serde(default)]
    pub wrong_count: u32,
    #[serde(default)]
    pub blank_count: u32,
    #[serde(default)]
    pub reviewed_wrong: bool,
    #[serde(default)]
    pub reviewed_blank: bool,
    #[serde(default)]
    pub solved_with_teacher: u32,
}

impl ReviewItem {
    fn from_gap(gap: SubjectGap) -> Self {
        Self {
            wrong_count: gap.wrong_count,
            blank_count: gap.blank_count,
            ..Self::default()
        }
    }
}

/// Review state of one exam. Completion is derived on every change and cannot be set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamAnalysis {
    exam_id: i64,
    analyzed: bool,
    asked_teacher: bool,
    items: BTreeMap<ReviewTarget, ReviewItem>,
    completion_percentage: u8,
}

impl ExamAnalysis {
    /// Fresh, untouched analysis for `record`.
    pub fn start(record: &ExamRecord) -> Self {
        let items = derive_subject_analysis(record)
            .into_iter()
            .map(|(target, gap)| (target, ReviewItem::from_gap(gap)))
            .collect();

        Self {
            exam_id: record.id,
            analyzed: false,
            asked_teacher: false,
            items,
            completion_percentage: 0,
        }
    }

    /// Rebuilds a saved analysis.
    ///
    /// Counts are re-derived from `record`; only the review flags are taken
    /// from `saved`. Saved entries the record no longer has are dropped.
    pub fn restore(
        record: &ExamRecord,
        analyzed: bool,
        asked_teacher: bool,
        saved: &BTreeMap<ReviewTarget, ReviewItem>,
    ) -> Self {
        let mut analysis = Self::start(record);
        analysis.analyzed = analyzed;
        analysis.asked_teacher = asked_teacher;

        for (target, item) in analysis.items.iter_mut() {
            if let Some(prev) = saved.get(target) {
                item.reviewed_wrong = prev.reviewed_wrong;
                item.reviewed_blank = prev.reviewed_blank;
                item.solved_with_teacher = prev
                    .solved_with_teacher
                    .min(item.wrong_count.saturating_add(item.blank_count));
            }
        }

        analysis.recompute();
        analysis
    }

    pub fn exam_id(&self) -> i64 {
        self.exam_id
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn asked_teacher(&self) -> bool {
        self.asked_teacher
    }

    pub fn items(&self) -> &BTreeMap<ReviewTarget, ReviewItem> {
        &self.items
    }

    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    /// Wrong and blank questions whose review box is still unticked.
    pub fn pending_questions(&self) -> u32 {
        self.items
            .values()
            .map(|i| {
                let wrong = if i.reviewed_wrong { 0 } else { i.wrong_count };
                let blank = if i.reviewed_blank { 0 } else { i.blank_count };
                wrong.saturating_add(blank)
            })
            .fold(0, u32::saturating_add)
    }

    pub fn set_analyzed(&mut self, analyzed: bool) {
        self.analyzed = analyzed;
        self.recompute();
    }

    pub fn set_asked_teacher(&mut self, asked: bool) {
        self.asked_teacher = asked;
        self.recompute();
    }

    pub fn set_reviewed_wrong(&mut self, target: ReviewTarget, reviewed: bool) -> Result<(), ScoringError> {
        self.item_mut(target)?.reviewed_wrong = reviewed;
        self.recompute();
        Ok(())
    }

    pub fn set_reviewed_blank(&mut self, target: ReviewTarget, reviewed: bool) -> Result<(), ScoringError> {
        self.item_mut(target)?.reviewed_blank = reviewed;
        self.recompute();
        Ok(())
    }

    /// Records how many of the target's wrong/blank questions were solved with a teacher.
    pub fn set_solved_with_teacher(&mut self, target: ReviewTarget, count: u32) -> Result<(), ScoringError> {
        let item = self.item_mut(target)?;
        let max = item.wrong_count.saturating_add(item.blank_count);
        if count > max {
            return Err(ValidationError::TeacherCountTooLarge { target, count, max }.into());
        }
        item.solved_with_teacher = count;
        self.recompute();
        Ok(())
    }

    fn item_mut(&mut self, target: ReviewTarget) -> Result<&mut ReviewItem, ScoringError> {
        self.items
            .get_mut(&target)
            .ok_or_else(|| ValidationError::UnknownReviewTarget(target.key().to_string()).into())
    }

    fn recompute(&mut self) {
        self.completion_percentage = compute_analysis_completion(self);
    }
}

/// Weighted completion of an analysis, 0-100.
///
/// | bucket                   | weight | applies when         |
/// |--------------------------|--------|----------------------|
/// | analysis started         | 20     | always               |
/// | every wrong reviewed     | 30     | any wrong answer     |
/// | every blank reviewed     | 20     | any blank            |
/// | solved with a teacher    | 30     | any wrong or blank   |
///
/// Buckets that do not apply are left out of both sides of the ratio.
pub fn compute_analysis_completion(analysis: &ExamAnalysis) -> u8 {
    let items = analysis.items.values();
    let has_wrong = items.clone().any(|i| i.wrong_count > 0);
    let has_blank = items.clone().any(|i| i.blank_count > 0);
    let solved_any = items.clone().any(|i| i.solved_with_teacher > 0);

    let buckets = [
        (WEIGHT_STARTED, true, analysis.analyzed),
        (
            WEIGHT_WRONG_REVIEWED,
            has_wrong,
            items.clone().filter(|i| i.wrong_count > 0).all(|i| i.reviewed_wrong),
        ),
        (
            WEIGHT_BLANK_REVIEWED,
            has_blank,
            items.clone().filter(|i| i.blank_count > 0).all(|i| i.reviewed_blank),
        ),
        (
            WEIGHT_TEACHER,
            has_wrong || has_blank,
            analysis.asked_teacher && solved_any,
        ),
    ];

    let (earned, applicable) = buckets
        .iter()
        .filter(|(_, applies, _)| *applies)
        .fold((0, 0), |(earned, applicable), (weight, _, done)| {
            (earned + if *done { *weight } else { 0 }, applicable + weight)
        });

    percentage(earned, applicable).min(100) as u8
}
