// src/models/analysis.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::scoring::{ExamAnalysis, ReviewItem, ReviewTarget};

/// Represents the 'exam_analyses' table in the database.
/// Completion is not stored; it is recomputed from the flags on load.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisRow {
    pub exam_id: i64,
    pub analyzed: bool,
    pub asked_teacher: bool,
    pub items: Json<BTreeMap<ReviewTarget, ReviewItem>>,
    pub updated_at: DateTime<Utc>,
}

/// Changes to one review target. Absent fields stay as they are.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReviewItemUpdate {
    pub reviewed_wrong: Option<bool>,
    pub reviewed_blank: Option<bool>,
    pub solved_with_teacher: Option<u32>,
}

/// DTO for updating an exam's analysis.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAnalysisRequest {
    pub analyzed: Option<bool>,
    pub asked_teacher: Option<bool>,
    /// Keyed by subject key or "general".
    #[serde(default)]
    #[validate(custom(function = validate_item_updates))]
    pub items: BTreeMap<String, ReviewItemUpdate>,
}

fn validate_item_updates(
    items: &BTreeMap<String, ReviewItemUpdate>,
) -> Result<(), validator::ValidationError> {
    if items.len() > 16 {
        return Err(validator::ValidationError::new("too_many_items"));
    }
    Ok(())
}

/// DTO for returning an analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: ExamAnalysis,
    /// Wrong and blank questions not yet marked as reviewed.
    pub pending_questions: u32,
    /// False until the first update is stored.
    pub saved: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AnalysisResponse {
    pub fn new(analysis: ExamAnalysis, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            pending_questions: analysis.pending_questions(),
            saved: updated_at.is_some(),
            updated_at,
            analysis,
        }
    }
}
