// src/handlers/scoring.rs

use axum::{Json, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam_record::ComputeTotalsRequest,
    scoring::{AytField, ExamKind, ExamType, QUOTA_TABLE_VERSION, Subject, compute_totals},
};

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "quota_table_version": QUOTA_TABLE_VERSION,
    }))
}

#[derive(Debug, Serialize)]
struct QuotaLine {
    subject: Subject,
    label: &'static str,
    quota: u32,
}

#[derive(Debug, Serialize)]
struct QuotaEntry {
    exam_type: ExamType,
    field: Option<AytField>,
    total_questions: u32,
    subjects: Vec<QuotaLine>,
}

/// The fixed subject/quota table the server scores against.
pub async fn list_quotas() -> impl IntoResponse {
    let entries: Vec<QuotaEntry> = ExamKind::ALL
        .into_iter()
        .map(|kind| QuotaEntry {
            exam_type: kind.exam_type(),
            field: kind.field(),
            total_questions: kind.total_questions(),
            subjects: kind
                .quotas()
                .iter()
                .map(|&(subject, quota)| QuotaLine {
                    subject,
                    label: subject.label(),
                    quota,
                })
                .collect(),
        })
        .collect();

    Json(json!({
        "version": QUOTA_TABLE_VERSION,
        "exams": entries,
    }))
}

/// Computes totals for an unsaved breakdown, e.g. while the entry form is being filled.
pub async fn preview_totals(
    Json(payload): Json<ComputeTotalsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let kind = ExamKind::parse(&payload.exam_type, payload.field.as_deref())?;
    let totals = compute_totals(kind.exam_type(), kind.field(), &payload.subjects)?;

    Ok(Json(json!({
        "exam_type": kind.exam_type(),
        "field": kind.field(),
        "totals": totals,
    })))
}
