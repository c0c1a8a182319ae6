// src/handlers/stats.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::exams::{check_student_id, fetch_student_exams, parse_exam_type},
    scoring::{GroupBy, aggregate_across_exams, summarize},
};

/// Charts look at a student's whole history.
const HISTORY_LIMIT: i64 = i64::MAX;

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub exam_type: Option<String>,
}

/// Per-subject sums and averages for one exam type.
/// `exam_type` is required since TYT and AYT subjects are not comparable.
pub async fn subject_stats(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    let exam_type = parse_exam_type(params.exam_type.as_deref())?
        .ok_or(AppError::BadRequest("exam_type is required".to_string()))?;

    let records = fetch_student_exams(&pool, &student_id, Some(exam_type), HISTORY_LIMIT).await?;
    let aggregation = aggregate_across_exams(&records, GroupBy::Subject(exam_type))?;

    Ok(Json(aggregation))
}

/// Net and score per exam, oldest first.
pub async fn trend_stats(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    let exam_type = parse_exam_type(params.exam_type.as_deref())?;

    let records = fetch_student_exams(&pool, &student_id, exam_type, HISTORY_LIMIT).await?;
    let aggregation = aggregate_across_exams(&records, GroupBy::Chronological(exam_type))?;

    Ok(Json(aggregation))
}

/// Overview figures per exam type.
pub async fn summary_stats(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    let records = fetch_student_exams(&pool, &student_id, None, HISTORY_LIMIT).await?;

    Ok(Json(summarize(&records)?))
}
