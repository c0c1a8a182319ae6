// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::exam_record::{
        CreateExamRequest, ExamListParams, ExamResponse, ExamRow, ImportLegacyExamRequest,
    },
    scoring::{
        AytField, ExamBreakdown, ExamKind, ExamRecord, ExamSubjects, ExamType, FlatTotals,
    },
};

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 500;

/// Student ids come from the identity provider and are opaque to us.
pub(crate) fn check_student_id(raw: String) -> Result<String, AppError> {
    let id = raw.trim();
    if id.is_empty() || id.len() > 128 {
        return Err(AppError::BadRequest(
            "Student id must be between 1 and 128 characters".to_string(),
        ));
    }
    Ok(id.to_string())
}

/// Loads one exam and rebuilds its domain record.
pub(crate) async fn fetch_exam(pool: &SqlitePool, id: i64) -> Result<ExamRecord, AppError> {
    let row = sqlx::query_as::<_, ExamRow>(
        r#"
        SELECT id, student_id, exam_type, field, exam_date, subjects,
               legacy_correct, legacy_wrong, created_at
        FROM exam_records
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch exam {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    into_record(row)
}

/// Loads a student's exams, newest first.
pub(crate) async fn fetch_student_exams(
    pool: &SqlitePool,
    student_id: &str,
    exam_type: Option<ExamType>,
    limit: i64,
) -> Result<Vec<ExamRecord>, AppError> {
    let exam_type = exam_type.map(ExamType::as_str);

    let rows = sqlx::query_as::<_, ExamRow>(
        r#"
        SELECT id, student_id, exam_type, field, exam_date, subjects,
               legacy_correct, legacy_wrong, created_at
        FROM exam_records
        WHERE student_id = ?
          AND (? IS NULL OR exam_type = ?)
        ORDER BY exam_date DESC, created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(student_id)
    .bind(exam_type)
    .bind(exam_type)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams for {}: {:?}", student_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    rows.into_iter().map(into_record).collect()
}

/// A stored row that no longer fits the quota table is a server-side problem.
fn into_record(row: ExamRow) -> Result<ExamRecord, AppError> {
    let id = row.id;
    ExamRecord::try_from(row).map_err(|e| {
        tracing::error!("Stored exam {} does not match the quota table: {}", id, e);
        AppError::InternalServerError(e.to_string())
    })
}

pub(crate) fn parse_exam_type(raw: Option<&str>) -> Result<Option<ExamType>, AppError> {
    match raw.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => Ok(Some(t.parse::<ExamType>()?)),
        None => Ok(None),
    }
}

/// Records a new exam attempt.
///
/// * Resolves the exam kind against the quota table.
/// * Rejects breakdowns with missing or unknown subjects.
/// * Stores raw counts only; the response carries freshly computed totals.
pub async fn create_exam(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    payload.validate()?;

    let kind = ExamKind::parse(&payload.exam_type, payload.field.as_deref())?;
    let breakdown = ExamBreakdown::parse(kind, &payload.subjects)?;
    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO exam_records (student_id, exam_type, field, exam_date, subjects, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&student_id)
    .bind(kind.exam_type().as_str())
    .bind(kind.field().map(AytField::as_str))
    .bind(payload.date)
    .bind(SqlJson(breakdown.to_raw()))
    .bind(created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    let record = ExamRecord {
        id,
        student_id,
        date: payload.date,
        created_at,
        subjects: ExamSubjects::Detailed(breakdown),
    };
    let response = ExamResponse::from_record(&record)?;

    tracing::info!(
        exam_id = id,
        student_id = %record.student_id,
        kind = %kind,
        net = response.totals.net,
        "Exam recorded"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Imports a record that only kept whole-exam counts.
/// Such records get a single "general" entry in their analysis.
pub async fn import_legacy_exam(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
    Json(payload): Json<ImportLegacyExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    payload.validate()?;

    let kind = ExamKind::parse(&payload.exam_type, payload.field.as_deref())?;
    let totals = FlatTotals {
        total_correct: payload.total_correct,
        total_wrong: payload.total_wrong,
    };
    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO exam_records
            (student_id, exam_type, field, exam_date, legacy_correct, legacy_wrong, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&student_id)
    .bind(kind.exam_type().as_str())
    .bind(kind.field().map(AytField::as_str))
    .bind(payload.date)
    .bind(i64::from(totals.total_correct))
    .bind(i64::from(totals.total_wrong))
    .bind(created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to import legacy exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .last_insert_rowid();

    tracing::info!(exam_id = id, student_id = %student_id, kind = %kind, "Legacy exam imported");

    let record = ExamRecord {
        id,
        student_id,
        date: payload.date,
        created_at,
        subjects: ExamSubjects::Legacy { kind, totals },
    };

    Ok((StatusCode::CREATED, Json(ExamResponse::from_record(&record)?)))
}

/// Lists a student's exams, newest first, optionally for one exam type.
pub async fn list_exams(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<String>,
    Query(params): Query<ExamListParams>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = check_student_id(student_id)?;
    let exam_type = parse_exam_type(params.exam_type.as_deref())?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let records = fetch_student_exams(&pool, &student_id, exam_type, limit).await?;
    let exams = records
        .iter()
        .map(ExamResponse::from_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(exams))
}

pub async fn get_exam(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = fetch_exam(&pool, id).await?;
    Ok(Json(ExamResponse::from_record(&record)?))
}

/// Deletes an exam and its analysis. There is no soft delete.
pub async fn delete_exam(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM exam_analyses WHERE exam_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete analysis of exam {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    let result = sqlx::query("DELETE FROM exam_records WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    tx.commit().await?;
    tracing::info!(exam_id = id, "Exam deleted");

    Ok(StatusCode::NO_CONTENT)
}
