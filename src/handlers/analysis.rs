// src/handlers/analysis.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::exams::fetch_exam,
    models::analysis::{AnalysisResponse, AnalysisRow, UpdateAnalysisRequest},
    scoring::{ExamAnalysis, ExamRecord, ReviewTarget},
};

async fn fetch_analysis_row(pool: &SqlitePool, exam_id: i64) -> Result<Option<AnalysisRow>, AppError> {
    sqlx::query_as::<_, AnalysisRow>(
        r#"
        SELECT exam_id, analyzed, asked_teacher, items, updated_at
        FROM exam_analyses
        WHERE exam_id = ?
        "#,
    )
    .bind(exam_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch analysis for exam {}: {:?}", exam_id, e);
        AppError::InternalServerError(e.to_string())
    })
}

fn load(record: &ExamRecord, row: Option<&AnalysisRow>) -> ExamAnalysis {
    match row {
        Some(row) => ExamAnalysis::restore(record, row.analyzed, row.asked_teacher, &row.items.0),
        None => ExamAnalysis::start(record),
    }
}

/// Returns the analysis of an exam.
///
/// An exam that was never reviewed gets a fresh analysis seeded from its
/// wrong and blank answers; nothing is written until the first update.
pub async fn get_analysis(
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = fetch_exam(&pool, exam_id).await?;
    let row = fetch_analysis_row(&pool, exam_id).await?;

    let analysis = load(&record, row.as_ref());
    Ok(Json(AnalysisResponse::new(
        analysis,
        row.map(|r| r.updated_at),
    )))
}

/// Applies review changes and stores the result.
///
/// * Flags may be unticked again; completion follows them down.
/// * Unknown review targets and oversized teacher counts are rejected
///   before anything is written.
pub async fn update_analysis(
    State(pool): State<SqlitePool>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<UpdateAnalysisRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = fetch_exam(&pool, exam_id).await?;
    let row = fetch_analysis_row(&pool, exam_id).await?;
    let mut analysis = load(&record, row.as_ref());

    if let Some(analyzed) = payload.analyzed {
        analysis.set_analyzed(analyzed);
    }
    if let Some(asked) = payload.asked_teacher {
        analysis.set_asked_teacher(asked);
    }
    for (key, update) in &payload.items {
        let target = key.trim().parse::<ReviewTarget>()?;
        if let Some(reviewed) = update.reviewed_wrong {
            analysis.set_reviewed_wrong(target, reviewed)?;
        }
        if let Some(reviewed) = update.reviewed_blank {
            analysis.set_reviewed_blank(target, reviewed)?;
        }
        if let Some(count) = update.solved_with_teacher {
            analysis.set_solved_with_teacher(target, count)?;
        }
    }

    let updated_at = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO exam_analyses (exam_id, analyzed, asked_teacher, items, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(exam_id) DO UPDATE SET
            analyzed = excluded.analyzed,
            asked_teacher = excluded.asked_teacher,
            items = excluded.items,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(exam_id)
    .bind(analysis.analyzed())
    .bind(analysis.asked_teacher())
    .bind(SqlJson(analysis.items().clone()))
    .bind(updated_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save analysis for exam {}: {:?}", exam_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        exam_id,
        completion = analysis.completion_percentage(),
        "Analysis updated"
    );

    Ok(Json(AnalysisResponse::new(analysis, Some(updated_at))))
}
