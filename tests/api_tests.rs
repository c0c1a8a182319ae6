// tests/api_tests.rs

use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use yks_tracker::{config::Config, routes, state::AppState};

/// Helper function to spawn the app on a random port for testing.
/// Every call gets its own in-memory database.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    spawn_app_with_pool().await.0
}

/// Same as `spawn_app`, also handing back the pool for direct row checks.
async fn spawn_app_with_pool() -> (String, SqlitePool) {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    yks_tracker::db::migrate(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
        port: 0,
        log_dir: "logs".to_string(),
        cors_origins: yks_tracker::config::default_origins(),
    };

    let state = AppState { pool: pool.clone(), config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

fn tyt_subjects(turkce: (u32, u32), matematik: (u32, u32)) -> Value {
    json!({
        "turkce": {"correct": turkce.0, "wrong": turkce.1},
        "matematik": {"correct": matematik.0, "wrong": matematik.1},
        "fizik": {"correct": 7, "wrong": 0},
        "kimya": {"correct": 7, "wrong": 0},
        "biyoloji": {"correct": 6, "wrong": 0},
        "tarih": {"correct": 5, "wrong": 0},
        "cografya": {"correct": 5, "wrong": 0},
        "felsefe": {"correct": 5, "wrong": 0},
        "din": {"correct": 5, "wrong": 0}
    })
}

async fn create_exam(client: &reqwest::Client, address: &str, student: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/api/students/{}/exams", address, student))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json::<Value>().await.unwrap()
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_and_quota_table() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let quotas = client
        .get(format!("{}/api/quotas", address))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let exams = quotas["exams"].as_array().unwrap();
    assert_eq!(exams.len(), 5);
    assert_eq!(exams[0]["exam_type"], "TYT");
    assert_eq!(exams[0]["total_questions"], 120);
    assert_eq!(exams[4]["field"], "DİL");
    assert_eq!(exams[4]["total_questions"], 80);
}

#[tokio::test]
async fn preview_totals_validates_breakdown() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let ok = client
        .post(format!("{}/api/scoring/totals", address))
        .json(&json!({
            "exam_type": "AYT",
            "field": "DİL",
            "subjects": {"yabanci_dil": {"correct": 60, "wrong": 10}}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
    let body = ok.json::<Value>().await.unwrap();
    assert_eq!(body["totals"]["score"], 75);
    assert_eq!(body["totals"]["blank"], 10);
    assert_eq!(body["totals"]["net"], 57.5);

    // Typo'd subject key
    let typo = client
        .post(format!("{}/api/scoring/totals", address))
        .json(&json!({
            "exam_type": "AYT",
            "field": "DIL",
            "subjects": {"ingilizce": {"correct": 60, "wrong": 10}}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(typo.status().as_u16(), 400);

    // Exam kind not in the quota table
    let unknown = client
        .post(format!("{}/api/scoring/totals", address))
        .json(&json!({
            "exam_type": "AYT",
            "subjects": {"matematik": {"correct": 10, "wrong": 0}}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 422);
}

#[tokio::test]
async fn exam_lifecycle() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_exam(
        &client,
        &address,
        "ogrenci-1",
        json!({
            "exam_type": "TYT",
            "date": "2025-03-01",
            "subjects": tyt_subjects((35, 5), (38, 2))
        }),
    )
    .await;

    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["student_id"], "ogrenci-1");
    assert_eq!(created["legacy"], false);
    assert_eq!(created["totals"]["total_correct"], 113);
    assert_eq!(created["totals"]["total_questions"], 120);
    assert_eq!(created["totals"]["net"], 111.25);
    assert_eq!(created["subjects"].as_array().unwrap().len(), 9);

    // Read back: totals are recomputed from raw counts.
    let fetched = client
        .get(format!("{}/api/exams/{}", address, id))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(fetched["totals"], created["totals"]);

    let list = client
        .get(format!("{}/api/students/ogrenci-1/exams?exam_type=TYT", address))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let other = client
        .get(format!("{}/api/students/ogrenci-2/exams", address))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert!(other.as_array().unwrap().is_empty());

    let deleted = client
        .delete(format!("{}/api/exams/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let gone = client
        .get(format!("{}/api/exams/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);

    let deleted_again = client
        .delete(format!("{}/api/exams/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted_again.status().as_u16(), 404);
}

async fn count_analyses(pool: &SqlitePool, exam_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_analyses WHERE exam_id = ?")
        .bind(exam_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn delete_removes_saved_analysis() {
    let (address, pool) = spawn_app_with_pool().await;
    let client = reqwest::Client::new();

    let created = create_exam(
        &client,
        &address,
        "ogrenci-1",
        json!({
            "exam_type": "TYT",
            "date": "2025-03-01",
            "subjects": tyt_subjects((35, 5), (38, 2))
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let saved = client
        .put(format!("{}/api/exams/{}/analysis", address, id))
        .json(&json!({"analyzed": true, "items": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status().as_u16(), 200);

    assert_eq!(count_analyses(&pool, id).await, 1);

    let deleted = client
        .delete(format!("{}/api/exams/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);
    assert_eq!(count_analyses(&pool, id).await, 0);

    let analysis = client
        .get(format!("{}/api/exams/{}/analysis", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(analysis.status().as_u16(), 404);
}

#[tokio::test]
async fn create_rejects_incomplete_breakdown() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/students/ogrenci-1/exams", address))
        .json(&json!({
            "exam_type": "AYT",
            "field": "MF",
            "date": "2025-04-01",
            "subjects": {
                "matematik": {"correct": 30, "wrong": 4},
                "fizik": {"correct": 10, "wrong": 2}
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body = response.json::<Value>().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("kimya"));

    let list = client
        .get(format!("{}/api/students/ogrenci-1/exams", address))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert!(list.as_array().unwrap().is_empty(), "nothing was stored");
}

#[tokio::test]
async fn analysis_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_exam(
        &client,
        &address,
        "ogrenci-1",
        json!({
            "exam_type": "TYT",
            "date": "2025-03-01",
            "subjects": tyt_subjects((35, 5), (38, 2))
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let url = format!("{}/api/exams/{}/analysis", address, id);

    // Fresh analysis is seeded but not saved.
    let fresh = client.get(&url).send().await.unwrap().json::<Value>().await.unwrap();
    assert_eq!(fresh["completion_percentage"], 0);
    assert_eq!(fresh["saved"], false);
    assert_eq!(fresh["pending_questions"], 7);
    let items = fresh["items"].as_object().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items["turkce"]["wrong_count"], 5);
    assert_eq!(items["matematik"]["wrong_count"], 2);

    let updated = client
        .put(&url)
        .json(&json!({
            "analyzed": true,
            "items": {
                "turkce": {"reviewed_wrong": true},
                "matematik": {"reviewed_wrong": true}
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated = updated.json::<Value>().await.unwrap();
    assert_eq!(updated["completion_percentage"], 63);
    assert_eq!(updated["saved"], true);

    let finished = client
        .put(&url)
        .json(&json!({
            "asked_teacher": true,
            "items": {"turkce": {"solved_with_teacher": 3}}
        }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(finished["completion_percentage"], 100);

    // Persisted flags survive a reload.
    let reloaded = client.get(&url).send().await.unwrap().json::<Value>().await.unwrap();
    assert_eq!(reloaded["completion_percentage"], 100);
    assert_eq!(reloaded["items"]["turkce"]["solved_with_teacher"], 3);

    let regressed = client
        .put(&url)
        .json(&json!({"items": {"matematik": {"reviewed_wrong": false}}}))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(regressed["completion_percentage"], 63);

    // Fully correct subjects have nothing to review.
    let bad_target = client
        .put(&url)
        .json(&json!({"items": {"fizik": {"reviewed_wrong": true}}}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_target.status().as_u16(), 400);

    let too_many = client
        .put(&url)
        .json(&json!({"items": {"matematik": {"solved_with_teacher": 9}}}))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status().as_u16(), 400);

    let missing = client
        .get(format!("{}/api/exams/99999/analysis", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn legacy_import_uses_general_analysis() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/students/ogrenci-1/exams/legacy", address))
        .json(&json!({
            "exam_type": "TYT",
            "date": "2024-11-02",
            "total_correct": 90,
            "total_wrong": 20
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created = response.json::<Value>().await.unwrap();
    assert_eq!(created["legacy"], true);
    assert_eq!(created["totals"]["net"], 85.0);
    assert_eq!(created["totals"]["blank"], 10);

    let id = created["id"].as_i64().unwrap();
    let analysis = client
        .get(format!("{}/api/exams/{}/analysis", address, id))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let items = analysis["items"].as_object().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items["general"]["wrong_count"], 20);
    assert_eq!(items["general"]["blank_count"], 10);
}

#[tokio::test]
async fn stats_endpoints() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let student = "ogrenci-1";

    create_exam(
        &client,
        &address,
        student,
        json!({
            "exam_type": "TYT",
            "date": "2025-03-15",
            "subjects": tyt_subjects((36, 0), (30, 4))
        }),
    )
    .await;
    create_exam(
        &client,
        &address,
        student,
        json!({
            "exam_type": "TYT",
            "date": "2025-01-05",
            "subjects": tyt_subjects((30, 4), (20, 8))
        }),
    )
    .await;
    create_exam(
        &client,
        &address,
        student,
        json!({
            "exam_type": "AYT",
            "field": "MF",
            "date": "2025-02-01",
            "subjects": {
                "matematik": {"correct": 25, "wrong": 5},
                "fizik": {"correct": 0, "wrong": 0},
                "kimya": {"correct": 8, "wrong": 2},
                "biyoloji": {"correct": 10, "wrong": 0}
            }
        }),
    )
    .await;

    let subjects = client
        .get(format!("{}/api/students/{}/stats/subjects?exam_type=AYT", address, student))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(subjects["group_by"], "subject");
    let rows = subjects["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3, "unattempted fizik is omitted");
    assert!(rows.iter().all(|r| r["subject"] != "fizik"));

    let tyt = client
        .get(format!("{}/api/students/{}/stats/subjects?exam_type=TYT", address, student))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let turkce = tyt["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["subject"] == "turkce")
        .unwrap()
        .clone();
    assert_eq!(turkce["exam_count"], 2);
    assert_eq!(turkce["average_correct"], 33.0);

    let missing_type = client
        .get(format!("{}/api/students/{}/stats/subjects", address, student))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_type.status().as_u16(), 400);

    let trend = client
        .get(format!("{}/api/students/{}/stats/trend", address, student))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    assert_eq!(trend["group_by"], "chronological");
    let dates: Vec<&str> = trend["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2025-01-05", "2025-02-01", "2025-03-15"]);

    let summary = client
        .get(format!("{}/api/students/{}/stats/summary", address, student))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    let summary = summary.as_array().unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0]["exam_type"], "TYT");
    assert_eq!(summary[0]["exam_count"], 2);
    assert_eq!(summary[1]["exam_type"], "AYT");
    assert_eq!(summary[1]["exam_count"], 1);
}
