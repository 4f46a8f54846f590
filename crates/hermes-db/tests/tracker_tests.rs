//! Postgres integration tests for the completion tracker.

use hermes_db::{create_pool, CompletionTracker, DbConfig, DbPool, PgCompletionTracker, TrackerError};
use hermes_models::{CompletionStatus, TaskKind, VideoStatus};

async fn setup() -> (DbPool, PgCompletionTracker) {
    dotenvy::dotenv().ok();
    let pool = create_pool(&DbConfig::from_env())
        .await
        .expect("Failed to connect to Postgres");
    sqlx::raw_sql(include_str!("../schema.sql"))
        .execute(&pool)
        .await
        .expect("Failed to apply schema");
    (pool.clone(), PgCompletionTracker::new(pool))
}

/// Insert a video with pending rows for `kinds`; returns its id.
async fn seed(pool: &DbPool, kinds: &[TaskKind]) -> i64 {
    let video_id: i64 =
        sqlx::query_scalar("INSERT INTO video (status) VALUES ('processing') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    for kind in kinds {
        sqlx::query("INSERT INTO video_task (video_id, task_type) VALUES ($1, $2)")
            .bind(video_id)
            .bind(kind.as_str())
            .execute(pool)
            .await
            .unwrap();
    }
    video_id
}

async fn video_status(pool: &DbPool, video_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM video WHERE id = $1")
        .bind(video_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_double_begin_fails() {
    let (pool, tracker) = setup().await;
    let video_id = seed(&pool, &[TaskKind::Poster]).await;

    tokio_test::assert_ok!(tracker.begin_task(video_id, &TaskKind::Poster).await);
    let err = tokio_test::assert_err!(tracker.begin_task(video_id, &TaskKind::Poster).await);
    assert!(matches!(err, TrackerError::NotFoundOrAlreadyProcessing { .. }));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_last_completion_completes_video() {
    let (pool, tracker) = setup().await;
    let video_id = seed(&pool, &[TaskKind::Poster, TaskKind::WebVtt]).await;

    for kind in [TaskKind::Poster, TaskKind::WebVtt] {
        tracker.begin_task(video_id, &kind).await.unwrap();
    }

    let aggregate = tracker
        .complete_task(video_id, &TaskKind::Poster, CompletionStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(aggregate, VideoStatus::Processing);
    assert_eq!(video_status(&pool, video_id).await, "processing");

    let aggregate = tracker
        .complete_task(video_id, &TaskKind::WebVtt, CompletionStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(aggregate, VideoStatus::Completed);
    assert_eq!(video_status(&pool, video_id).await, "completed");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_failure_fails_video_with_pending_siblings() {
    let (pool, tracker) = setup().await;
    let video_id = seed(&pool, &[TaskKind::Trailer, TaskKind::Poster]).await;

    tracker.begin_task(video_id, &TaskKind::Trailer).await.unwrap();
    let aggregate = tracker
        .complete_task(
            video_id,
            &TaskKind::Trailer,
            CompletionStatus::Failed,
            Some("exit status 1".into()),
        )
        .await
        .unwrap();

    assert_eq!(aggregate, VideoStatus::Failed);
    assert_eq!(video_status(&pool, video_id).await, "failed");

    let error: Option<String> =
        sqlx::query_scalar("SELECT error FROM video_task WHERE video_id = $1 AND task_type = 'trailer'")
            .bind(video_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(error.as_deref(), Some("exit status 1"));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_complete_without_begin_rolls_back() {
    let (pool, tracker) = setup().await;
    let video_id = seed(&pool, &[TaskKind::Poster]).await;

    let err = tracker
        .complete_task(video_id, &TaskKind::Poster, CompletionStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(err.is_state_conflict());
    assert_eq!(video_status(&pool, video_id).await, "processing");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_update_video_duration() {
    let (pool, tracker) = setup().await;
    let video_id = seed(&pool, &[]).await;

    tracker.update_video_duration(video_id, 120.5).await.unwrap();

    let duration: Option<f64> = sqlx::query_scalar("SELECT video_duration FROM video WHERE id = $1")
        .bind(video_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(duration, Some(120.5));
}
