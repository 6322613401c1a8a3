/// Concurrent check-ins against a file-backed database
///
/// Unlike the in-memory tests these run on a pool of several connections,
/// so requests really do race for SQLite's write lock.

use checkin_shared::attendance::{self, MarkStatus};
use checkin_shared::db::migrations::run_migrations;
use checkin_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use checkin_shared::models::attendance::Attendance;
use checkin_shared::models::dance_class::{DanceClass, DanceClassFields, DayOfWeek};
use checkin_shared::models::student::{Student, StudentFields};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tempfile::TempDir;
use tokio::task::JoinSet;

async fn file_pool(dir: &TempDir) -> SqlitePool {
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("attendance.db").display()),
        max_connections: 5,
        ..Default::default()
    };

    let pool = create_pool(config).await.expect("Failed to create file database");
    run_migrations(&pool).await.expect("Migrations failed");
    pool
}

fn evening(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(18, 5, 0).unwrap()
}

async fn student(pool: &SqlitePool, first: &str, last: &str) -> Student {
    Student::create(
        pool,
        StudentFields {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

async fn bachata(pool: &SqlitePool) -> DanceClass {
    DanceClass::create(
        pool,
        DanceClassFields {
            name: "Bachata 2".to_string(),
            instructor_name: None,
            day_of_week: DayOfWeek::Monday,
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            description: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_marks_for_one_student_create_one_row() {
    let dir = TempDir::new().unwrap();
    let pool = file_pool(&dir).await;
    let student_id = student(&pool, "Ana", "Lopez").await.id;
    let class_id = bachata(&pool).await.id;
    let first_day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

    for round in 0..20 {
        let day = first_day + Duration::days(round);
        let now = evening(day);

        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let pool = pool.clone();
            tasks.spawn(async move { attendance::mark(&pool, student_id, class_id, now).await });
        }

        let mut new = 0;
        let mut already = 0;
        let mut row_ids = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap().expect("Concurrent check-in failed");
            match outcome.status {
                MarkStatus::CheckedIn => new += 1,
                MarkStatus::AlreadyCheckedIn => already += 1,
            }
            row_ids.insert(outcome.attendance.id);
            assert_eq!(outcome.attendance.time_in, now);
        }

        assert_eq!(new, 1, "round {}", round);
        assert_eq!(already, 4, "round {}", round);
        assert_eq!(row_ids.len(), 1, "everyone sees the winner's row");
        assert_eq!(Attendance::count_for_day(&pool, class_id, day).await.unwrap(), 1);
    }

    close_pool(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_marks_for_different_students_all_succeed() {
    let dir = TempDir::new().unwrap();
    let pool = file_pool(&dir).await;
    let class_id = bachata(&pool).await.id;
    let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

    let mut students = Vec::new();
    for i in 0..50 {
        students.push(student(&pool, &format!("Dancer{:02}", i), "Ruiz").await);
    }

    let mut tasks = JoinSet::new();
    for dancer in &students {
        let pool = pool.clone();
        let student_id = dancer.id;
        tasks.spawn(async move {
            attendance::mark(&pool, student_id, class_id, evening(today)).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap().expect("Concurrent check-in failed");
        assert_eq!(outcome.status, MarkStatus::CheckedIn);
    }

    assert_eq!(Attendance::count_for_day(&pool, class_id, today).await.unwrap(), 50);
    close_pool(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batch_and_single_marks_race_without_duplicates() {
    let dir = TempDir::new().unwrap();
    let pool = file_pool(&dir).await;
    let class_id = bachata(&pool).await.id;
    let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let now = evening(today);

    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(student(&pool, &format!("Dancer{:02}", i), "Vega").await.id);
    }

    let batch = {
        let pool = pool.clone();
        let ids = ids.clone();
        tokio::spawn(async move { attendance::mark_batch(&pool, class_id, &ids, now).await })
    };

    let mut singles = JoinSet::new();
    for &student_id in &ids {
        let pool = pool.clone();
        singles.spawn(async move { attendance::mark(&pool, student_id, class_id, now).await });
    }

    let mut newly_checked_in: Vec<i64> = batch
        .await
        .unwrap()
        .expect("Batch check-in failed")
        .into_iter()
        .map(|student| student.id)
        .collect();

    while let Some(joined) = singles.join_next().await {
        let outcome = joined.unwrap().expect("Concurrent check-in failed");
        if outcome.status == MarkStatus::CheckedIn {
            newly_checked_in.push(outcome.student.id);
        }
    }

    // Each student was newly checked in by exactly one of the requests
    newly_checked_in.sort_unstable();
    assert_eq!(newly_checked_in, ids);
    assert_eq!(Attendance::count_for_day(&pool, class_id, today).await.unwrap(), 10);

    close_pool(pool).await;
}
