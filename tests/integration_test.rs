use std::sync::Arc;
use std::time::Duration;

use biblio_api::{
    config::AppConfig,
    db::{self, PgBookStore},
    models::book::BookPayload,
    models::job::ImportStatus,
    services::{
        catalog::CatalogService,
        import,
        jobs::JobTracker,
        worker::{ImportTask, ImportWorkerPool},
    },
};
use chrono::NaiveDate;

/// Integration test: full catalog + import flow against a real PostgreSQL.
///
/// Covers:
/// 1. Database connection and migrations
/// 2. CRUD + duplicate/not-found handling through the Postgres store
/// 3. Pagination and keyword search
/// 4. Statistics aggregates
/// 5. Synchronous CSV import
/// 6. Async import through the worker pool and job tracker
///
/// Note: This requires a running PostgreSQL instance configured via
/// DATABASE_URL.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_integration() {
    let config = AppConfig::from_env().expect("Failed to load config");

    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let catalog = Arc::new(CatalogService::new(Arc::new(PgBookStore::new(
        db_pool.clone(),
    ))));

    // Unique ISBN prefix per run so reruns don't collide.
    let run_tag = format!("{:010}", chrono::Utc::now().timestamp() % 10_000_000_000);

    let isbn_a = format!("978{run_tag}");
    let isbn_b = format!("979{run_tag}");

    // 1. Create
    let book = catalog
        .create(BookPayload {
            title: "Integration Test Book".to_string(),
            author: "Integration Author".to_string(),
            isbn: isbn_a.clone(),
            published_date: NaiveDate::from_ymd_opt(2001, 6, 15).unwrap(),
        })
        .await
        .expect("create failed");
    assert!(book.id > 0);
    assert_eq!(book.isbn, isbn_a);

    // 2. Duplicate ISBN is a conflict
    let dup = catalog
        .create(BookPayload {
            title: "Copycat".to_string(),
            author: "Someone Else".to_string(),
            isbn: isbn_a.clone(),
            published_date: NaiveDate::from_ymd_opt(2002, 1, 1).unwrap(),
        })
        .await;
    assert!(dup.is_err(), "duplicate ISBN should be rejected");

    // 3. Fetch and update
    let fetched = catalog.get(book.id).await.expect("get failed");
    assert_eq!(fetched.title, "Integration Test Book");

    let updated = catalog
        .update(
            book.id,
            BookPayload {
                title: "Integration Test Book, 2nd ed.".to_string(),
                author: "Integration Author".to_string(),
                isbn: isbn_a.clone(),
                published_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            },
        )
        .await
        .expect("update failed");
    assert_eq!(updated.title, "Integration Test Book, 2nd ed.");

    // 4. Search finds it by keyword
    let results = catalog
        .search("Integration Test Book", 0, 10)
        .await
        .expect("search failed");
    assert!(results.content.iter().any(|b| b.id == book.id));

    // 5. Stats include the record
    let stats = catalog.stats().await.expect("stats failed");
    assert!(stats.total_books >= 1);
    assert!(stats
        .unique_authors
        .iter()
        .any(|a| a == "Integration Author"));

    // 6. Synchronous CSV import
    let csv = format!(
        "title,author,isbn,publishedDate\nImported Book,CSV Author,{isbn_b},1999-12-31\nBroken Row,Nobody,bad!,1999-12-31\n"
    );
    let rows = import::parse_csv(csv.as_bytes()).expect("parse failed");
    let report = import::run_import(&catalog, &rows).await;
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 1);

    // 7. Async import through the worker pool
    let tracker = Arc::new(JobTracker::new(Duration::from_secs(3600)));
    let pool = ImportWorkerPool::new(1, 4, Arc::clone(&catalog), Arc::clone(&tracker));

    let isbn_c = format!("977{run_tag}");
    let csv = format!("Async Book,Async Author,{isbn_c},2010-03-03\n");
    let rows = import::parse_csv(csv.as_bytes()).expect("parse failed");

    let job_id = tracker.create_job(rows.total_data_rows());
    pool.submit(ImportTask { job_id, rows }).expect("submit failed");

    let mut job = tracker.get_job(&job_id).expect("job missing");
    for _ in 0..100 {
        job = tracker.get_job(&job_id).expect("job missing");
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(job.status, ImportStatus::Completed);
    assert_eq!(job.success_count, 1);
    assert_eq!(job.success_count + job.failure_count, job.total_rows);

    // 8. Delete, then the record is gone
    catalog.delete(book.id).await.expect("delete failed");
    assert!(catalog.get(book.id).await.is_err());
}
