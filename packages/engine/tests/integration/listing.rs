use std::sync::atomic::Ordering;

use common::storage::BlobStore;
use engine::EngineError;
use engine::service::Role;
use engine::submission::{UNKNOWN_SUBMITTER, UNKNOWN_TIME};

use crate::common::TestEngine;

#[tokio::test]
async fn admin_sees_all_submissions_with_payloads() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.register_target(200, "Dr. Park");

    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();
    engine.submit(11, "Bob", "b.pdf", 200).await.unwrap();

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.shown, 2);
    assert_eq!(report.items.len(), 2);
    assert!(report.items.iter().all(|item| item.payload.is_some()));
}

#[tokio::test]
async fn teacher_sees_only_their_routed_submissions() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.register_target(200, "Dr. Park");

    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();
    engine.submit(11, "Bob", "b.pdf", 200).await.unwrap();

    let report = engine
        .service
        .list_submissions(100, Role::Teacher)
        .await
        .unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.items[0].submission.file_name, "a.pdf");
    assert_eq!(report.items[0].submission.route_target, Some(100));
}

#[tokio::test]
async fn student_cannot_list() {
    let engine = TestEngine::new();
    let err = engine
        .service
        .list_submissions(10, Role::Student)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied));
}

#[tokio::test]
async fn metadata_outage_degrades_to_sentinel_provenance() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();

    engine.records.fail_read.store(true, Ordering::SeqCst);

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 1);
    let sub = &report.items[0].submission;
    assert_eq!(sub.submitter_name, UNKNOWN_SUBMITTER);
    assert_eq!(sub.submitted_at, UNKNOWN_TIME);
    assert!(report.items[0].payload.is_some());
}

#[tokio::test]
async fn blob_outage_still_lists_metadata_rows() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();

    engine.blobs.fail_list.store(true, Ordering::SeqCst);
    engine.blobs.fail_get.store(true, Ordering::SeqCst);

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 1);
    let item = &report.items[0];
    assert!(item.submission.missing_blob);
    assert_eq!(item.submission.submitter_name, "Alice");
    assert!(item.payload.is_none());
    assert!(item.fetch_error.as_deref().unwrap().contains("a.pdf"));
}

#[tokio::test]
async fn failed_payload_fetch_marks_item_not_listing() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();
    engine.submit(11, "Bob", "b.pdf", 100).await.unwrap();

    engine.blobs.fail_get.store(true, Ordering::SeqCst);

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.shown, 0);
    for item in &report.items {
        assert!(item.payload.is_none());
        let message = item.fetch_error.as_deref().unwrap();
        assert!(message.starts_with("Failed to display"));
        assert!(message.len() <= engine::error::MAX_USER_ERROR_LEN);
    }
}

#[tokio::test]
async fn metadata_only_rows_are_flagged_in_listing() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");

    engine.records.seed_row(vec![
        "Ghost".into(),
        "ghost.pdf".into(),
        "2024-01-01 10:00:00".into(),
        "https://rows/ghost.pdf".into(),
        "100".into(),
    ]);

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.shown, 0);
    let item = &report.items[0];
    assert!(item.submission.missing_blob);
    assert!(
        item.fetch_error
            .as_deref()
            .unwrap()
            .contains("missing from the blob store")
    );
}

#[tokio::test]
async fn metadata_only_rows_do_not_block_resubmission() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");

    engine.records.seed_row(vec![
        "Ghost".into(),
        "ghost.pdf".into(),
        "2024-01-01 10:00:00".into(),
        "https://rows/ghost.pdf".into(),
        "100".into(),
    ]);
    engine.service.rebuild().await;

    // The row has no blob behind it, so the name is free to take.
    let submission = engine.submit(10, "Alice", "ghost.pdf", 100).await.unwrap();
    assert_eq!(submission.submitter_name, "Alice");
}

#[tokio::test]
async fn listing_rebuild_reflects_out_of_band_edits() {
    let engine = TestEngine::new();
    engine.register_target(100, "Dr. Chen");
    engine.submit(10, "Alice", "a.pdf", 100).await.unwrap();

    // A blob stored behind the engine's back joins the view on rebuild.
    engine.blobs.put("late.pdf", b"late", "application/pdf").await.unwrap();

    let report = engine.service.list_submissions(1, Role::Admin).await.unwrap();
    assert_eq!(report.total, 2);
    let late = report
        .items
        .iter()
        .find(|item| item.submission.file_name == "late.pdf")
        .unwrap();
    assert_eq!(late.submission.submitter_name, UNKNOWN_SUBMITTER);
}
