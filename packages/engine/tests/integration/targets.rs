use engine::EngineError;

use crate::common::{ADMIN_ID, TestEngine};

#[tokio::test]
async fn admin_registers_target() {
    let engine = TestEngine::new();
    let target = engine
        .service
        .register_target(100, "Dr. Chen", ADMIN_ID)
        .unwrap();
    assert_eq!(target.target_id, 100);
    assert_eq!(target.display_name, "Dr. Chen");
    assert!(engine.service.registry().contains(100));
}

#[tokio::test]
async fn non_admin_cannot_register() {
    let engine = TestEngine::new();
    let err = engine
        .service
        .register_target(100, "Dr. Chen", 999)
        .unwrap_err();
    assert!(matches!(err, EngineError::PermissionDenied));
    assert!(engine.service.registry().is_empty());
}

#[tokio::test]
async fn duplicate_target_id_is_rejected() {
    let engine = TestEngine::new();
    engine.register_target(100, "First");

    let err = engine
        .service
        .register_target(100, "Second", ADMIN_ID)
        .unwrap_err();
    assert!(matches!(err, EngineError::TargetExists { target_id: 100 }));
    assert_eq!(
        engine.service.registry().get(100).unwrap().display_name,
        "First"
    );
}

#[tokio::test]
async fn blank_target_name_is_rejected() {
    let engine = TestEngine::new();
    let err = engine
        .service
        .register_target(100, "   ", ADMIN_ID)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
}

#[tokio::test]
async fn targets_are_prompted_in_id_order() {
    let engine = TestEngine::new();
    engine.register_target(200, "Dr. Park");
    engine.register_target(100, "Dr. Chen");

    let targets = engine
        .service
        .handle_upload(10, "Alice", "a.pdf", "application/pdf", b"x".to_vec())
        .await
        .unwrap();
    let ids: Vec<i64> = targets.iter().map(|t| t.target_id).collect();
    assert_eq!(ids, vec![100, 200]);
}
