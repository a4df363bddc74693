use std::sync::Arc;

use tempfile::TempDir;

use dod_pilot::session::{
    Artifact, ArtifactKind, FsSessionStore, SessionError, SessionManager, SessionPhase,
    SessionStore,
};

async fn manager_at(dir: &TempDir, instance: &str) -> SessionManager {
    let store = FsSessionStore::new(dir.path());
    store.init().await.unwrap();
    SessionManager::new(Arc::new(store), instance)
}

#[tokio::test]
async fn test_full_lifecycle_survives_process_restart() {
    let dir = TempDir::new().unwrap();
    let manager = manager_at(&dir, "inst-a").await;

    let created = manager.create_session("m-001", "acme/widgets").await.unwrap();
    let id = created.session_id.clone();

    manager.update_phase(&id, SessionPhase::Planning).await.unwrap();
    manager.update_phase(&id, SessionPhase::Execution).await.unwrap();
    manager
        .add_artifact(&id, Artifact::new(ArtifactKind::Code, "src/auth.rs", "fn login() {}"))
        .await
        .unwrap();
    manager
        .add_error(&id, SessionError::new("agent_execution", "flaky test"))
        .await
        .unwrap();

    let mut state = manager.load_session(&id).await.unwrap().unwrap();
    state.iterations = 4;
    state.completed_tasks.push("login-flow".to_string());
    manager.save_session(&state).await.unwrap();

    // Fresh manager over the same directory, cold cache.
    let reopened = manager_at(&dir, "inst-b").await;
    let loaded = reopened.load_session(&id).await.unwrap().unwrap();

    assert_eq!(loaded.instance_id, "inst-a");
    assert_eq!(loaded.current_phase, SessionPhase::Execution);
    assert_eq!(loaded.iterations, 4);
    assert_eq!(loaded.completed_tasks, vec!["login-flow"]);
    assert_eq!(loaded.artifacts.len(), 1);
    assert_eq!(loaded.artifacts[0].path, "src/auth.rs");
    assert_eq!(loaded.artifacts[0].version, 1);
    assert!(loaded.artifacts[0].checksum.is_some());
    assert_eq!(loaded.errors.len(), 1);
    assert!(!loaded.errors[0].resolved);
}

#[tokio::test]
async fn test_checkpoint_history_is_append_only() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());
    store.init().await.unwrap();
    let store = Arc::new(store);
    let manager = SessionManager::new(store.clone(), "inst-a");

    let created = manager.create_session("m-001", "acme/widgets").await.unwrap();
    let id = created.session_id.clone();

    for iteration in 1..=3u32 {
        let mut state = manager.load_session(&id).await.unwrap().unwrap();
        state.iterations = iteration;
        manager.save_session(&state).await.unwrap();
        manager.checkpoint(&id).await.unwrap();
    }

    let history = store.list_checkpoints(&id).await.unwrap();
    assert_eq!(history.len(), 3);

    // Newest snapshot carries the latest data; older ones are untouched.
    let latest = store.latest_checkpoint(&id).await.unwrap().unwrap();
    assert_eq!(latest.iterations, 3);
}

#[tokio::test]
async fn test_recover_prefers_checkpoint_over_newer_record() {
    let dir = TempDir::new().unwrap();
    let manager = manager_at(&dir, "inst-a").await;

    let created = manager.create_session("m-001", "acme/widgets").await.unwrap();
    let id = created.session_id.clone();

    let mut state = manager.update_phase(&id, SessionPhase::Planning).await.unwrap();
    state.iterations = 2;
    manager.save_session(&state).await.unwrap();
    manager.checkpoint(&id).await.unwrap();

    // Work continued past the checkpoint before the "crash".
    let mut state = manager.load_session(&id).await.unwrap().unwrap();
    state.iterations = 5;
    manager.save_session(&state).await.unwrap();

    let fresh = manager_at(&dir, "inst-b").await;
    let recovered = fresh.recover(&id).await.unwrap();

    // The checkpoint snapshot wins, with its phase forced to ErrorRecovery.
    assert_eq!(recovered.iterations, 2);
    assert_eq!(recovered.current_phase, SessionPhase::ErrorRecovery);

    // The forced state replaced the primary record.
    let reloaded = fresh.load_session(&id).await.unwrap().unwrap();
    assert_eq!(reloaded.iterations, 2);
    assert_eq!(reloaded.current_phase, SessionPhase::ErrorRecovery);
}

#[tokio::test]
async fn test_checkpoint_histories_do_not_cross_sessions() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new({
        let s = FsSessionStore::new(dir.path());
        s.init().await.unwrap();
        s
    });
    let manager = SessionManager::new(store.clone(), "inst-a");

    let a = manager.create_session("m-001", "acme/widgets").await.unwrap();
    let b = manager.create_session("m-002", "acme/widgets").await.unwrap();

    manager.checkpoint(&a.session_id).await.unwrap();
    manager.checkpoint(&a.session_id).await.unwrap();
    manager.checkpoint(&b.session_id).await.unwrap();

    assert_eq!(store.list_checkpoints(&a.session_id).await.unwrap().len(), 2);
    assert_eq!(store.list_checkpoints(&b.session_id).await.unwrap().len(), 1);

    let latest_b = store.latest_checkpoint(&b.session_id).await.unwrap().unwrap();
    assert_eq!(latest_b.session_id, b.session_id);
}
