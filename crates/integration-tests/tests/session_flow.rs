//! Integration tests for the session gate and durable session storage.
//!
//! Run with: cargo test -p store-insights-integration-tests --test session_flow

#![allow(clippy::unwrap_used)]

use store_insights_client::{
    AuthError, AuthPayload, AuthState, Credentials, FileStorage, GatewayError, Registration,
    SessionGate, SessionStore,
};
use store_insights_integration_tests::{Endpoint, ScriptedBackend, tenant};

fn file_gate(path: &std::path::Path, backend: &ScriptedBackend) -> SessionGate<ScriptedBackend> {
    let store = SessionStore::open(FileStorage::new(path)).unwrap();
    SessionGate::new(backend.clone(), store)
}

#[tokio::test]
async fn test_session_survives_restart_until_logout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let backend = ScriptedBackend::new();

    let gate = file_gate(&path, &backend);
    assert!(!gate.is_authenticated());
    gate.login(&Credentials::new("owner@example.com", "hunter2"))
        .await
        .unwrap();

    let restarted = file_gate(&path, &backend);
    assert!(restarted.is_authenticated());
    assert_eq!(restarted.current_tenant(), Some(tenant()));
    assert_eq!(*restarted.subscribe().borrow(), AuthState::Authenticated);

    restarted.logout().unwrap();
    assert!(!restarted.is_authenticated());
    assert!(!path.exists());

    let after_logout = file_gate(&path, &backend);
    assert!(!after_logout.is_authenticated());
    assert_eq!(after_logout.current_tenant(), None);
    assert_eq!(backend.calls().count(Endpoint::Login), 1);
}

#[tokio::test]
async fn test_truncated_session_file_does_not_block_login() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, br#"{"token":"tok","user":"#).unwrap();
    let backend = ScriptedBackend::new();

    let gate = file_gate(&path, &backend);
    assert!(!gate.is_authenticated());
    assert!(!path.exists());

    gate.login(&Credentials::new("owner@example.com", "hunter2"))
        .await
        .unwrap();
    assert!(file_gate(&path, &backend).is_authenticated());
}

#[tokio::test]
async fn test_register_establishes_session() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::new();
    let gate = file_gate(&dir.path().join("session.json"), &backend);

    let session = gate
        .register(&Registration::new(
            "owner@example.com",
            "hunter2",
            "example.myshopify.com",
            "shpat_abc",
        ))
        .await
        .unwrap();
    assert_eq!(session.tenant.shop_domain, "example.myshopify.com");
    assert!(gate.is_authenticated());
}

#[tokio::test]
async fn test_register_with_missing_fields_sends_nothing() {
    let backend = ScriptedBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let gate = file_gate(&dir.path().join("session.json"), &backend);

    let err = gate
        .register(&Registration::new("", "hunter2", "example.myshopify.com", ""))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "email is required, accessToken is required");
    assert_eq!(backend.calls().count(Endpoint::Register), 0);
}

#[tokio::test]
async fn test_register_rejection_joins_messages_verbatim() {
    let backend = ScriptedBackend::new();
    backend.set_auth(Err(GatewayError::Api {
        status: 422,
        message: None,
        errors: vec![
            "Email has already been taken".to_string(),
            "Shop domain is invalid".to_string(),
        ],
    }));
    let dir = tempfile::tempdir().unwrap();
    let gate = file_gate(&dir.path().join("session.json"), &backend);

    let err = gate
        .register(&Registration::new(
            "owner@example.com",
            "hunter2",
            "bad domain",
            "shpat_abc",
        ))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Email has already been taken, Shop domain is invalid"
    );
    assert!(!gate.is_authenticated());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let backend = ScriptedBackend::new();
    backend.fail(Endpoint::Login);
    let dir = tempfile::tempdir().unwrap();
    let gate = file_gate(&dir.path().join("session.json"), &backend);

    let err = gate
        .login(&Credentials::new("owner@example.com", "hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
    assert!(!gate.is_authenticated());
}

#[tokio::test]
async fn test_relogin_replaces_tenant() {
    let backend = ScriptedBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let gate = file_gate(&path, &backend);
    gate.login(&Credentials::new("owner@example.com", "hunter2"))
        .await
        .unwrap();

    let other = store_insights_core::TenantProfile::new("ops@other.com", "other.myshopify.com");
    backend.set_auth(Ok(AuthPayload {
        token: Some("tok_other".to_string()),
        tenant: Some(other.clone()),
    }));
    gate.login(&Credentials::new("ops@other.com", "hunter3"))
        .await
        .unwrap();

    assert_eq!(gate.current_tenant(), Some(other.clone()));
    assert_eq!(file_gate(&path, &backend).current_tenant(), Some(other));
}
