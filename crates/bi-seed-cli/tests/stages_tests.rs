//! Stage tests against a mock API
//!
//! Each stage is driven directly through the library with a wiremock server
//! standing in for the application.

use bi_seed_cli::api::{Session, SupersetClient};
use bi_seed_cli::artifact::ArtifactKind;
use bi_seed_cli::config::{
    ArtifactExclusion, ArtifactFilter, Credentials, RunMode, Timeouts, DEFAULT_EXCLUDED_ARTIFACT,
};
use bi_seed_cli::connection::ConnectionEntry;
use bi_seed_cli::stages::connectivity::{ConnectivityCheck, ConnectivityTester};
use bi_seed_cli::stages::import::{import_artifacts, ImportOptions};
use bi_seed_cli::stages::register::register_connections;
use bi_seed_cli::stages::{auth, probe};
use bi_seed_cli::SeedError;
use bi_seed_common::RetryPolicy;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_partial_json, body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn quick(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::ZERO)
}

fn client(server: &MockServer) -> SupersetClient {
    SupersetClient::new(&server.uri(), Timeouts::default()).unwrap()
}

fn session(server: &MockServer) -> Session {
    Session::new(client(server), "access-1".to_string(), "csrf-1".to_string())
}

fn credentials() -> Credentials {
    Credentials {
        username: "superset_admin".to_string(),
        password: "superset".to_string(),
    }
}

fn write_bundle(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"PK\x03\x04bundle").unwrap();
}

/// File names of the uploads the server saw, in arrival order
async fn uploaded_names(server: &MockServer, candidates: &[&str]) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|request| {
            let body = String::from_utf8_lossy(&request.body);
            candidates
                .iter()
                .find(|name| body.contains(&format!("filename=\"{name}\"")))
                .map(|name| name.to_string())
        })
        .collect()
}

// ============================================================================
// Availability Probe
// ============================================================================

#[tokio::test]
async fn test_probe_accepts_method_not_allowed_first_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;

    assert!(probe::wait_for_api(&client(&server), &quick(5)).await);
}

#[tokio::test]
async fn test_probe_retries_until_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(probe::wait_for_api(&client(&server), &quick(5)).await);
}

#[tokio::test]
async fn test_probe_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = probe::require_api(&client(&server), &quick(3))
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::ApiUnavailable { attempts: 3, .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_unhealthy_login_endpoint_keeps_truncated_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(800)))
        .mount(&server)
        .await;

    let err = client(&server).check_login_endpoint().await.unwrap_err();
    match err {
        SeedError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, format!("{}...", "x".repeat(500)));
        },
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_authenticate_returns_both_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .and(body_partial_json(json!({
            "username": "superset_admin",
            "provider": "db",
            "refresh": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt-abc"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/csrf_token"))
        .and(header("Authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "csrf-xyz"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = auth::authenticate(&client(&server), &credentials(), &quick(3))
        .await
        .unwrap();
    assert_eq!(session.access_token(), "jwt-abc");
    assert_eq!(session.csrf_token(), "csrf-xyz");
}

#[tokio::test]
async fn test_csrf_failure_restarts_from_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt-abc"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/csrf_token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("session not ready"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/security/csrf_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "csrf-xyz"})))
        .mount(&server)
        .await;

    let session = auth::authenticate(&client(&server), &credentials(), &quick(3))
        .await
        .unwrap();
    assert_eq!(session.csrf_token(), "csrf-xyz");
}

#[tokio::test]
async fn test_authentication_exhausted_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/security/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Not authorized"})))
        .expect(2)
        .mount(&server)
        .await;

    let err = auth::authenticate(&client(&server), &credentials(), &quick(2))
        .await
        .unwrap_err();
    match &err {
        SeedError::AuthenticationFailed { attempts, last } => {
            assert_eq!(*attempts, 2);
            assert!(last.contains("401"));
        },
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_fatal());
}

// ============================================================================
// Connection Registration
// ============================================================================

#[tokio::test]
async fn test_registration_counts_malformed_spec_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/database/"))
        .and(header("Authorization", "Bearer access-1"))
        .and(header("X-CSRFToken", "csrf-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let entries = vec![
        ConnectionEntry::new(
            "CONNECTION_A",
            "Warehouse:5b1c6f0e-2d7a-4d1f-9a53-0c2f1e4a9b11:postgresql://bi:pw@db:5432/warehouse",
        ),
        ConnectionEntry::new("CONNECTION_B", "NoColonsAtAll"),
        ConnectionEntry::new(
            "CONNECTION_C",
            "Events:8e2a1c44-7f3b-4e0a-b6d2-19c5a7e3f001:mysql://bi:pw@events:3306/events",
        ),
    ];

    let report = register_connections(&session(&server), &entries, None).await;
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn test_duplicate_name_counts_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/database/"))
        .and(body_partial_json(json!({
            "database_name": "Warehouse",
            "allow_dml": true,
            "expose_in_sqllab": true
        })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": {"database_name": "A database with the same name already exists."}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let entries = vec![ConnectionEntry::new(
        "CONNECTION_A",
        "Warehouse:5b1c6f0e-2d7a-4d1f-9a53-0c2f1e4a9b11:postgresql://bi:pw@db:5432/warehouse",
    )];

    // A second run against the same instance reports no new failures
    for _ in 0..2 {
        let report = register_connections(&session(&server), &entries, None).await;
        assert_eq!(report.already_present, 1);
        assert_eq!(report.failure_count(), 0);
    }
}

#[tokio::test]
async fn test_other_rejection_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/database/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": {"sqlalchemy_uri": "Invalid connection string"}
        })))
        .mount(&server)
        .await;

    let entries = vec![ConnectionEntry::new("CONNECTION_A", "Bad:u1:nope://")];
    let report = register_connections(&session(&server), &entries, None).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.success_count(), 0);
}

#[tokio::test]
async fn test_unreachable_database_skipped_in_production() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/database/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let tester = ConnectivityTester::new(quick(2), Duration::from_secs(5));
    let entries = vec![ConnectionEntry::new(
        "CONNECTION_A",
        "Warehouse:5b1c6f0e-2d7a-4d1f-9a53-0c2f1e4a9b11:postgresql+psycopg2://bi:pw@127.0.0.1:1/warehouse",
    )];

    let report =
        register_connections(&session(&server), &entries, Some(&tester as &dyn ConnectivityCheck))
            .await;
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.success_count(), 0);
}

// ============================================================================
// Artifact Import
// ============================================================================

#[tokio::test]
async fn test_import_order_and_failure_isolation() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    for name in ["dataset_b.zip", "chart_a.zip", "dataset_a.zip", "notes.txt", "dataset_c.tar"] {
        write_bundle(dir.path(), name);
    }

    Mock::given(method("POST"))
        .and(path("/api/v1/dataset/import"))
        .and(body_string_contains("dataset_b.zip"))
        .respond_with(ResponseTemplate::new(500).set_body_string("import failed"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/dataset/import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "OK"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chart/import"))
        .and(body_string_contains("name=\"formData\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "OK"})))
        .expect(1)
        .mount(&server)
        .await;

    let report = import_artifacts(
        &session(&server),
        ImportOptions {
            dir: dir.path(),
            kinds: &ArtifactKind::IMPORT_ORDER,
            mode: RunMode::Development,
            filter: &ArtifactFilter::default(),
            overwrite: false,
        },
    )
    .await;

    assert_eq!(report.uploaded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.kinds.len(), 4);

    let order = uploaded_names(&server, &["dataset_a.zip", "dataset_b.zip", "chart_a.zip"]).await;
    assert_eq!(order, vec!["dataset_a.zip", "dataset_b.zip", "chart_a.zip"]);
}

#[tokio::test]
async fn test_legacy_export_excluded_only_in_production() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let legacy = format!("{DEFAULT_EXCLUDED_ARTIFACT}.zip");
    write_bundle(dir.path(), &legacy);
    write_bundle(dir.path(), "database_export_20260101T000000.zip");

    Mock::given(method("POST"))
        .and(path("/api/v1/database/import"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let filter = ArtifactFilter::legacy_default();
    let options = |mode| ImportOptions {
        dir: dir.path(),
        kinds: &[ArtifactKind::Database],
        mode,
        filter: &filter,
        overwrite: false,
    };

    let prod = import_artifacts(&session(&server), options(RunMode::Production)).await;
    assert_eq!(prod.uploaded(), 1);
    assert_eq!(prod.excluded(), 1);

    let dev = import_artifacts(&session(&server), options(RunMode::Development)).await;
    assert_eq!(dev.uploaded(), 2);
    assert_eq!(dev.excluded(), 0);
}

#[tokio::test]
async fn test_exclusion_only_skips_its_own_kind() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), "chart_legacy_revenue.zip");
    write_bundle(dir.path(), "chart_revenue.zip");
    write_bundle(dir.path(), "dataset_legacy_orders.zip");

    for kind in ["chart", "dataset"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/{kind}/import")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }

    let filter = ArtifactFilter {
        exclusions: vec![
            ArtifactExclusion::new(ArtifactKind::Chart, "chart_legacy"),
            // Bare prefixes are database-only, so this never hits the dataset bundle
            ArtifactExclusion::parse("dataset_legacy").unwrap(),
        ],
    };
    let report = import_artifacts(
        &session(&server),
        ImportOptions {
            dir: dir.path(),
            kinds: &[ArtifactKind::Dataset, ArtifactKind::Chart],
            mode: RunMode::Production,
            filter: &filter,
            overwrite: false,
        },
    )
    .await;

    assert_eq!(report.uploaded(), 2);
    assert_eq!(report.excluded(), 1);
    assert_eq!(report.kinds[1].kind, ArtifactKind::Chart);
    assert_eq!(report.kinds[1].excluded, 1);
}

#[tokio::test]
async fn test_overwrite_flag_sent_as_form_field() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), "dashboard_sales.zip");

    Mock::given(method("POST"))
        .and(path("/api/v1/dashboard/import"))
        .and(body_string_contains("name=\"overwrite\""))
        .and(header("X-CSRFToken", "csrf-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let report = import_artifacts(
        &session(&server),
        ImportOptions {
            dir: dir.path(),
            kinds: &[ArtifactKind::Dashboard],
            mode: RunMode::Development,
            filter: &ArtifactFilter::default(),
            overwrite: true,
        },
    )
    .await;
    assert_eq!(report.uploaded(), 1);
}
