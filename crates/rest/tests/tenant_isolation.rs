//! End-to-end tenant isolation over HTTP.
//!
//! Requests carry HS256 bearer tokens signed with the testing secret; the
//! gate resolves the tenant from their claims.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tempfile::TempDir;

use workforce_persistence::backends::sqlite::{SqliteBackend, SqliteBackendConfig};
use workforce_persistence::core::TenantDirectory;
use workforce_persistence::tenant::{TenantId, TenantStatus};
use workforce_rest::{AppState, ServerConfig, TenantFallbackPolicy};

fn config() -> ServerConfig {
    ServerConfig::for_testing()
}

fn server_with(backend: Arc<SqliteBackend>, config: ServerConfig) -> TestServer {
    let state = AppState::new(backend, config);
    let app = workforce_rest::routing::create_routes(state);
    TestServer::new(app).expect("Failed to create test server")
}

fn create_test_server(config: ServerConfig) -> (TestServer, Arc<SqliteBackend>) {
    let backend = Arc::new(SqliteBackend::in_memory().expect("Failed to create SQLite backend"));
    (server_with(Arc::clone(&backend), config), backend)
}

fn exp() -> i64 {
    (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp()
}

fn sign(claims: Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

fn token(claims: Value) -> String {
    let secret = config().tenancy.jwt_secret.expect("testing secret");
    sign(claims, &secret)
}

fn token_for(tenant: &str) -> String {
    token(json!({ "sub": format!("user@{}", tenant), "tenant": tenant, "exp": exp() }))
}

// =============================================================================
// Isolation
// =============================================================================

#[tokio::test]
async fn test_tenants_see_only_their_own_records() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");
    let globex = token_for("globex");

    let created = server
        .post("/api/v1/employees")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "e1", "name": "Ada" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.header("location"), "/api/v1/employees/e1");

    server
        .get("/api/v1/employees/e1")
        .authorization_bearer(&acme)
        .await
        .assert_status_ok();

    let foreign = server
        .get("/api/v1/employees/e1")
        .authorization_bearer(&globex)
        .await;
    foreign.assert_status(StatusCode::NOT_FOUND);

    let listed: Value = server
        .get("/api/v1/employees")
        .authorization_bearer(&globex)
        .await
        .json();
    assert_eq!(listed["total"], 0);
    assert_eq!(listed["items"], json!([]));
}

#[tokio::test]
async fn test_same_local_id_in_two_tenants() {
    let (server, _backend) = create_test_server(config());

    for (tenant, name) in [("acme", "Ada"), ("globex", "Grace")] {
        server
            .post("/api/v1/employees")
            .authorization_bearer(token_for(tenant))
            .json(&json!({ "id": "e1", "name": name }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let ada: Value = server
        .get("/api/v1/employees/e1")
        .authorization_bearer(token_for("acme"))
        .await
        .json();
    let grace: Value = server
        .get("/api/v1/employees/e1")
        .authorization_bearer(token_for("globex"))
        .await
        .json();

    assert_eq!(ada["data"]["name"], "Ada");
    assert_eq!(grace["data"]["name"], "Grace");
}

#[tokio::test]
async fn test_foreign_update_and_delete_look_like_missing() {
    let (server, _backend) = create_test_server(config());

    server
        .post("/api/v1/positions")
        .authorization_bearer(token_for("acme"))
        .json(&json!({ "id": "p1", "title": "Engineer" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .put("/api/v1/positions/p1")
        .authorization_bearer(token_for("globex"))
        .json(&json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .delete("/api/v1/positions/p1")
        .authorization_bearer(token_for("globex"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let kept: Value = server
        .get("/api/v1/positions/p1")
        .authorization_bearer(token_for("acme"))
        .await
        .json();
    assert_eq!(kept["data"]["title"], "Engineer");
}

#[tokio::test]
async fn test_alternating_tenants_on_one_connection() {
    let dir = TempDir::new().expect("tempdir");
    let backend = SqliteBackend::with_config(
        dir.path().join("workforce.db"),
        SqliteBackendConfig {
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        },
    )
    .expect("Failed to open SQLite backend");
    let server = server_with(Arc::new(backend), config());

    for i in 0..10 {
        let tenant = if i % 2 == 0 { "acme" } else { "globex" };
        server
            .post("/api/v1/org-units")
            .authorization_bearer(token_for(tenant))
            .json(&json!({ "name": format!("unit-{}", i) }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    for tenant in ["acme", "globex"] {
        let page: Value = server
            .get("/api/v1/org-units")
            .authorization_bearer(token_for(tenant))
            .await
            .json();
        assert_eq!(page["total"], 5);
        assert_eq!(page["items"].as_array().map(Vec::len), Some(5));
    }
}

// =============================================================================
// Resolution and fallback
// =============================================================================

#[tokio::test]
async fn test_missing_tenant_claim_is_rejected_by_default() {
    let (server, _backend) = create_test_server(config());

    let response = server
        .get("/api/v1/employees")
        .authorization_bearer(token(json!({ "sub": "svc", "exp": exp() })))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_no_credential_is_rejected_by_default() {
    let (server, _backend) = create_test_server(config());

    server
        .get("/api/v1/employees")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_default_tenant_policy_admits_unclaimed_requests() {
    let mut config = config();
    config.tenancy.fallback = TenantFallbackPolicy::DefaultTenant;
    let (server, _backend) = create_test_server(config);

    let body: Value = server
        .get("/api/v1/tenant")
        .authorization_bearer(token(json!({ "sub": "svc", "exp": exp() })))
        .await
        .json();

    assert_eq!(body["id"], "demo-tenant");
    assert_eq!(body["resolved_from"], "default");
}

#[tokio::test]
async fn test_non_canonical_default_tenant_is_normalized() {
    let mut config = config();
    config.port = 8080;
    config.tenancy.fallback = TenantFallbackPolicy::DefaultTenant;
    config.tenancy.default_tenant = "Demo Tenant".to_string();
    assert!(config.validate().is_ok());
    let (server, _backend) = create_test_server(config);

    let response = server
        .get("/api/v1/tenant")
        .authorization_bearer(token(json!({ "sub": "svc", "exp": exp() })))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["id"], "demo-tenant");
    assert_eq!(body["resolved_from"], "default");
}

#[tokio::test]
async fn test_email_domain_resolution() {
    let (server, _backend) = create_test_server(config());

    let response = server
        .get("/api/v1/tenant")
        .authorization_bearer(token(json!({
            "sub": "u-42",
            "email": "ada@Corp.X.io",
            "exp": exp()
        })))
        .add_header("x-request-id", "req-42")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["id"], "corp-x-io");
    assert_eq!(body["resolved_from"], "email-domain");
    assert_eq!(body["user_id"], "u-42");
    assert_eq!(body["correlation_id"], "req-42");
}

#[tokio::test]
async fn test_namespaced_claim_wins_over_plain_claim() {
    let (server, _backend) = create_test_server(config());

    let body: Value = server
        .get("/api/v1/tenant")
        .authorization_bearer(token(json!({
            "https://workforce.app/tenant": "initech",
            "tenant": "acme",
            "exp": exp()
        })))
        .await
        .json();

    assert_eq!(body["id"], "initech");
    assert_eq!(body["resolved_from"], "namespaced-tenant-claim");
}

// =============================================================================
// Credentials
// =============================================================================

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (server, _backend) = create_test_server(config());
    let expired = (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp();

    server
        .get("/api/v1/employees")
        .authorization_bearer(token(json!({ "tenant": "acme", "exp": expired })))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signature_is_rejected() {
    let (server, _backend) = create_test_server(config());
    let forged = sign(
        json!({ "tenant": "acme", "exp": exp() }),
        "another-secret-that-is-also-32-bytes-long",
    );

    server
        .get("/api/v1/employees")
        .authorization_bearer(forged)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_header_is_rejected() {
    let (server, _backend) = create_test_server(config());

    server
        .get("/api/v1/employees")
        .add_header("authorization", "Basic dXNlcjpwYXNz")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Admission
// =============================================================================

#[tokio::test]
async fn test_first_request_provisions_tenant() {
    let (server, backend) = create_test_server(config());
    let tenant_id = TenantId::new("acme");

    assert!(backend.get_tenant(&tenant_id).await.unwrap().is_none());

    server
        .get("/api/v1/employees")
        .authorization_bearer(token_for("acme"))
        .await
        .assert_status_ok();

    let record = backend.get_tenant(&tenant_id).await.unwrap().unwrap();
    assert!(record.is_active());
}

#[tokio::test]
async fn test_unknown_tenant_refused_without_auto_provisioning() {
    let mut config = config();
    config.tenancy.auto_provision = false;
    let (server, backend) = create_test_server(config);

    server
        .get("/api/v1/employees")
        .authorization_bearer(token_for("acme"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    backend.ensure_tenant(&TenantId::new("acme")).await.unwrap();

    server
        .get("/api/v1/employees")
        .authorization_bearer(token_for("acme"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_suspended_tenant_is_forbidden() {
    let (server, backend) = create_test_server(config());
    let tenant_id = TenantId::new("acme");

    backend.ensure_tenant(&tenant_id).await.unwrap();
    backend
        .set_status(&tenant_id, TenantStatus::Suspended)
        .await
        .unwrap();

    let response = server
        .get("/api/v1/employees")
        .authorization_bearer(token_for("acme"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    server
        .get("/api/v1/employees")
        .authorization_bearer(token_for("globex"))
        .await
        .assert_status_ok();
}

// =============================================================================
// Records
// =============================================================================

#[tokio::test]
async fn test_location_encodes_caller_chosen_id() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");

    let created = server
        .post("/api/v1/employees")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "ops/night shift", "name": "Ada" }))
        .await;
    created.assert_status(StatusCode::CREATED);

    let location = created.header("location");
    let location = location.to_str().expect("ascii location");
    assert_eq!(location, "/api/v1/employees/ops%2Fnight%20shift");

    let read: Value = server.get(location).authorization_bearer(&acme).await.json();
    assert_eq!(read["id"], "ops/night shift");
    assert_eq!(read["data"]["name"], "Ada");
}

#[tokio::test]
async fn test_update_honors_if_match() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");

    let created = server
        .post("/api/v1/assignments")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "a1", "fte": 1.0 }))
        .await;
    assert_eq!(created.header("etag"), "\"1\"");

    let updated = server
        .put("/api/v1/assignments/a1")
        .authorization_bearer(&acme)
        .add_header("if-match", "\"1\"")
        .json(&json!({ "fte": 0.5 }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.header("etag"), "\"2\"");

    server
        .put("/api/v1/assignments/a1")
        .authorization_bearer(&acme)
        .add_header("if-match", "\"1\"")
        .json(&json!({ "fte": 0.8 }))
        .await
        .assert_status(StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_duplicate_local_id_conflicts_within_tenant() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");

    server
        .post("/api/v1/employees")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "e1" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .post("/api/v1/employees")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "e1" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_then_read() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");

    server
        .post("/api/v1/salary-history")
        .authorization_bearer(&acme)
        .json(&json!({ "id": "s1", "amount": 100 }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete("/api/v1/salary-history/s1")
        .authorization_bearer(&acme)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/v1/salary-history/s1")
        .authorization_bearer(&acme)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination() {
    let (server, _backend) = create_test_server(config());
    let acme = token_for("acme");

    for i in 0..5 {
        server
            .post("/api/v1/employees")
            .authorization_bearer(&acme)
            .json(&json!({ "id": format!("e{}", i) }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page: Value = server
        .get("/api/v1/employees")
        .add_query_param("page", 1)
        .add_query_param("page_size", 2)
        .authorization_bearer(&acme)
        .await
        .json();

    assert_eq!(page["total"], 5);
    assert_eq!(page["page"], 1);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(2));

    server
        .get("/api/v1/employees")
        .add_query_param("page_size", 0)
        .authorization_bearer(&acme)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_kind_is_bad_request() {
    let (server, _backend) = create_test_server(config());

    server
        .get("/api/v1/payroll")
        .authorization_bearer(token_for("acme"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_is_not_gated() {
    let (server, _backend) = create_test_server(config());

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "sqlite");
}

#[tokio::test]
async fn test_full_app_echoes_request_id() {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    let app = workforce_rest::create_app_with_config(backend, config());
    let server = TestServer::new(app).expect("Failed to create test server");

    let response = server
        .get("/api/v1/tenant")
        .authorization_bearer(token_for("acme"))
        .add_header("x-request-id", "trace-me")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "trace-me");

    let body: Value = response.json();
    assert_eq!(body["correlation_id"], "trace-me");
}
