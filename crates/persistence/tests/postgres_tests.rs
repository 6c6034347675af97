//! PostgreSQL backend integration tests.
//!
//! Configuration tests need no database. The isolation tests run against the
//! database named by `WORKFORCE_TEST_PG_URL` and are skipped when it is unset.
//! The URL's role must not be a superuser or hold `BYPASSRLS`.
//!
//! Run with: `cargo test -p workforce-persistence --features postgres -- postgres`

#![cfg(feature = "postgres")]

use std::sync::Arc;

use serde_json::json;

use workforce_persistence::backends::postgres::{PostgresBackend, PostgresConfig, PostgresSslMode};
use workforce_persistence::core::{Backend, BackendKind, RecordStorage, TenantDirectory};
use workforce_persistence::tenant::{TenantContext, TenantId};
use workforce_persistence::types::{Pagination, RecordKind};

// ============================================================================
// Configuration (no PostgreSQL instance required)
// ============================================================================

#[test]
fn test_postgres_config_serialization() {
    let config = PostgresConfig {
        host: "pg-server".to_string(),
        port: 5433,
        password: Some("secret".to_string()),
        ssl_mode: PostgresSslMode::Require,
        ..Default::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: PostgresConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.host, "pg-server");
    assert_eq!(deserialized.port, 5433);
    assert_eq!(deserialized.password, Some("secret".to_string()));
    assert_eq!(deserialized.ssl_mode, PostgresSslMode::Require);
}

#[test]
fn test_postgres_backend_kind() {
    assert_eq!(format!("{}", BackendKind::Postgres), "postgres");
}

// ============================================================================
// Isolation (requires WORKFORCE_TEST_PG_URL)
// ============================================================================

async fn backend(max_connections: usize) -> Option<PostgresBackend> {
    let url = std::env::var("WORKFORCE_TEST_PG_URL").ok()?;
    let config = PostgresConfig {
        max_connections,
        ..PostgresConfig::from_url(&url)
    };
    let backend = PostgresBackend::new(config).await.expect("connect");
    backend.init_schema().await.expect("init schema");
    Some(backend)
}

/// A tenant id unique to this test run so reruns start empty.
fn tenant(prefix: &str) -> TenantContext {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    TenantContext::new(TenantId::new(format!("{}-{}", prefix, &suffix[..8])))
}

#[tokio::test]
async fn test_postgres_health_check() {
    let Some(backend) = backend(2).await else {
        return;
    };
    backend.health_check().await.unwrap();
}

#[tokio::test]
async fn test_postgres_tenants_are_isolated() {
    let Some(backend) = backend(4).await else {
        return;
    };
    let acme = tenant("acme");
    let globex = tenant("globex");
    for ctx in [&acme, &globex] {
        backend.ensure_tenant(ctx.tenant_id()).await.unwrap();
    }

    backend
        .create(&acme, RecordKind::Employee, json!({ "id": "e1", "name": "Ada" }))
        .await
        .unwrap();
    backend
        .create(&globex, RecordKind::Employee, json!({ "id": "e1", "name": "Grace" }))
        .await
        .unwrap();

    let ada = backend.read(&acme, RecordKind::Employee, "e1").await.unwrap().unwrap();
    assert_eq!(ada.data()["name"], "Ada");
    assert_eq!(backend.count(&acme, None).await.unwrap(), 1);
    assert_eq!(backend.count(&globex, None).await.unwrap(), 1);

    backend.delete(&globex, RecordKind::Employee, "e1").await.unwrap();
    assert!(backend.read(&acme, RecordKind::Employee, "e1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_postgres_single_connection_never_leaks() {
    let Some(backend) = backend(1).await else {
        return;
    };
    let backend = Arc::new(backend);
    let tenants = [tenant("acme"), tenant("globex")];
    for ctx in &tenants {
        backend.ensure_tenant(ctx.tenant_id()).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let backend = Arc::clone(&backend);
        let ctx = tenants[i % 2].clone();
        handles.push(tokio::spawn(async move {
            backend
                .create(&ctx, RecordKind::Position, json!({ "seq": i }))
                .await
                .map(|record| record.tenant_id() == ctx.tenant_id())
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    for ctx in &tenants {
        let page = backend
            .list(ctx, RecordKind::Position, &Pagination::new(0, 50))
            .await
            .unwrap();
        assert_eq!(page.total, 10);
        assert!(page.items.iter().all(|r| r.tenant_id() == ctx.tenant_id()));
    }
}
