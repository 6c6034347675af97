//! Record handlers.
//!
//! CRUD over tenant-owned HR records: `[base]/api/v1/{kind}[/{id}]`, where
//! `kind` is one of `employees`, `positions`, `org-units`, `assignments`,
//! `salary-history`.
//!
//! Handlers pass the gate's [`TenantContext`] to storage and never add a
//! tenant filter of their own. A record owned by another tenant is reported
//! exactly like a missing one.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use workforce_persistence::core::{RecordStorage, TenantDirectory};
use workforce_persistence::error::StorageError;
use workforce_persistence::types::{Page, RecordKind, StoredRecord};

use crate::error::{RestError, RestResult};
use crate::extractors::{PageParams, TenantExtractor};
use crate::state::AppState;

/// JSON representation of a stored record.
#[derive(Debug, Serialize)]
pub struct RecordBody {
    /// Local id within the tenant.
    pub id: String,
    /// Record kind path name.
    pub kind: RecordKind,
    /// Current version.
    pub version: u64,
    /// The record document.
    pub data: Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<StoredRecord> for RecordBody {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.local_id().to_string(),
            kind: record.kind(),
            version: record.version(),
            created_at: record.created_at(),
            updated_at: record.updated_at(),
            data: record.into_data(),
        }
    }
}

fn parse_kind(kind: &str) -> RestResult<RecordKind> {
    kind.parse::<RecordKind>()
        .map_err(|e| RestError::from(StorageError::from(e)))
}

fn body(payload: Result<Json<Value>, JsonRejection>) -> RestResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| RestError::BadRequest {
            message: e.body_text(),
        })
}

/// Parses `If-Match: "<version>"` (weak tags accepted).
fn if_match_version(headers: &HeaderMap) -> RestResult<Option<u64>> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .map(|v| v.trim().trim_start_matches("W/").trim_matches('"'))
        .and_then(|v| v.parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| RestError::BadRequest {
            message: "If-Match must be a quoted record version".to_string(),
        })
}

fn with_etag(status: StatusCode, record: StoredRecord) -> Response {
    let etag = HeaderValue::from_str(&record.etag()).ok();
    let mut response = (status, Json(RecordBody::from(record))).into_response();
    if let Some(etag) = etag {
        response.headers_mut().insert(header::ETAG, etag);
    }
    response
}

/// Handler for listing records of a kind.
///
/// `GET [base]/api/v1/{kind}?page=&page_size=`
pub async fn list_handler<S>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
    tenant: TenantExtractor,
    PageParams(pagination): PageParams,
) -> RestResult<Json<Page<RecordBody>>>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let kind = parse_kind(&kind)?;
    debug!(kind = %kind, page = pagination.page, "Processing list request");

    let page = state
        .storage()
        .list(tenant.context(), kind, &pagination)
        .await?;

    Ok(Json(page.map(RecordBody::from)))
}

/// Handler for creating a record.
///
/// `POST [base]/api/v1/{kind}`
///
/// # Response
///
/// - `201 Created` - with `Location` and `ETag`
/// - `409 Conflict` - the requested `"id"` is taken in this tenant
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
    tenant: TenantExtractor,
    payload: Result<Json<Value>, JsonRejection>,
) -> RestResult<Response>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let kind = parse_kind(&kind)?;
    let data = body(payload)?;

    let record = state.storage().create(tenant.context(), kind, data).await?;
    debug!(kind = %kind, id = %record.local_id(), "Created record");

    let location = format!("/api/v1/{}/{}", kind, urlencoding::encode(record.local_id()));
    let mut response = with_etag(StatusCode::CREATED, record);
    if let Ok(location) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

/// Handler for reading a record.
///
/// `GET [base]/api/v1/{kind}/{id}`
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path((kind, id)): Path<(String, String)>,
    tenant: TenantExtractor,
) -> RestResult<Response>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let kind = parse_kind(&kind)?;

    let record = state
        .storage()
        .read(tenant.context(), kind, &id)
        .await?
        .ok_or_else(|| RestError::NotFound {
            kind: kind.to_string(),
            id: id.clone(),
        })?;

    Ok(with_etag(StatusCode::OK, record))
}

/// Handler for replacing a record.
///
/// `PUT [base]/api/v1/{kind}/{id}`
///
/// An `If-Match` header makes the update conditional on the current version.
pub async fn update_handler<S>(
    State(state): State<AppState<S>>,
    Path((kind, id)): Path<(String, String)>,
    tenant: TenantExtractor,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> RestResult<Response>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let kind = parse_kind(&kind)?;
    let expected_version = if_match_version(&headers)?;
    let data = body(payload)?;

    let record = state
        .storage()
        .update(tenant.context(), kind, &id, data, expected_version)
        .await?;

    Ok(with_etag(StatusCode::OK, record))
}

/// Handler for deleting a record.
///
/// `DELETE [base]/api/v1/{kind}/{id}`
pub async fn delete_handler<S>(
    State(state): State<AppState<S>>,
    Path((kind, id)): Path<(String, String)>,
    tenant: TenantExtractor,
) -> RestResult<StatusCode>
where
    S: RecordStorage + TenantDirectory + Send + Sync,
{
    let kind = parse_kind(&kind)?;
    state.storage().delete(tenant.context(), kind, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
