//! The retrieval endpoint: `GET /file`.
//!
//! Every request passes the access gate first. A win is logged once and
//! served; anything that fails after the gate collapses to an opaque 404 so
//! unauthorized probers learn nothing about which ids exist.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use store::{AccessAction, StoreError};

use crate::access::{self, AccessRequest};
use crate::state::State as ServiceState;

#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveParams {
    /// Numeric entry id or link string.
    pub id: String,
    /// One of download, preview, inline. Defaults to download.
    #[serde(default)]
    pub action: Option<String>,
    /// Remote-access token.
    #[serde(default)]
    pub token: Option<String>,
    /// Serve a derived preview when one is available. Defaults to true.
    #[serde(default)]
    pub thumbnail: Option<bool>,
    /// Suppress intermediary caching of the response.
    #[serde(default)]
    pub nocache: Option<bool>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Query(params): Query<RetrieveParams>,
) -> Response {
    let actor = state.session().actor(&headers).await;

    // an action outside the closed set can never match a policy
    let action = match params.action.as_deref() {
        None => AccessAction::Download,
        Some(raw) => match AccessAction::parse(raw) {
            Ok(action) => action,
            Err(_) => return unauthorized(),
        },
    };

    // resolution for the token check never throws; any failure is simply a
    // request the remote policy cannot authorize
    let file_id = state
        .registry()
        .resolve_link(&params.id)
        .await
        .ok()
        .flatten();

    let request = AccessRequest {
        id: params.id.clone(),
        file_id,
        action,
        token: params.token.clone(),
        actor,
    };

    if !access::evaluate(&state.policies(), &request).await {
        return unauthorized();
    }

    match serve(&state, &params, action, actor, &headers).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(id = %params.id, error = %err, "retrieval failed");
            not_found()
        }
    }
}

async fn serve(
    state: &ServiceState,
    params: &RetrieveParams,
    action: AccessAction,
    actor: Option<i64>,
    headers: &HeaderMap,
) -> Result<Response, StoreError> {
    let entry = state.registry().retrieve(&params.id).await?;
    let record = state.registry().content().record(entry.content_id).await?;
    let bytes = state.registry().content().get(entry.content_id).await?;

    // audit exactly once per served request; a failed write must not block
    // content delivery, but it is worth an operator's attention
    let (ip, host) = client_meta(headers);
    if let Err(err) = state
        .log()
        .record(entry.id, action, actor, &ip, &host, None)
        .await
    {
        tracing::error!(file_id = entry.id, error = %err, "access log write failed");
    }

    let mut disposition = "attachment";
    let mut mime = record.mime_type;
    let mut name = entry.name;
    let mut body = bytes;

    match action {
        AccessAction::Preview => {
            disposition = "inline";
            if params.thumbnail.unwrap_or(true) {
                if let Some(thumb) = state.thumbnail(&body, &mime) {
                    mime = thumb.mime_type;
                    name = thumb.name;
                    body = thumb.bytes;
                }
            }
        }
        AccessAction::Inline => disposition = "inline",
        AccessAction::Download => {}
    }

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&mime) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    if let Ok(value) = HeaderValue::from_str(&format!("{}; filename=\"{}\"", disposition, name)) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if params.nocache.unwrap_or(false) {
        response_headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        response_headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }

    Ok((StatusCode::OK, response_headers, Body::from(body)).into_response())
}

/// Client address metadata for the access log, from proxy headers.
fn client_meta(headers: &HeaderMap) -> (String, String) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let host = headers
        .get("x-forwarded-host")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| ip.clone());

    (ip, host)
}

/// Opaque denial: no hint whether the id exists.
fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "no access to file").into_response()
}

/// Opaque absence: malformed id, deleted entry and missing content are
/// indistinguishable from outside.
fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}
