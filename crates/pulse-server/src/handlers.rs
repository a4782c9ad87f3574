//! REST endpoint handlers for the metrics API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Static ok status, always open |
//! | `GET` | `/metrics/current` | Latest snapshot (bearer-gated) |
//! | `GET` | `/metrics/historical/{period}/{metric}` | Ordered series (bearer-gated) |
//! | `GET` | `/admin/status` | Viewer count + uptime (`admin` role) |
//!
//! Gating applies only when auth is enabled in configuration; the route
//! table is identical in both modes. Unknown `period`/`metric` values
//! fall back to hourly / active users rather than failing -- read paths
//! favor availability over strictness.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use pulse_core::generator::lock_generator;
use pulse_types::{Identity, MetricField, Resolution, SeriesPoint, Snapshot};

use crate::auth::AuthGate;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /health` -- static liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /metrics/current` -- the latest generated snapshot.
pub async fn current_snapshot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Snapshot>, ApiError> {
    authenticate(&state, &headers)?;
    let snapshot = lock_generator(&state.generator).current_snapshot();
    Ok(Json(snapshot))
}

/// `GET /metrics/historical/{period}/{metric}` -- one archive series,
/// ascending by bucket timestamp.
pub async fn historical_series(
    State(state): State<Arc<AppState>>,
    Path((period, metric)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Vec<SeriesPoint>>, ApiError> {
    authenticate(&state, &headers)?;
    let resolution = Resolution::parse_or_default(&period);
    let field = MetricField::parse_or_default(&metric);
    let series = lock_generator(&state.generator).historical_series(resolution, field);
    Ok(Json(series))
}

/// `GET /admin/status` -- viewer count and process uptime. Requires the
/// `admin` role when auth is enabled.
pub async fn admin_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(identity) = authenticate(&state, &headers)? {
        if !AuthGate::authorize(&identity, &["admin"]) {
            return Err(ApiError::Forbidden(String::from("admin role required")));
        }
    }
    Ok(Json(serde_json::json!({
        "clients": state.hub.viewer_count(),
        "uptimeSeconds": state.uptime_seconds(),
    })))
}

/// Checks the bearer credential when auth is enabled.
///
/// Returns `Ok(None)` when the gate is disabled, `Ok(Some(identity))` for
/// a verified caller, and [`ApiError::Unauthorized`] otherwise -- a gated
/// route never silently downgrades to anonymous access.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Option<Identity>, ApiError> {
    if !state.auth.enabled() {
        return Ok(None);
    }
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized(String::from("missing bearer token")))?;
    let identity = state
        .auth
        .validate_credential(token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    Ok(Some(identity))
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_malformed_authorization_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
