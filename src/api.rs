//! Client for the marina CRUD service.
//!
//! [`MarinaApi`] is the seam the session talks to; [`HttpApi`] implements it
//! over HTTP/JSON. Every request carries a fresh `x-request-id` that is
//! logged with the outcome. Transport failures surface as [`ApiError`] and
//! are converted into the editor's `LoadError` / `SyncError` at the call site.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::{Duration, Instant};

use canvas::doc::{BoatId, BoatRecord, MapId, MapRecord, MapWithBoatsRecord, NewPosition, PlacementPatch, PositionRecord};
use canvas::error::{LoadError, SyncError};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect error, timeout, reset).
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_RESPONSE",
            Self::Parse(_) => "E_API_PARSE",
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map onto a load failure for `map_id`.
    #[must_use]
    pub fn into_load_error(self, map_id: MapId) -> LoadError {
        match self.status() {
            Some(404) => LoadError::NotFound(map_id),
            _ => LoadError::NetworkFailure(self.to_string()),
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status: 404, .. } => Self::NotFound,
            ApiError::Status { status: 409, detail } => Self::Conflict(detail),
            ApiError::Status { status: 400 | 422, detail } => Self::ValidationRejected(detail),
            other => Self::NetworkFailure(other.to_string()),
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// The CRUD operations the editor consumes.
#[async_trait::async_trait]
pub trait MarinaApi: Send + Sync {
    /// `GET /maps`, optionally restricted to active maps.
    async fn list_maps(&self, active_only: bool) -> Result<Vec<MapRecord>, ApiError>;

    /// `GET /maps/{id}`.
    async fn get_map(&self, map_id: MapId) -> Result<MapRecord, ApiError>;

    /// `GET /maps/{id}/with-boats`: the map plus its placements in draw order.
    async fn get_map_with_boats(&self, map_id: MapId) -> Result<MapWithBoatsRecord, ApiError>;

    /// `GET /boats/{id}`.
    async fn get_boat(&self, boat_id: BoatId) -> Result<BoatRecord, ApiError>;

    /// `POST /positions`.
    async fn create_position(&self, body: &NewPosition) -> Result<PositionRecord, ApiError>;

    /// `PUT /positions/{id}` with only the fields to change.
    async fn update_position(&self, position_id: i64, patch: &PlacementPatch) -> Result<PositionRecord, ApiError>;

    /// `DELETE /positions/{id}`.
    async fn delete_position(&self, position_id: i64) -> Result<(), ApiError>;

    /// `POST /boats/{boat_id}/assign/{position_id}`.
    async fn assign_boat(&self, boat_id: BoatId, position_id: i64) -> Result<BoatRecord, ApiError>;

    /// `POST /boats/{boat_id}/unassign`.
    async fn unassign_boat(&self, boat_id: BoatId) -> Result<BoatRecord, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend cannot be initialised.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            token: config.api_token.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<String, ApiError> {
        let request_id = Uuid::new_v4();
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), &url).header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(%request_id, %method, path, error = %e, "api: request failed");
            ApiError::Request(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !(200..300).contains(&status) {
            warn!(%request_id, %method, path, status, elapsed_ms, "api: error status");
            return Err(ApiError::Status { status, detail: error_detail(&text) });
        }
        debug!(%request_id, %method, path, status, elapsed_ms, "api: ok");
        Ok(text)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let text = self.send(method, path, body).await?;
        parse_body(&text)
    }
}

#[async_trait::async_trait]
impl MarinaApi for HttpApi {
    async fn list_maps(&self, active_only: bool) -> Result<Vec<MapRecord>, ApiError> {
        self.call(Method::GET, &format!("/maps?active_only={active_only}"), None).await
    }

    async fn get_map(&self, map_id: MapId) -> Result<MapRecord, ApiError> {
        self.call(Method::GET, &format!("/maps/{map_id}"), None).await
    }

    async fn get_map_with_boats(&self, map_id: MapId) -> Result<MapWithBoatsRecord, ApiError> {
        self.call(Method::GET, &format!("/maps/{map_id}/with-boats"), None).await
    }

    async fn get_boat(&self, boat_id: BoatId) -> Result<BoatRecord, ApiError> {
        self.call(Method::GET, &format!("/boats/{boat_id}"), None).await
    }

    async fn create_position(&self, body: &NewPosition) -> Result<PositionRecord, ApiError> {
        self.call(Method::POST, "/positions", Some(encode(body)?)).await
    }

    async fn update_position(&self, position_id: i64, patch: &PlacementPatch) -> Result<PositionRecord, ApiError> {
        self.call(Method::PUT, &format!("/positions/{position_id}"), Some(encode(patch)?)).await
    }

    async fn delete_position(&self, position_id: i64) -> Result<(), ApiError> {
        self.send(Method::DELETE, &format!("/positions/{position_id}"), None).await?;
        Ok(())
    }

    async fn assign_boat(&self, boat_id: BoatId, position_id: i64) -> Result<BoatRecord, ApiError> {
        self.call(Method::POST, &format!("/boats/{boat_id}/assign/{position_id}"), None).await
    }

    async fn unassign_boat(&self, boat_id: BoatId) -> Result<BoatRecord, ApiError> {
        self.call(Method::POST, &format!("/boats/{boat_id}/unassign"), None).await
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn encode<T: serde::Serialize>(body: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Request(e.to_string()))
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Human-readable reason from an error body: the `detail` field when the
/// service sends one, otherwise the raw text.
fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
    detail.unwrap_or_else(|| body.trim().to_owned())
}
