//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /tiles/density/{dataset}/{z}/{y}/{x}.webp` - Density tile
//! - `GET /tiles/countries/{z}/{y}/{x}.webp` - Registration-group tile
//! - `GET /tiles/publishers/{z}/{y}/{x}.webp` - Publisher-range tile
//! - `GET /datasets` - Loaded datasets
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::TileError;
use crate::tile::{TileRequest, TileResponse, TileService};

/// Response header reporting whether the tile came from the disk cache.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-tile-cache-hit");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the tile service.
#[derive(Clone)]
pub struct AppState {
    /// The tile service for processing tile requests
    pub tile_service: Arc<TileService>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,
}

impl AppState {
    /// Create a new application state with a one hour max-age.
    pub fn new(tile_service: TileService) -> Self {
        Self::with_cache_max_age(tile_service, super::routes::DEFAULT_CACHE_MAX_AGE)
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tile_service: TileService, cache_max_age: u32) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for density tiles.
///
/// Extracted from: `/tiles/density/{dataset}/{z}/{y}/{filename}`
#[derive(Debug, Deserialize)]
pub struct DensityPathParams {
    /// Dataset name
    pub dataset: String,

    /// Zoom level
    pub z: String,

    /// Tile row
    pub y: String,

    /// Tile column with optional extension (e.g. "3" or "3.webp")
    pub filename: String,
}

/// Path parameters for category tiles.
///
/// Extracted from: `/tiles/{countries|publishers}/{z}/{y}/{filename}`
#[derive(Debug, Deserialize)]
pub struct CategoryPathParams {
    /// Zoom level
    pub z: String,

    /// Tile row
    pub y: String,

    /// Tile column with optional extension (e.g. "3" or "3.webp")
    pub filename: String,
}

impl DensityPathParams {
    /// Parse `(z, y, x)` from the path segments.
    pub fn address(&self) -> Result<(u32, u32, u32), TileError> {
        parse_address(&self.z, &self.y, &self.filename)
    }
}

impl CategoryPathParams {
    /// Parse `(z, y, x)` from the path segments.
    pub fn address(&self) -> Result<(u32, u32, u32), TileError> {
        parse_address(&self.z, &self.y, &self.filename)
    }
}

/// Parse one numeric path segment.
pub fn parse_coordinate(value: &str) -> Result<u32, TileError> {
    value.parse().map_err(|_| TileError::InvalidCoordinate {
        value: value.to_string(),
    })
}

/// Parse the tile column from a filename, stripping any image extension.
pub fn parse_column(filename: &str) -> Result<u32, TileError> {
    let stem = [".webp", ".jpg", ".jpeg"]
        .iter()
        .find_map(|ext| filename.strip_suffix(ext))
        .unwrap_or(filename);
    stem.parse().map_err(|_| TileError::InvalidCoordinate {
        value: filename.to_string(),
    })
}

fn parse_address(z: &str, y: &str, filename: &str) -> Result<(u32, u32, u32), TileError> {
    Ok((parse_coordinate(z)?, parse_coordinate(y)?, parse_column(filename)?))
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_zoom")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// One entry of the datasets listing.
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    /// Dataset name, usable in density tile URLs
    pub name: String,

    /// Number of books in the dataset
    pub points: usize,
}

/// Response from the datasets endpoint.
#[derive(Debug, Serialize)]
pub struct DatasetsResponse {
    /// Loaded datasets in name order
    pub datasets: Vec<DatasetSummary>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert TileError to HTTP response.
///
/// - 4xx errors are logged at WARN level, except 404 at DEBUG
/// - 5xx errors are logged at ERROR level
impl IntoResponse for TileError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileError::DatasetNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            TileError::InvalidZoom { .. } => (StatusCode::BAD_REQUEST, "invalid_zoom"),
            TileError::InvalidCoordinate { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_coordinate")
            }
            TileError::TileOutOfBounds { .. } => (StatusCode::BAD_REQUEST, "tile_out_of_bounds"),
            TileError::MalformedIdentifier { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "classification_error")
            }
            TileError::EncodeError { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "encode_error"),
            TileError::CacheIo { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            TileError::Generation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "generation_error")
            }
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

/// Wrapper for handler errors to implement IntoResponse.
pub struct HandlerError(pub TileError);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

impl From<TileError> for HandlerError {
    fn from(err: TileError) -> Self {
        HandlerError(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle density tile requests.
///
/// # Endpoint
///
/// `GET /tiles/density/{dataset}/{z}/{y}/{x}.webp`
///
/// # Response
///
/// - `200 OK`: encoded tile, green channel holds book density
/// - `400 Bad Request`: zoom outside 1-16 or coordinates out of range
/// - `404 Not Found`: unknown dataset
/// - `500 Internal Server Error`: rendering or cache I/O failure
///
/// # Headers
///
/// - `Content-Type: image/webp` (or `image/jpeg`)
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Tile-Cache-Hit: true|false`
pub async fn density_tile_handler(
    State(state): State<AppState>,
    Path(params): Path<DensityPathParams>,
) -> Result<Response, HandlerError> {
    let (z, y, x) = params.address()?;
    let request = TileRequest::density(params.dataset, z, y, x);
    let response = state.tile_service.get_tile(request).await?;
    Ok(tile_response(response, state.cache_max_age))
}

/// Handle registration-group tile requests.
///
/// `GET /tiles/countries/{z}/{y}/{x}.webp`
pub async fn countries_tile_handler(
    State(state): State<AppState>,
    Path(params): Path<CategoryPathParams>,
) -> Result<Response, HandlerError> {
    let (z, y, x) = params.address()?;
    let request = TileRequest::countries(z, y, x);
    let response = state.tile_service.get_tile(request).await?;
    Ok(tile_response(response, state.cache_max_age))
}

/// Handle publisher-range tile requests.
///
/// `GET /tiles/publishers/{z}/{y}/{x}.webp`
pub async fn publishers_tile_handler(
    State(state): State<AppState>,
    Path(params): Path<CategoryPathParams>,
) -> Result<Response, HandlerError> {
    let (z, y, x) = params.address()?;
    let request = TileRequest::publishers(z, y, x);
    let response = state.tile_service.get_tile(request).await?;
    Ok(tile_response(response, state.cache_max_age))
}

fn tile_response(response: TileResponse, cache_max_age: u32) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                response.format.content_type().to_string(),
            ),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", cache_max_age),
            ),
            (CACHE_HIT_HEADER, response.cache_hit.to_string()),
        ],
        response.data,
    )
        .into_response()
}

/// Handle dataset listing requests.
///
/// # Endpoint
///
/// `GET /datasets`
///
/// # Response
///
/// ```json
/// {
///   "datasets": [{"name": "all_isbns", "points": 123}, {"name": "ia", "points": 45}]
/// }
/// ```
pub async fn datasets_handler(State(state): State<AppState>) -> Json<DatasetsResponse> {
    let datasets = state
        .tile_service
        .datasets()
        .iter()
        .map(|d| DatasetSummary {
            name: d.name().to_string(),
            points: d.len(),
        })
        .collect();

    Json(DatasetsResponse { datasets })
}

/// Handle health check requests.
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
