use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use soundcheck_core::config::DEFAULT_VENUE_LIMIT;
use soundcheck_core::{
    parse_venue_id, BackfillError, BackfillRequest, BackfillSummary, GooglePlacesClient,
    PhotoBackfill, PipelineConfig, SupabaseStorage, VenuePhotoResult,
};

use crate::api::ErrorResponse;
use crate::venue_store::PgVenueStore;
use crate::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BackfillPhotosRequest {
    /// Maximum venues to process (default 10, must be positive). Ignored
    /// when venue_id is set.
    pub limit: Option<i64>,
    /// Process exactly this venue.
    pub venue_id: Option<String>,
    /// Consult the vision model. Defaults to whether one is configured.
    pub use_ai: Option<bool>,
    /// Include venues that already have a photo.
    pub force: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VenuePhotoOutcome {
    pub venue_id: Uuid,
    pub venue_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<VenuePhotoResult> for VenuePhotoOutcome {
    fn from(result: VenuePhotoResult) -> Self {
        Self {
            venue_id: result.venue_id,
            venue_name: result.venue_name,
            success: result.success,
            photo_url: result.photo_url,
            error: result.error,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillSummaryResponse {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<VenuePhotoOutcome>,
}

impl From<BackfillSummary> for BackfillSummaryResponse {
    fn from(summary: BackfillSummary) -> Self {
        Self {
            processed: summary.processed,
            successful: summary.successful,
            failed: summary.failed,
            results: summary
                .results
                .into_iter()
                .map(VenuePhotoOutcome::from)
                .collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/photo-backfill",
    tag = "admin",
    request_body = BackfillPhotosRequest,
    responses(
        (status = 200, description = "Backfill ran; per-venue outcomes inside", body = BackfillSummaryResponse),
        (status = 400, description = "Invalid venue id or limit", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Venue not found", body = ErrorResponse),
        (status = 500, description = "Venue selection failed", body = ErrorResponse),
        (status = 503, description = "Places provider not configured", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn backfill_photos(
    State(state): State<AppState>,
    Json(request): Json<BackfillPhotosRequest>,
) -> impl IntoResponse {
    // The places key is the one credential nothing works without; check it
    // before touching any venue.
    let api_key = match &state.config.google_places_api_key {
        Some(key) => key.clone(),
        None => {
            tracing::warn!("photo backfill requested but GOOGLE_PLACES_API_KEY is not set");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "places provider not configured".to_string(),
                }),
            )
                .into_response();
        }
    };

    let venue_id = match request.venue_id.as_deref().map(parse_venue_id).transpose() {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid venue id: {}", e),
                }),
            )
                .into_response();
        }
    };

    let limit = match resolve_limit(request.limit) {
        Ok(limit) => limit,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid limit: {}", e),
                }),
            )
                .into_response();
        }
    };

    let pipeline = PhotoBackfill::new(
        Arc::new(GooglePlacesClient::new(api_key)),
        Arc::new(PgVenueStore::new(state.pool.clone())),
        Arc::new(SupabaseStorage::new(state.config.storage.clone())),
        state.vision.clone(),
        PipelineConfig::default(),
    );

    let backfill_request = BackfillRequest {
        limit,
        venue_id,
        use_ai: request.use_ai.unwrap_or_else(|| state.vision.is_some()),
        force: request.force.unwrap_or(false),
    };

    match pipeline.run(&backfill_request).await {
        Ok(summary) => {
            (StatusCode::OK, Json(BackfillSummaryResponse::from(summary))).into_response()
        }
        Err(BackfillError::VenueNotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("venue {} not found", id),
            }),
        )
            .into_response(),
        Err(BackfillError::Store(e)) => {
            tracing::error!("venue selection failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "venue selection failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Resolve the requested venue limit, falling back to the default.
///
/// The stores bind this value straight into a query; a non-positive limit
/// is a client error.
fn resolve_limit(requested: Option<i64>) -> Result<i64, String> {
    let limit = requested.unwrap_or(DEFAULT_VENUE_LIMIT);
    if limit > 0 {
        Ok(limit)
    } else {
        Err(format!("{} is not a positive integer", limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_limit_uses_default() {
        assert_eq!(resolve_limit(None), Ok(DEFAULT_VENUE_LIMIT));
    }

    #[test]
    fn test_positive_limit_passes_through() {
        assert_eq!(resolve_limit(Some(3)), Ok(3));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(resolve_limit(Some(0)).is_err());
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = resolve_limit(Some(-1)).unwrap_err();
        assert!(err.contains("-1"));
    }
}
