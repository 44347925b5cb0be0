pub mod backfill_photos;

use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

/// Returns the router for admin endpoints. Callers nest this under
/// `/api/admin` and wrap it in the admin token middleware.
pub fn router() -> Router<AppState> {
    Router::new().route("/photo-backfill", post(backfill_photos::backfill_photos))
}

#[derive(OpenApi)]
#[openapi(
    paths(backfill_photos::backfill_photos),
    components(schemas(
        backfill_photos::BackfillPhotosRequest,
        backfill_photos::BackfillSummaryResponse,
        backfill_photos::VenuePhotoOutcome,
    ))
)]
pub struct ApiDoc;
