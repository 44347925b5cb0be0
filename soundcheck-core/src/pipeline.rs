//! The photo backfill pipeline.
//!
//! Walks a working set of venues strictly in sequence, and for each one:
//! discovers photo candidates, ranks them, optionally asks a vision model to
//! arbitrate, then fetches, stores, and links the winner. One venue's outcome
//! never affects another's.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::ai::VisionModel;
use crate::arbitrate;
use crate::config::{PipelineConfig, DEFAULT_VENUE_LIMIT};
use crate::error::{BackfillError, VenueFailure};
use crate::photo;
use crate::places::{PlacesError, PlacesProvider};
use crate::rank;
use crate::storage::ObjectStore;
use crate::venues::{VenueRecord, VenueStore};

/// Parameters for one backfill invocation.
#[derive(Debug, Clone)]
pub struct BackfillRequest {
    /// Maximum venues to process when no explicit venue is given.
    pub limit: i64,
    /// Process exactly this venue instead of selecting a batch.
    pub venue_id: Option<Uuid>,
    /// Consult the vision model (if one is wired in).
    pub use_ai: bool,
    /// Include venues that already have a photo.
    pub force: bool,
}

impl Default for BackfillRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_VENUE_LIMIT,
            venue_id: None,
            use_ai: true,
            force: false,
        }
    }
}

/// Outcome for one venue.
#[derive(Debug, Serialize)]
pub struct VenuePhotoResult {
    pub venue_id: Uuid,
    pub venue_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VenuePhotoResult {
    fn linked(venue: &VenueRecord, url: String) -> Self {
        Self {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            success: true,
            photo_url: Some(url),
            error: None,
        }
    }

    fn failed(venue: &VenueRecord, failure: &VenueFailure) -> Self {
        Self {
            venue_id: venue.id,
            venue_name: venue.name.clone(),
            success: false,
            photo_url: None,
            error: Some(failure.to_string()),
        }
    }
}

/// Aggregate outcome of a backfill invocation.
#[derive(Debug, Default, Serialize)]
pub struct BackfillSummary {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<VenuePhotoResult>,
}

impl BackfillSummary {
    fn absorb(mut self, result: VenuePhotoResult) -> Self {
        self.processed += 1;
        if result.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
        self
    }
}

/// The assembled pipeline. All collaborators are injected so tests can run
/// it end to end against in-memory doubles.
pub struct PhotoBackfill {
    places: Arc<dyn PlacesProvider>,
    venues: Arc<dyn VenueStore>,
    objects: Arc<dyn ObjectStore>,
    vision: Option<Arc<dyn VisionModel>>,
    config: PipelineConfig,
}

impl PhotoBackfill {
    pub fn new(
        places: Arc<dyn PlacesProvider>,
        venues: Arc<dyn VenueStore>,
        objects: Arc<dyn ObjectStore>,
        vision: Option<Arc<dyn VisionModel>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            places,
            venues,
            objects,
            vision,
            config,
        }
    }

    /// Run one backfill invocation and fold every venue outcome into a
    /// summary. Venues are processed one at a time, in order.
    pub async fn run(&self, request: &BackfillRequest) -> Result<BackfillSummary, BackfillError> {
        let venues = self.select_venues(request).await?;
        tracing::info!("photo backfill starting for {} venue(s)", venues.len());

        let mut summary = BackfillSummary::default();
        for venue in &venues {
            let result = self.process_venue(venue, request.use_ai).await;
            match &result.error {
                Some(error) => {
                    tracing::warn!("venue {} ({}) failed: {}", venue.name, venue.id, error)
                }
                None => tracing::info!("venue {} ({}) linked", venue.name, venue.id),
            }
            summary = summary.absorb(result);
        }

        tracing::info!(
            "photo backfill finished: {} processed, {} successful, {} failed",
            summary.processed,
            summary.successful,
            summary.failed
        );
        Ok(summary)
    }

    async fn select_venues(
        &self,
        request: &BackfillRequest,
    ) -> Result<Vec<VenueRecord>, BackfillError> {
        let Some(venue_id) = request.venue_id else {
            let venues = self
                .venues
                .venues_needing_photos(request.limit, request.force)
                .await?;
            return Ok(venues);
        };

        let venue = self
            .venues
            .venue_by_id(venue_id)
            .await?
            .ok_or(BackfillError::VenueNotFound(venue_id))?;

        if venue.place_id.is_none() {
            // Structurally unprocessable, not a failure worth a result row.
            tracing::info!("venue {} ({}) has no place id, skipping", venue.name, venue.id);
            return Ok(vec![]);
        }

        Ok(vec![venue])
    }

    async fn process_venue(&self, venue: &VenueRecord, use_ai: bool) -> VenuePhotoResult {
        let work = self.link_hero_photo(venue, use_ai);

        let outcome = match self.config.venue_timeout {
            Some(cap) => match tokio::time::timeout(cap, work).await {
                Ok(outcome) => outcome,
                Err(_) => Err(VenueFailure::Timeout {
                    seconds: cap.as_secs(),
                }),
            },
            None => work.await,
        };

        match outcome {
            Ok(url) => VenuePhotoResult::linked(venue, url),
            Err(failure) => VenuePhotoResult::failed(venue, &failure),
        }
    }

    /// Discover, choose, fetch, store, and link a hero photo for one venue.
    async fn link_hero_photo(
        &self,
        venue: &VenueRecord,
        use_ai: bool,
    ) -> Result<String, VenueFailure> {
        let place_id = venue.place_id.as_deref().ok_or(VenueFailure::MissingPlaceId)?;

        let candidates = match self.places.photo_candidates(place_id).await {
            Ok(candidates) => candidates,
            Err(PlacesError::UnknownPlace { status }) => {
                return Err(VenueFailure::StalePlaceId { status })
            }
            Err(e) => return Err(VenueFailure::Lookup(e)),
        };
        if candidates.is_empty() {
            return Err(VenueFailure::NoPhotos);
        }

        let ranked = rank::rank_candidates(candidates, self.config.ranked_limit);
        tracing::debug!("ranked {} candidate(s) for {}", ranked.len(), venue.name);

        let ai_pick = match (&self.vision, use_ai) {
            (Some(model), true) => {
                arbitrate::pick_hero_reference(
                    self.places.as_ref(),
                    model.as_ref(),
                    &ranked,
                    &self.config,
                )
                .await
            }
            _ => None,
        };

        // AI pick first, then the heuristic order, never the same reference
        // twice.
        let mut references: Vec<String> = Vec::with_capacity(ranked.len());
        if let Some(pick) = ai_pick {
            references.push(pick);
        }
        for candidate in &ranked {
            if !references.contains(&candidate.reference) {
                references.push(candidate.reference.clone());
            }
        }

        let tried = references.len();
        let usable = photo::first_usable_photo(
            self.places.as_ref(),
            &references,
            self.config.full_width,
            self.config.min_photo_bytes,
        )
        .await
        .ok_or(VenueFailure::NoUsablePhoto { tried })?;

        let extension = photo::extension_for(&usable.photo.content_type);
        let key = storage_key(venue.id, extension);

        self.objects
            .upload(&key, &usable.photo.bytes, &usable.photo.content_type)
            .await
            .map_err(VenueFailure::Upload)?;

        let url = self
            .objects
            .public_url(&key)
            .ok_or_else(|| VenueFailure::MissingPublicUrl { key: key.clone() })?;

        self.venues
            .set_photo_url(venue.id, &url)
            .await
            .map_err(|source| VenueFailure::RecordUpdate {
                key: key.clone(),
                source,
            })?;

        tracing::debug!("stored {} for venue {}", key, venue.id);
        Ok(url)
    }
}

/// Storage key for a venue photo: venue id plus a millisecond timestamp, so
/// re-runs never collide.
fn storage_key(venue_id: Uuid, extension: &str) -> String {
    format!(
        "venues/{}/{}.{}",
        venue_id,
        Utc::now().timestamp_millis(),
        extension
    )
}
