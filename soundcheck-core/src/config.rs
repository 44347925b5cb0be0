//! Pipeline tuning knobs.
//!
//! Every limit the pipeline applies lives here so callers (and tests) can
//! adjust them without touching pipeline code. The defaults are the values
//! the production deployment runs with.

use std::time::Duration;

/// Candidates kept after heuristic ranking.
pub const DEFAULT_RANKED_LIMIT: usize = 8;

/// Thumbnails offered to the vision model per arbitration call.
pub const DEFAULT_AI_CANDIDATES: usize = 4;

/// Bounded pixel width for arbitration thumbnails.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 640;

/// Bounded pixel width for the stored hero photo.
pub const DEFAULT_FULL_WIDTH: u32 = 1200;

/// Payloads smaller than this are icons or map tiles, not venue photos.
pub const DEFAULT_MIN_PHOTO_BYTES: usize = 25_000;

/// Thumbnails smaller than this are not worth showing the model.
pub const DEFAULT_MIN_THUMBNAIL_BYTES: usize = 5_000;

/// Venues per batch invocation when the caller does not say otherwise.
pub const DEFAULT_VENUE_LIMIT: i64 = 10;

/// Wall-clock cap per venue before its result is written off as a timeout.
pub const DEFAULT_VENUE_TIMEOUT: Duration = Duration::from_secs(120);

/// Tuning for the photo backfill pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidates kept after ranking; everything below the cut is never fetched.
    pub ranked_limit: usize,
    /// Top-ranked candidates offered to the vision model.
    pub ai_candidates: usize,
    /// Max width requested for arbitration thumbnails.
    pub thumbnail_width: u32,
    /// Max width requested for the stored photo.
    pub full_width: u32,
    /// Minimum byte size for a stored photo.
    pub min_photo_bytes: usize,
    /// Minimum byte size for an arbitration thumbnail.
    pub min_thumbnail_bytes: usize,
    /// Per-venue wall-clock cap. `None` disables the cap.
    pub venue_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ranked_limit: DEFAULT_RANKED_LIMIT,
            ai_candidates: DEFAULT_AI_CANDIDATES,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            full_width: DEFAULT_FULL_WIDTH,
            min_photo_bytes: DEFAULT_MIN_PHOTO_BYTES,
            min_thumbnail_bytes: DEFAULT_MIN_THUMBNAIL_BYTES,
            venue_timeout: Some(DEFAULT_VENUE_TIMEOUT),
        }
    }
}
