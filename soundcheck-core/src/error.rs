//! Pipeline error types.
//!
//! Per-venue failures are data, not control flow: they end up serialized in
//! the batch summary while the run moves on to the next venue. Only failures
//! that invalidate the whole invocation surface as `BackfillError`.

use thiserror::Error;
use uuid::Uuid;

use crate::places::PlacesError;
use crate::storage::StorageError;
use crate::venues::VenueStoreError;

/// Why a single venue could not be linked to a photo.
#[derive(Debug, Error)]
pub enum VenueFailure {
    #[error("venue has no place id")]
    MissingPlaceId,

    #[error("place id looks invalid or stale ({status})")]
    StalePlaceId { status: String },

    #[error("place lookup failed: {0}")]
    Lookup(PlacesError),

    #[error("no photos available for this place")]
    NoPhotos,

    #[error("no usable photo found after trying {tried} candidates")]
    NoUsablePhoto { tried: usize },

    #[error("photo upload failed: {0}")]
    Upload(StorageError),

    #[error("uploaded photo has no public URL (key {key})")]
    MissingPublicUrl { key: String },

    #[error("photo stored at {key} but venue record update failed: {source}")]
    RecordUpdate {
        key: String,
        source: VenueStoreError,
    },

    #[error("venue processing timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// A failure that aborts the whole backfill invocation.
#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("venue selection failed: {0}")]
    Store(#[from] VenueStoreError),

    #[error("venue {0} not found")]
    VenueNotFound(Uuid),
}
