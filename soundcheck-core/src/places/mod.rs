//! Venue photo discovery through a places provider.
//!
//! The provider answers two questions: which photos does a place have, and
//! what are the bytes of one of them at a bounded width. Everything else
//! (ranking, arbitration, persistence) happens downstream.

mod google;
mod mock;

pub use google::GooglePlacesClient;
pub use mock::MockPlaces;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Error type for places provider operations.
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("place details request failed: {0}")]
    Request(String),

    /// The provider does not recognize the place id. Distinct from an
    /// existing place with zero photos, which is a successful empty listing.
    #[error("provider rejected place id ({status})")]
    UnknownPlace { status: String },

    #[error("provider returned status {status}")]
    Status { status: String },

    #[error("photo request failed: {0}")]
    PhotoRequest(String),

    #[error("photo request returned HTTP {status}")]
    PhotoStatus { status: u16 },
}

/// One photo the provider knows about for a place, in listing order.
///
/// Dimensions are advisory; providers sometimes omit them and the ranking
/// copes. The reference is the opaque handle used to fetch actual bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoCandidate {
    #[serde(rename = "photo_reference")]
    pub reference: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl PhotoCandidate {
    /// Build a candidate by hand; providers deserialize theirs.
    pub fn new(reference: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            reference: reference.into(),
            width,
            height,
        }
    }
}

/// Raw bytes of a provider-hosted photo.
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
    /// Content type as reported by the provider, when it sends one.
    pub content_type: Option<String>,
}

/// Trait for places providers, enabling mockability in tests.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// List the photos a place exposes, in provider order.
    ///
    /// An existing place with no photos yields `Ok` with an empty vector; a
    /// stale or fake place id yields [`PlacesError::UnknownPlace`].
    async fn photo_candidates(&self, place_id: &str) -> Result<Vec<PhotoCandidate>, PlacesError>;

    /// Fetch the bytes of one photo, bounded to `max_width` pixels.
    async fn photo_bytes(
        &self,
        reference: &str,
        max_width: u32,
    ) -> Result<PhotoPayload, PlacesError>;
}
