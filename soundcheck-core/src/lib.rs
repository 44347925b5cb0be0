pub mod ai;
pub mod arbitrate;
pub mod config;
pub mod error;
pub mod photo;
pub mod pipeline;
pub mod places;
pub mod rank;
pub mod storage;
pub mod venues;

pub use ai::{
    vision_model_from_env, FakeVisionModel, GeminiClient, GeminiConfig, ImagePart, VisionError,
    VisionModel,
};
pub use config::PipelineConfig;
pub use error::{BackfillError, VenueFailure};
pub use photo::{FetchedPhoto, UsablePhoto};
pub use pipeline::{BackfillRequest, BackfillSummary, PhotoBackfill, VenuePhotoResult};
pub use places::{
    GooglePlacesClient, MockPlaces, PhotoCandidate, PhotoPayload, PlacesError, PlacesProvider,
};
pub use rank::rank_candidates;
pub use storage::{MemoryObjectStore, ObjectStore, StorageConfig, StorageError, SupabaseStorage};
pub use venues::{parse_venue_id, MemoryVenueStore, VenueRecord, VenueStore, VenueStoreError};
