//! Mock places provider for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PhotoCandidate, PhotoPayload, PlacesError, PlacesProvider};

/// Canned outcome for a place details lookup.
#[derive(Clone)]
enum MockDetails {
    Photos(Vec<PhotoCandidate>),
    UnknownPlace(String),
    Error(String),
}

#[derive(Clone)]
enum MockPhoto {
    Payload {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    Error(String),
}

/// Mock places provider for testing.
///
/// Details are keyed by place id, photo payloads by reference (optionally by
/// reference and width). Unknown keys error. Every photo request is recorded
/// so tests can assert fetch order and widths.
#[derive(Default)]
pub struct MockPlaces {
    details: HashMap<String, MockDetails>,
    photos: HashMap<String, MockPhoto>,
    sized_photos: HashMap<(String, u32), MockPhoto>,
    requests: Mutex<Vec<(String, u32)>>,
}

impl MockPlaces {
    /// Create a new empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a photo listing for a place id.
    pub fn with_photos(mut self, place_id: &str, photos: Vec<PhotoCandidate>) -> Self {
        self.details
            .insert(place_id.to_string(), MockDetails::Photos(photos));
        self
    }

    /// Make a place id fail as unknown with the given provider status.
    pub fn with_unknown_place(mut self, place_id: &str, status: &str) -> Self {
        self.details.insert(
            place_id.to_string(),
            MockDetails::UnknownPlace(status.to_string()),
        );
        self
    }

    /// Make a place details lookup fail outright.
    pub fn with_details_error(mut self, place_id: &str, error: &str) -> Self {
        self.details
            .insert(place_id.to_string(), MockDetails::Error(error.to_string()));
        self
    }

    /// Register photo bytes for a reference at any width.
    pub fn with_photo(mut self, reference: &str, bytes: Vec<u8>) -> Self {
        self.photos.insert(
            reference.to_string(),
            MockPhoto::Payload {
                bytes,
                content_type: None,
            },
        );
        self
    }

    /// Register photo bytes with an explicit content type.
    pub fn with_typed_photo(mut self, reference: &str, bytes: Vec<u8>, content_type: &str) -> Self {
        self.photos.insert(
            reference.to_string(),
            MockPhoto::Payload {
                bytes,
                content_type: Some(content_type.to_string()),
            },
        );
        self
    }

    /// Register photo bytes for one specific width, overriding the default.
    pub fn with_photo_at(mut self, reference: &str, width: u32, bytes: Vec<u8>) -> Self {
        self.sized_photos.insert(
            (reference.to_string(), width),
            MockPhoto::Payload {
                bytes,
                content_type: None,
            },
        );
        self
    }

    /// Make a photo fetch fail.
    pub fn with_photo_error(mut self, reference: &str, error: &str) -> Self {
        self.photos
            .insert(reference.to_string(), MockPhoto::Error(error.to_string()));
        self
    }

    /// Every photo request seen so far, as (reference, width) in call order.
    pub fn photo_requests(&self) -> Vec<(String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesProvider for MockPlaces {
    async fn photo_candidates(&self, place_id: &str) -> Result<Vec<PhotoCandidate>, PlacesError> {
        match self.details.get(place_id) {
            Some(MockDetails::Photos(photos)) => Ok(photos.clone()),
            Some(MockDetails::UnknownPlace(status)) => Err(PlacesError::UnknownPlace {
                status: status.clone(),
            }),
            Some(MockDetails::Error(e)) => Err(PlacesError::Request(e.clone())),
            None => Err(PlacesError::Request(format!(
                "No mock details for place id: {}",
                place_id
            ))),
        }
    }

    async fn photo_bytes(
        &self,
        reference: &str,
        max_width: u32,
    ) -> Result<PhotoPayload, PlacesError> {
        self.requests
            .lock()
            .unwrap()
            .push((reference.to_string(), max_width));

        let photo = self
            .sized_photos
            .get(&(reference.to_string(), max_width))
            .or_else(|| self.photos.get(reference));

        match photo {
            Some(MockPhoto::Payload {
                bytes,
                content_type,
            }) => Ok(PhotoPayload {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
            }),
            Some(MockPhoto::Error(e)) => Err(PlacesError::PhotoRequest(e.clone())),
            None => Err(PlacesError::PhotoRequest(format!(
                "No mock payload for reference: {}",
                reference
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_registered_photos() {
        let mock = MockPlaces::new().with_photos(
            "place-1",
            vec![PhotoCandidate::new("ref-1", Some(800), Some(600))],
        );

        let photos = mock.photo_candidates("place-1").await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].reference, "ref-1");
    }

    #[tokio::test]
    async fn unknown_place_is_its_own_error() {
        let mock = MockPlaces::new().with_unknown_place("gone", "NOT_FOUND");

        let err = mock.photo_candidates("gone").await.unwrap_err();
        assert!(matches!(err, PlacesError::UnknownPlace { .. }));
    }

    #[tokio::test]
    async fn sized_payload_overrides_default() {
        let mock = MockPlaces::new()
            .with_photo("ref-1", vec![1, 2, 3])
            .with_photo_at("ref-1", 640, vec![9]);

        let thumb = mock.photo_bytes("ref-1", 640).await.unwrap();
        assert_eq!(thumb.bytes, vec![9]);

        let full = mock.photo_bytes("ref-1", 1200).await.unwrap();
        assert_eq!(full.bytes, vec![1, 2, 3]);

        assert_eq!(
            mock.photo_requests(),
            vec![("ref-1".to_string(), 640), ("ref-1".to_string(), 1200)]
        );
    }

    #[tokio::test]
    async fn unregistered_reference_errors() {
        let mock = MockPlaces::new();
        assert!(mock.photo_bytes("nope", 640).await.is_err());
    }
}
