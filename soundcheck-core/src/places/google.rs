//! Google Places Web Service client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PhotoCandidate, PhotoPayload, PlacesError, PlacesProvider};

/// Default Places Web Service base URL.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production places provider backed by the Google Places Web Service.
///
/// The API key arrives through the constructor; this client never reads the
/// environment.
#[derive(Debug)]
pub struct GooglePlacesClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GooglePlacesClient {
    /// Create a client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a non-default base URL.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

/// Place details response, narrowed to the photo listing.
#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<DetailsResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    photos: Vec<PhotoCandidate>,
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn photo_candidates(&self, place_id: &str) -> Result<Vec<PhotoCandidate>, PlacesError> {
        let url = format!("{}/details/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", "photos"),
                ("key", self.api_key.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| PlacesError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PlacesError::Request(format!("HTTP {}", response.status())));
        }

        let details: DetailsResponse = response
            .json()
            .await
            .map_err(|e| PlacesError::Request(e.to_string()))?;

        match details.status.as_str() {
            "OK" => {
                let photos = details.result.map(|r| r.photos).unwrap_or_default();
                tracing::debug!(place_id, count = photos.len(), "place details fetched");
                Ok(photos)
            }
            "NOT_FOUND" | "INVALID_REQUEST" => Err(PlacesError::UnknownPlace {
                status: details.status,
            }),
            _ => {
                tracing::debug!(
                    place_id,
                    status = %details.status,
                    error = ?details.error_message,
                    "place details returned non-OK status"
                );
                Err(PlacesError::Status {
                    status: details.status,
                })
            }
        }
    }

    async fn photo_bytes(
        &self,
        reference: &str,
        max_width: u32,
    ) -> Result<PhotoPayload, PlacesError> {
        let url = format!("{}/photo", self.base_url);
        let max_width = max_width.to_string();
        // The photo endpoint answers with a redirect to the image itself;
        // reqwest follows it and hands back the final body.
        let response = self
            .client
            .get(&url)
            .query(&[
                ("photoreference", reference),
                ("maxwidth", max_width.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| PlacesError::PhotoRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlacesError::PhotoStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlacesError::PhotoRequest(e.to_string()))?
            .to_vec();

        tracing::debug!(reference, size = bytes.len(), "photo fetched");
        Ok(PhotoPayload {
            bytes,
            content_type,
        })
    }
}
