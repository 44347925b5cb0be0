//! Venue records and the store trait the pipeline reads and writes through.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Error type for venue store operations.
#[derive(Debug, Error)]
pub enum VenueStoreError {
    #[error("venue query failed: {0}")]
    Query(String),

    #[error("venue update failed: {0}")]
    Update(String),
}

/// The slice of a venue the photo pipeline cares about.
#[derive(Debug, Clone)]
pub struct VenueRecord {
    pub id: Uuid,
    pub name: String,
    pub place_id: Option<String>,
}

/// Trait for venue persistence.
#[async_trait]
pub trait VenueStore: Send + Sync {
    /// Venues with a place id, ordered by name, at most `limit`. Venues that
    /// already have a photo are excluded unless `include_photographed` is set.
    /// `limit` must be positive; implementations bind it into queries
    /// unchecked.
    async fn venues_needing_photos(
        &self,
        limit: i64,
        include_photographed: bool,
    ) -> Result<Vec<VenueRecord>, VenueStoreError>;

    /// Look up a single venue.
    async fn venue_by_id(&self, id: Uuid) -> Result<Option<VenueRecord>, VenueStoreError>;

    /// Record the public photo URL for a venue.
    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<(), VenueStoreError>;
}

/// Parse a venue id from client input.
///
/// Stricter than `Uuid::parse_str`, which also accepts unhyphenated and
/// braced forms: ids must be canonical 8-4-4-4-12, a defined version (1-5),
/// and the RFC 4122 variant.
pub fn parse_venue_id(raw: &str) -> Result<Uuid, String> {
    let bytes = raw.as_bytes();
    let canonical = bytes.len() == 36
        && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-');
    if !canonical {
        return Err(format!("not a canonical UUID: {:?}", raw));
    }

    let id = Uuid::parse_str(raw).map_err(|e| e.to_string())?;

    if !(1..=5).contains(&id.get_version_num()) {
        return Err(format!("unsupported UUID version {}", id.get_version_num()));
    }
    if id.get_variant() != uuid::Variant::RFC4122 {
        return Err("unsupported UUID variant".to_string());
    }

    Ok(id)
}

/// In-memory venue store for testing.
#[derive(Debug, Default)]
pub struct MemoryVenueStore {
    venues: Vec<VenueRecord>,
    photographed: Vec<Uuid>,
    fail_updates: bool,
    updates: Mutex<HashMap<Uuid, String>>,
}

#[allow(dead_code)]
impl MemoryVenueStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a venue without a photo.
    pub fn with_venue(mut self, venue: VenueRecord) -> Self {
        self.venues.push(venue);
        self
    }

    /// Add a venue that already has a photo on record.
    pub fn with_photographed_venue(mut self, venue: VenueRecord) -> Self {
        self.photographed.push(venue.id);
        self.venues.push(venue);
        self
    }

    /// Make every photo URL update fail.
    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// The photo URL recorded for a venue, if any.
    pub fn photo_url(&self, id: Uuid) -> Option<String> {
        self.updates.lock().unwrap().get(&id).cloned()
    }

    /// How many venues have had a photo URL recorded.
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl VenueStore for MemoryVenueStore {
    async fn venues_needing_photos(
        &self,
        limit: i64,
        include_photographed: bool,
    ) -> Result<Vec<VenueRecord>, VenueStoreError> {
        let mut venues: Vec<VenueRecord> = self
            .venues
            .iter()
            .filter(|v| v.place_id.is_some())
            .filter(|v| include_photographed || !self.photographed.contains(&v.id))
            .cloned()
            .collect();
        venues.sort_by(|a, b| a.name.cmp(&b.name));
        venues.truncate(limit.max(0) as usize);
        Ok(venues)
    }

    async fn venue_by_id(&self, id: Uuid) -> Result<Option<VenueRecord>, VenueStoreError> {
        Ok(self.venues.iter().find(|v| v.id == id).cloned())
    }

    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<(), VenueStoreError> {
        if self.fail_updates {
            return Err(VenueStoreError::Update("injected failure".to_string()));
        }
        if !self.venues.iter().any(|v| v.id == id) {
            return Err(VenueStoreError::Update(format!("no venue with id {}", id)));
        }
        self.updates.lock().unwrap().insert(id, url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_v4() {
        let id = parse_venue_id("a3bb189e-8bf9-4888-9912-ace4e6543002");
        assert!(id.is_ok());
    }

    #[test]
    fn rejects_short_input() {
        assert!(parse_venue_id("a3bb189e").is_err());
    }

    #[test]
    fn rejects_unhyphenated_hex() {
        // Uuid::parse_str would take this; we do not.
        assert!(parse_venue_id("a3bb189e8bf938889912ace4e6543002").is_err());
    }

    #[test]
    fn rejects_version_zero() {
        assert!(parse_venue_id("a3bb189e-8bf9-0888-9912-ace4e6543002").is_err());
    }

    #[test]
    fn rejects_version_seven() {
        assert!(parse_venue_id("a3bb189e-8bf9-7888-9912-ace4e6543002").is_err());
    }

    #[test]
    fn rejects_microsoft_variant() {
        assert!(parse_venue_id("a3bb189e-8bf9-4888-c912-ace4e6543002").is_err());
    }

    fn venue(name: &str, place: Option<&str>) -> VenueRecord {
        VenueRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            place_id: place.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn filters_orders_and_limits() {
        let store = MemoryVenueStore::new()
            .with_venue(venue("Zanzibar", Some("p1")))
            .with_venue(venue("Annex", Some("p2")))
            .with_venue(venue("Mercury", None))
            .with_venue(venue("Basement", Some("p3")));

        let venues = store.venues_needing_photos(2, false).await.unwrap();
        let names: Vec<&str> = venues.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Annex", "Basement"]);
    }

    #[tokio::test]
    async fn photographed_hidden_unless_included() {
        let store = MemoryVenueStore::new()
            .with_photographed_venue(venue("Covered", Some("p1")))
            .with_venue(venue("Naked", Some("p2")));

        let without = store.venues_needing_photos(10, false).await.unwrap();
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].name, "Naked");

        let with = store.venues_needing_photos(10, true).await.unwrap();
        assert_eq!(with.len(), 2);
    }
}
