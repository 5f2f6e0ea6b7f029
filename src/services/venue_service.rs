// VenueService - venue lifecycle and the events a venue hosts

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::{EdgeType, IdPrefix, Identifier};
use crate::entities::{Event, GraphEntity, HighlightGroup, Venue};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, GraphStore};
use crate::infrastructure::id_generator::IdService;

#[derive(Debug, Clone)]
pub struct NewVenue {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub municipality: String,
    pub postcode: String,
    pub address: String,
    pub avatar: Option<Identifier>,
    pub description: Option<String>,
    pub media: Vec<Identifier>,
    pub highlights: Vec<HighlightGroup>,
    pub tags: Vec<String>,
    pub capacity: Option<i32>,
    pub venue_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VenuePatch {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub municipality: Option<String>,
    pub postcode: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<Identifier>,
    pub description: Option<String>,
    pub media: Option<Vec<Identifier>>,
    pub highlights: Option<Vec<HighlightGroup>>,
    pub tags: Option<Vec<String>>,
    pub capacity: Option<i32>,
    pub venue_type: Option<String>,
}

fn check_venue(venue: &Venue) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&venue.latitude) || !(-180.0..=180.0).contains(&venue.longitude) {
        return Err(AppError::Validation(format!(
            "coordinates ({}, {}) are out of range",
            venue.latitude, venue.longitude
        )));
    }
    if venue.country.len() != 3 || !venue.country.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(format!(
            "country must be an ISO 3166-1 alpha-3 code, got '{}'",
            venue.country
        )));
    }
    if let Some(capacity) = venue.capacity {
        if capacity < 0 {
            return Err(AppError::Validation("capacity must not be negative".to_string()));
        }
    }

    if let Some(avatar) = &venue.avatar {
        avatar.expect_prefix("avatar", &[IdPrefix::Image])?;
    }
    for item in &venue.media {
        item.expect_prefix("media", &[IdPrefix::Video, IdPrefix::Image])?;
    }
    for group in &venue.highlights {
        group.cover.expect_prefix("highlights.cover", &[IdPrefix::Image])?;
        for video in &group.videos {
            video.expect_prefix("highlights.videos", &[IdPrefix::Video])?;
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct VenueService {
    store: Arc<dyn GraphStore>,
    ids: Arc<IdService>,
}

impl VenueService {
    pub fn new(store: Arc<dyn GraphStore>, ids: Arc<IdService>) -> Self {
        Self { store, ids }
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Venue>> {
        Venue::gen_nullable(self.store.as_ref(), id).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewVenue) -> AppResult<Venue> {
        let timestamp = Utc::now();
        let venue = Venue {
            id: self.ids.generate(IdPrefix::Venue).await?,
            name: input.name,
            latitude: input.latitude,
            longitude: input.longitude,
            country: input.country,
            municipality: input.municipality,
            postcode: input.postcode,
            address: input.address,
            avatar: input.avatar,
            description: input.description,
            media: input.media,
            highlights: input.highlights,
            tags: input.tags,
            capacity: input.capacity,
            venue_type: input.venue_type,
            created: timestamp,
            last_modified: timestamp,
        };
        // A rejected venue only wastes the generated suffix
        check_venue(&venue)?;
        venue.insert(self.store.as_ref()).await?;

        info!("Created venue {}", venue.id);
        Ok(venue)
    }

    #[instrument(skip(self, patch))]
    pub async fn edit(&self, id: &str, patch: VenuePatch) -> AppResult<Venue> {
        let store = self.store.as_ref();
        let current = Venue::gen_enforce(store, id).await?;

        let updated = Venue {
            id: current.id,
            name: patch.name.unwrap_or(current.name),
            latitude: patch.latitude.unwrap_or(current.latitude),
            longitude: patch.longitude.unwrap_or(current.longitude),
            country: patch.country.unwrap_or(current.country),
            municipality: patch.municipality.unwrap_or(current.municipality),
            postcode: patch.postcode.unwrap_or(current.postcode),
            address: patch.address.unwrap_or(current.address),
            avatar: patch.avatar.or(current.avatar),
            description: patch.description.or(current.description),
            media: patch.media.unwrap_or(current.media),
            highlights: patch.highlights.unwrap_or(current.highlights),
            tags: patch.tags.unwrap_or(current.tags),
            capacity: patch.capacity.or(current.capacity),
            venue_type: patch.venue_type.or(current.venue_type),
            created: current.created,
            last_modified: Utc::now(),
        };
        check_venue(&updated)?;

        updated.save(store).await?;
        Ok(updated)
    }

    /// Deleting a venue that still hosts events is refused, since every
    /// event must keep exactly one hosting venue.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let store = self.store.as_ref();
        if Venue::gen_nullable(store, id).await?.is_none() {
            return Ok(false);
        }

        let hosted = store
            .list_edges(id, EdgeType::HostedBy, Direction::Incoming)
            .await?;
        if !hosted.is_empty() {
            return Err(AppError::Conflict(format!(
                "Venue {} still hosts {} event(s)",
                id,
                hosted.len()
            )));
        }

        let deleted = store.delete_node(id).await?;
        info!("Deleted venue {}", id);
        Ok(deleted)
    }

    /// Events hosted at the venue.
    pub async fn hosting(&self, id: &str) -> AppResult<Vec<Event>> {
        let store = self.store.as_ref();
        Venue::gen_enforce(store, id).await?;
        Event::gen_related(store, id, EdgeType::HostedBy, Direction::Incoming).await
    }
}
