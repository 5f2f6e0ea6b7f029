// EventService - create/read/update/delete for events and their hosting edge

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::core::{EdgeType, IdPrefix, Identifier};
use crate::entities::{AccessPolicy, Event, GraphEntity, RuleSection, User, Venue};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, Edge, GraphStore};
use crate::infrastructure::id_generator::IdService;

/// Upper bound for listing queries.
pub const MAX_LISTED_EVENTS: u32 = 100;

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub music_genres: Vec<String>,
    pub video: Identifier,
    pub media: Vec<Identifier>,
    pub access_policies: Vec<AccessPolicy>,
    pub rules: Vec<RuleSection>,
    pub datetime: DateTime<Utc>,
    pub duration: Option<i32>,
    pub recurrence: Option<String>,
    pub tags: Vec<String>,
    /// Venue id.
    pub hosted_by: String,
}

/// Field-level partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub music_genres: Option<Vec<String>>,
    pub video: Option<Identifier>,
    pub media: Option<Vec<Identifier>>,
    pub access_policies: Option<Vec<AccessPolicy>>,
    pub rules: Option<Vec<RuleSection>>,
    pub datetime: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub recurrence: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Move the event to another venue.
    pub hosted_by: Option<String>,
}

pub(crate) fn check_event_media(video: &Identifier, media: &[Identifier]) -> AppResult<()> {
    video.expect_prefix("video", &[IdPrefix::Video])?;
    for item in media {
        item.expect_prefix("media", &[IdPrefix::Video, IdPrefix::Image])?;
    }
    Ok(())
}

fn check_duration(duration: Option<i32>) -> AppResult<()> {
    match duration {
        Some(d) if d < 0 => Err(AppError::Validation(format!(
            "duration must not be negative, got {}",
            d
        ))),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn GraphStore>,
    ids: Arc<IdService>,
}

impl EventService {
    pub fn new(store: Arc<dyn GraphStore>, ids: Arc<IdService>) -> Self {
        Self { store, ids }
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Event>> {
        Event::gen_nullable(self.store.as_ref(), id).await
    }

    /// Events offered to the requesting user. Until a recommender exists
    /// this is every event, up to `limit`.
    pub async fn recommend(&self, limit: Option<u32>) -> AppResult<Vec<Event>> {
        let limit = limit.unwrap_or(MAX_LISTED_EVENTS).min(MAX_LISTED_EVENTS);
        Event::gen_all(self.store.as_ref(), limit).await
    }

    #[instrument(skip(self, input), fields(name = %input.name, venue = %input.hosted_by))]
    pub async fn create(&self, input: NewEvent) -> AppResult<Event> {
        check_event_media(&input.video, &input.media)?;
        check_duration(input.duration)?;

        let store = self.store.as_ref();
        let venue = Venue::gen_enforce(store, &input.hosted_by).await?;

        let id = self.ids.generate(IdPrefix::Event).await?;
        let timestamp = Utc::now();

        let event = Event {
            id,
            name: input.name,
            description: input.description,
            music_genres: input.music_genres,
            video: input.video,
            media: input.media,
            access_policies: input.access_policies,
            rules: input.rules,
            datetime: input.datetime,
            duration: input.duration,
            recurrence: input.recurrence,
            tags: input.tags,
            created: timestamp,
            last_modified: timestamp,
        };

        event.insert(store).await?;
        if let Err(e) = store
            .add_edge(&Edge::new(event.id.as_str(), EdgeType::HostedBy, venue.id.as_str()))
            .await
        {
            // An event must never exist without its venue
            warn!("rolling back event {} after hosting edge failure: {}", event.id, e);
            store.delete_node(event.id.as_str()).await?;
            return Err(e);
        }

        info!("Created event {} at venue {}", event.id, venue.id);
        Ok(event)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: EventPatch) -> AppResult<Event> {
        let store = self.store.as_ref();
        let current = Event::gen_enforce(store, id).await?;

        let updated = Event {
            id: current.id,
            name: patch.name.unwrap_or(current.name),
            description: patch.description.or(current.description),
            music_genres: patch.music_genres.unwrap_or(current.music_genres),
            video: patch.video.unwrap_or(current.video),
            media: patch.media.unwrap_or(current.media),
            access_policies: patch.access_policies.unwrap_or(current.access_policies),
            rules: patch.rules.unwrap_or(current.rules),
            datetime: patch.datetime.unwrap_or(current.datetime),
            duration: patch.duration.or(current.duration),
            recurrence: patch.recurrence.or(current.recurrence),
            tags: patch.tags.unwrap_or(current.tags),
            created: current.created,
            last_modified: Utc::now(),
        };
        check_event_media(&updated.video, &updated.media)?;
        check_duration(updated.duration)?;

        let new_venue = match &patch.hosted_by {
            Some(venue_id) => Some(Venue::gen_enforce(store, venue_id).await?),
            None => None,
        };

        match new_venue {
            Some(venue) => {
                updated
                    .save_relinked(store, EdgeType::HostedBy, venue.id.as_str())
                    .await?;
                info!("Moved event {} to venue {}", id, venue.id);
            }
            None => updated.save(store).await?,
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        if Event::gen_nullable(self.store.as_ref(), id).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.store.delete_node(id).await?;
        info!("Deleted event {}", id);
        Ok(deleted)
    }

    /// The venue hosting the event.
    pub async fn hosted_by(&self, id: &str) -> AppResult<Venue> {
        let store = self.store.as_ref();
        Event::gen_enforce(store, id).await?;

        Venue::gen_related(store, id, EdgeType::HostedBy, Direction::Outgoing)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal(format!("Event {} has no hosting venue", id)))
    }

    pub async fn liked_by(&self, id: &str) -> AppResult<Vec<User>> {
        let store = self.store.as_ref();
        Event::gen_enforce(store, id).await?;
        User::gen_related(store, id, EdgeType::Liked, Direction::Incoming).await
    }
}
