// Event endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{media_uri, parse_complex, patch_complex, patch_scalar, DeleteResponse};
use crate::app_state::AppState;
use crate::core::Identifier;
use crate::entities::ent_event::{ACCESS_POLICIES_SCALAR, RULE_SECTIONS_SCALAR};
use crate::entities::{Event, INSTANT_SCALAR};
use crate::error::{AppError, AppResult};
use crate::infrastructure::id_generator::IdService;
use crate::services::{EventPatch, NewEvent};

use super::users::UserView;
use super::venues::VenueView;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub music_genres: Vec<String>,
    pub video: Identifier,
    #[serde(default)]
    pub media: Vec<Identifier>,
    /// Canonical string or structured list.
    pub access_policies: Option<Value>,
    pub rules: Option<Value>,
    /// ISO-8601 instant, plain or canonical.
    pub datetime: Value,
    pub duration: Option<i32>,
    pub recurrence: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub hosted_by: String,
}

/// Absent or null fields keep their stored values. Complex fields are
/// canonical string literals.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub music_genres: Option<Vec<String>>,
    pub video: Option<Identifier>,
    pub media: Option<Vec<Identifier>>,
    pub access_policies: Option<Value>,
    pub rules: Option<Value>,
    pub datetime: Option<Value>,
    pub duration: Option<i32>,
    pub recurrence: Option<String>,
    pub tags: Option<Vec<String>>,
    pub hosted_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub music_genres: Vec<String>,
    pub video: String,
    pub video_uri: String,
    pub media: Vec<String>,
    pub media_uris: Vec<String>,
    pub access_policies: String,
    pub rules: String,
    pub datetime: String,
    pub duration: Option<i32>,
    pub recurrence: Option<String>,
    pub tags: Vec<String>,
    pub created: String,
    pub last_modified: String,
}

impl EventView {
    pub fn build(event: &Event, ids: &IdService) -> AppResult<Self> {
        Ok(Self {
            id: event.id.to_string(),
            name: event.name.clone(),
            description: event.description.clone(),
            music_genres: event.music_genres.clone(),
            video: event.video.to_string(),
            video_uri: media_uri(ids, &event.video),
            media: event.media.iter().map(Identifier::to_string).collect(),
            media_uris: event.media.iter().map(|m| media_uri(ids, m)).collect(),
            access_policies: ACCESS_POLICIES_SCALAR.serialize(&event.access_policies)?,
            rules: RULE_SECTIONS_SCALAR.serialize(&event.rules)?,
            datetime: INSTANT_SCALAR.serialize(&event.datetime)?,
            duration: event.duration,
            recurrence: event.recurrence.clone(),
            tags: event.tags.clone(),
            created: INSTANT_SCALAR.serialize(&event.created)?,
            last_modified: INSTANT_SCALAR.serialize(&event.last_modified)?,
        })
    }
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<EventView>>> {
    let events = state.events.recommend(query.limit).await?;
    let views = events
        .iter()
        .map(|e| EventView::build(e, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventView>)> {
    let input = NewEvent {
        name: req.name,
        description: req.description,
        music_genres: req.music_genres,
        video: req.video,
        media: req.media,
        access_policies: parse_complex(&ACCESS_POLICIES_SCALAR, req.access_policies.as_ref())?,
        rules: parse_complex(&RULE_SECTIONS_SCALAR, req.rules.as_ref())?,
        datetime: INSTANT_SCALAR.parse_value(&req.datetime)?,
        duration: req.duration,
        recurrence: req.recurrence,
        tags: req.tags,
        hosted_by: req.hosted_by,
    };
    let event = state.events.create(input).await?;
    Ok((StatusCode::CREATED, Json(EventView::build(&event, &state.ids)?)))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<EventView>> {
    let event = state
        .events
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Could not find Event with ID {}!", id)))?;
    Ok(Json(EventView::build(&event, &state.ids)?))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> AppResult<Json<EventView>> {
    let patch = EventPatch {
        name: req.name,
        description: req.description,
        music_genres: req.music_genres,
        video: req.video,
        media: req.media,
        access_policies: patch_complex(&ACCESS_POLICIES_SCALAR, req.access_policies.as_ref())?,
        rules: patch_complex(&RULE_SECTIONS_SCALAR, req.rules.as_ref())?,
        datetime: patch_scalar(&INSTANT_SCALAR, req.datetime.as_ref())?,
        duration: req.duration,
        recurrence: req.recurrence,
        tags: req.tags,
        hosted_by: req.hosted_by,
    };
    let event = state.events.update(&id, patch).await?;
    Ok(Json(EventView::build(&event, &state.ids)?))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    if !state.events.delete(&id).await? {
        return Err(AppError::NotFound(format!("Could not find Event with ID {}!", id)));
    }
    Ok(Json(DeleteResponse { id, deleted: true }))
}

async fn event_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VenueView>> {
    let venue = state.events.hosted_by(&id).await?;
    Ok(Json(VenueView::build(&venue, &state.ids)?))
}

async fn event_likes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state.events.liked_by(&id).await?;
    let views = users
        .iter()
        .map(|u| UserView::build(u, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/events/{id}/venue", get(event_venue))
        .route("/events/{id}/likes", get(event_likes))
}
