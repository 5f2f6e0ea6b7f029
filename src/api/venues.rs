// Venue endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::EventView;
use super::{media_uri, parse_complex, patch_complex, DeleteResponse};
use crate::app_state::AppState;
use crate::core::Identifier;
use crate::entities::ent_venue::HIGHLIGHT_GROUPS_SCALAR;
use crate::entities::{Venue, INSTANT_SCALAR};
use crate::error::{AppError, AppResult};
use crate::infrastructure::id_generator::IdService;
use crate::services::{NewVenue, VenuePatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVenueRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub municipality: String,
    pub postcode: String,
    pub address: String,
    pub avatar: Option<Identifier>,
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Identifier>,
    pub highlights: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub capacity: Option<i32>,
    #[serde(rename = "type")]
    pub venue_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditVenueRequest {
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
    /// Canonical string literal.
    pub highlights: Option<Value>,
    pub tags: Option<Vec<String>>,
    pub capacity: Option<i32>,
    #[serde(rename = "type")]
    pub venue_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueView {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub municipality: String,
    pub postcode: String,
    pub address: String,
    pub avatar: Option<String>,
    pub avatar_uri: Option<String>,
    pub description: Option<String>,
    pub media: Vec<String>,
    pub media_uris: Vec<String>,
    pub highlights: String,
    pub tags: Vec<String>,
    pub capacity: Option<i32>,
    #[serde(rename = "type")]
    pub venue_type: Option<String>,
    pub created: String,
    pub last_modified: String,
}

impl VenueView {
    pub fn build(venue: &Venue, ids: &IdService) -> AppResult<Self> {
        Ok(Self {
            id: venue.id.to_string(),
            name: venue.name.clone(),
            latitude: venue.latitude,
            longitude: venue.longitude,
            country: venue.country.clone(),
            municipality: venue.municipality.clone(),
            postcode: venue.postcode.clone(),
            address: venue.address.clone(),
            avatar: venue.avatar.as_ref().map(Identifier::to_string),
            avatar_uri: venue.avatar.as_ref().map(|a| media_uri(ids, a)),
            description: venue.description.clone(),
            media: venue.media.iter().map(Identifier::to_string).collect(),
            media_uris: venue.media.iter().map(|m| media_uri(ids, m)).collect(),
            highlights: HIGHLIGHT_GROUPS_SCALAR.serialize(&venue.highlights)?,
            tags: venue.tags.clone(),
            capacity: venue.capacity,
            venue_type: venue.venue_type.clone(),
            created: INSTANT_SCALAR.serialize(&venue.created)?,
            last_modified: INSTANT_SCALAR.serialize(&venue.last_modified)?,
        })
    }
}

async fn create_venue(
    State(state): State<AppState>,
    Json(req): Json<CreateVenueRequest>,
) -> AppResult<(StatusCode, Json<VenueView>)> {
    let input = NewVenue {
        name: req.name,
        latitude: req.latitude,
        longitude: req.longitude,
        country: req.country,
        municipality: req.municipality,
        postcode: req.postcode,
        address: req.address,
        avatar: req.avatar,
        description: req.description,
        media: req.media,
        highlights: parse_complex(&HIGHLIGHT_GROUPS_SCALAR, req.highlights.as_ref())?,
        tags: req.tags,
        capacity: req.capacity,
        venue_type: req.venue_type,
    };
    let venue = state.venues.create(input).await?;
    Ok((StatusCode::CREATED, Json(VenueView::build(&venue, &state.ids)?)))
}

async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<VenueView>> {
    let venue = state
        .venues
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Could not find Venue with ID {}!", id)))?;
    Ok(Json(VenueView::build(&venue, &state.ids)?))
}

async fn edit_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EditVenueRequest>,
) -> AppResult<Json<VenueView>> {
    let patch = VenuePatch {
        name: req.name,
        latitude: req.latitude,
        longitude: req.longitude,
        country: req.country,
        municipality: req.municipality,
        postcode: req.postcode,
        address: req.address,
        avatar: req.avatar,
        description: req.description,
        media: req.media,
        highlights: patch_complex(&HIGHLIGHT_GROUPS_SCALAR, req.highlights.as_ref())?,
        tags: req.tags,
        capacity: req.capacity,
        venue_type: req.venue_type,
    };
    let venue = state.venues.edit(&id, patch).await?;
    Ok(Json(VenueView::build(&venue, &state.ids)?))
}

async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    if !state.venues.delete(&id).await? {
        return Err(AppError::NotFound(format!("Could not find Venue with ID {}!", id)));
    }
    Ok(Json(DeleteResponse { id, deleted: true }))
}

async fn venue_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<EventView>>> {
    let events = state.venues.hosting(&id).await?;
    let views = events
        .iter()
        .map(|e| EventView::build(e, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/venues", post(create_venue))
        .route(
            "/venues/{id}",
            get(get_venue).patch(edit_venue).delete(delete_venue),
        )
        .route("/venues/{id}/events", get(venue_events))
}
