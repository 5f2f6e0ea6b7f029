// HTTP API - axum router over the directory services

pub mod events;
pub mod users;
pub mod venues;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::conversion::{Canonical, WireLiteral, WireScalar};
use crate::core::Identifier;
use crate::error::AppResult;
use crate::infrastructure::id_generator::IdService;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaView {
    pub id: String,
    pub uri: String,
}

pub(crate) fn media_uri(ids: &IdService, id: &Identifier) -> String {
    ids.locate(id).to_string()
}

/// Complex field of a create request; absent means empty.
pub(crate) fn parse_complex<T: Canonical + Default>(
    scalar: &WireScalar<T>,
    input: Option<&Value>,
) -> AppResult<T> {
    match input {
        Some(value) => scalar.parse_value(value),
        None => Ok(T::default()),
    }
}

/// Date or time field of a partial update. Absent keeps the stored value;
/// anything present must coerce.
pub(crate) fn patch_scalar<T: Canonical>(
    scalar: &WireScalar<T>,
    input: Option<&Value>,
) -> AppResult<Option<T>> {
    input.map(|value| scalar.parse_value(value)).transpose()
}

/// Complex field of a partial update; `None` keeps the stored value.
pub(crate) fn patch_complex<T: Canonical>(
    scalar: &WireScalar<T>,
    input: Option<&Value>,
) -> AppResult<Option<T>> {
    match input {
        Some(value) => scalar.parse_literal(&WireLiteral::from(value)),
        None => Ok(None),
    }
}

async fn resolve_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MediaView>> {
    let uri = state.ids.resolve(&id)?;
    Ok(Json(MediaView {
        id,
        uri: uri.to_string(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Full application router: `/health` plus the resource routes under `/api/v1`.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(events::routes())
        .merge(venues::routes())
        .merge(users::routes())
        .route("/media/{id}", get(resolve_media));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}
