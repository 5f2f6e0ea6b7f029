// User endpoints: profiles, follows and likes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::EventView;
use super::venues::VenueView;
use super::{media_uri, patch_scalar, DeleteResponse};
use crate::app_state::AppState;
use crate::core::Identifier;
use crate::entities::{Likeable, User, Visibility, INSTANT_SCALAR, LOCAL_DATE_SCALAR};
use crate::error::{AppError, AppResult};
use crate::infrastructure::id_generator::IdService;
use crate::services::{NewUser, UserPatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub handle: String,
    pub auth_id: String,
    pub name: String,
    /// ISO-8601 date, plain or canonical.
    pub birthday: Value,
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    pub avatar: Option<Identifier>,
    #[serde(default)]
    pub links: Vec<String>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub birthday: Option<Value>,
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    pub avatar: Option<Identifier>,
    pub links: Option<Vec<String>>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub handle: String,
    pub name: String,
    pub birthday: String,
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    pub avatar: Option<String>,
    pub avatar_uri: Option<String>,
    pub links: Vec<String>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
    pub created: String,
    pub last_modified: String,
    pub last_seen: String,
}

impl UserView {
    pub fn build(user: &User, ids: &IdService) -> AppResult<Self> {
        Ok(Self {
            handle: user.handle.clone(),
            name: user.name.clone(),
            birthday: LOCAL_DATE_SCALAR.serialize(&user.birthday)?,
            occupation: user.occupation.clone(),
            is_student: user.is_student,
            avatar: user.avatar.as_ref().map(Identifier::to_string),
            avatar_uri: user.avatar.as_ref().map(|a| media_uri(ids, a)),
            links: user.links.clone(),
            biography: user.biography.clone(),
            visibility: user.visibility,
            created: INSTANT_SCALAR.serialize(&user.created)?,
            last_modified: INSTANT_SCALAR.serialize(&user.last_modified)?,
            last_seen: INSTANT_SCALAR.serialize(&user.last_seen)?,
        })
    }
}

/// A liked item, tagged with its kind.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LikedView {
    Event(EventView),
    Venue(VenueView),
}

impl LikedView {
    fn build(item: &Likeable, ids: &IdService) -> AppResult<Self> {
        Ok(match item {
            Likeable::Event(event) => LikedView::Event(EventView::build(event, ids)?),
            Likeable::Venue(venue) => LikedView::Venue(VenueView::build(venue, ids)?),
        })
    }
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let input = NewUser {
        handle: req.handle,
        auth_id: req.auth_id,
        name: req.name,
        birthday: LOCAL_DATE_SCALAR.parse_value(&req.birthday)?,
        occupation: req.occupation,
        is_student: req.is_student,
        avatar: req.avatar,
        links: req.links,
        biography: req.biography,
        visibility: req.visibility,
    };
    let user = state.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(UserView::build(&user, &state.ids)?)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<UserView>> {
    let user = state
        .users
        .get(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Could not find User with ID {}!", handle)))?;
    Ok(Json(UserView::build(&user, &state.ids)?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<UserView>> {
    let patch = UserPatch {
        name: req.name,
        birthday: patch_scalar(&LOCAL_DATE_SCALAR, req.birthday.as_ref())?,
        occupation: req.occupation,
        is_student: req.is_student,
        avatar: req.avatar,
        links: req.links,
        biography: req.biography,
        visibility: req.visibility,
    };
    let user = state.users.update(&handle, patch).await?;
    Ok(Json(UserView::build(&user, &state.ids)?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    if !state.users.delete(&handle).await? {
        return Err(AppError::NotFound(format!("Could not find User with ID {}!", handle)));
    }
    Ok(Json(DeleteResponse {
        id: handle,
        deleted: true,
    }))
}

async fn follow(
    State(state): State<AppState>,
    Path((handle, target)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.users.set_follow(&handle, &target, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unfollow(
    State(state): State<AppState>,
    Path((handle, target)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.users.set_follow(&handle, &target, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like(
    State(state): State<AppState>,
    Path((handle, target)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.users.set_like(&handle, &target, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlike(
    State(state): State<AppState>,
    Path((handle, target)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state.users.set_like(&handle, &target, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_follows(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state.users.follows(&handle).await?;
    let views = users
        .iter()
        .map(|u| UserView::build(u, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

async fn list_followers(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state.users.followers(&handle).await?;
    let views = users
        .iter()
        .map(|u| UserView::build(u, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

async fn list_likes(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<Vec<LikedView>>> {
    let liked = state.users.liked(&handle).await?;
    let views = liked
        .iter()
        .map(|item| LikedView::build(item, &state.ids))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(views))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/{handle}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{handle}/follows", get(list_follows))
        .route("/users/{handle}/follows/{target}", put(follow).delete(unfollow))
        .route("/users/{handle}/followers", get(list_followers))
        .route("/users/{handle}/likes", get(list_likes))
        .route("/users/{handle}/likes/{target}", put(like).delete(unlike))
}
