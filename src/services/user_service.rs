// UserService - user profiles, follow graph and likes

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::{EdgeType, IdPrefix, Identifier, NodeLabel};
use crate::entities::{Event, GraphEntity, Likeable, User, Venue, Visibility};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, Edge, GraphStore};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub handle: String,
    pub auth_id: String,
    pub name: String,
    pub birthday: NaiveDate,
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    pub avatar: Option<Identifier>,
    pub links: Vec<String>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    pub avatar: Option<Identifier>,
    pub links: Option<Vec<String>>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
}

fn check_handle(handle: &str) -> AppResult<()> {
    if handle.is_empty() || handle.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid handle",
            handle
        )));
    }
    Ok(())
}

fn check_avatar(avatar: Option<&Identifier>) -> AppResult<()> {
    match avatar {
        Some(id) => id.expect_prefix("avatar", &[IdPrefix::Avatar]),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn GraphStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, handle: &str) -> AppResult<Option<User>> {
        User::gen_nullable(self.store.as_ref(), handle).await
    }

    #[instrument(skip(self, input), fields(handle = %input.handle))]
    pub async fn create(&self, input: NewUser) -> AppResult<User> {
        check_handle(&input.handle)?;
        check_avatar(input.avatar.as_ref())?;

        let store = self.store.as_ref();
        let existing = store
            .find_nodes_by_text(NodeLabel::User, "authId", &input.auth_id)
            .await?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(format!(
                "auth id {} is already registered",
                input.auth_id
            )));
        }

        let now = Utc::now();
        let user = User {
            handle: input.handle,
            auth_id: input.auth_id,
            name: input.name,
            birthday: input.birthday,
            occupation: input.occupation,
            is_student: input.is_student,
            avatar: input.avatar,
            links: input.links,
            biography: input.biography,
            visibility: input.visibility,
            created: now,
            last_modified: now,
            last_seen: now,
        };

        // The store reports a taken handle as Conflict
        user.insert(store).await?;
        info!("Created user {}", user.handle);
        Ok(user)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, handle: &str, patch: UserPatch) -> AppResult<User> {
        let store = self.store.as_ref();
        let current = User::gen_enforce(store, handle).await?;

        let now = Utc::now();
        let updated = User {
            handle: current.handle,
            auth_id: current.auth_id,
            name: patch.name.unwrap_or(current.name),
            birthday: patch.birthday.unwrap_or(current.birthday),
            occupation: patch.occupation.or(current.occupation),
            is_student: patch.is_student.or(current.is_student),
            avatar: patch.avatar.or(current.avatar),
            links: patch.links.unwrap_or(current.links),
            biography: patch.biography.or(current.biography),
            visibility: patch.visibility.or(current.visibility),
            created: current.created,
            last_modified: now,
            last_seen: now,
        };
        check_avatar(updated.avatar.as_ref())?;

        updated.save(store).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, handle: &str) -> AppResult<bool> {
        if User::gen_nullable(self.store.as_ref(), handle).await?.is_none() {
            return Ok(false);
        }
        let deleted = self.store.delete_node(handle).await?;
        info!("Deleted user {}", handle);
        Ok(deleted)
    }

    /// Follow (`follow = true`) or unfollow another user. Idempotent.
    #[instrument(skip(self))]
    pub async fn set_follow(&self, handle: &str, target: &str, follow: bool) -> AppResult<()> {
        if handle == target {
            return Err(AppError::Validation("users cannot follow themselves".to_string()));
        }
        let store = self.store.as_ref();
        User::gen_enforce(store, handle).await?;
        User::gen_enforce(store, target).await?;

        if follow {
            store.add_edge(&Edge::new(handle, EdgeType::Follows, target)).await?;
        } else {
            store.remove_edge(handle, EdgeType::Follows, target).await?;
        }
        Ok(())
    }

    /// Like or unlike an event or venue, chosen by the target's id prefix.
    #[instrument(skip(self))]
    pub async fn set_like(&self, handle: &str, target: &str, like: bool) -> AppResult<()> {
        let store = self.store.as_ref();
        User::gen_enforce(store, handle).await?;
        let target = self.likeable(target).await?.ok_or_else(|| {
            AppError::NotFound(format!("Could not find likeable with ID {}!", target))
        })?;

        if like {
            store
                .add_edge(&Edge::new(handle, EdgeType::Liked, target.id()))
                .await?;
        } else {
            store.remove_edge(handle, EdgeType::Liked, target.id()).await?;
        }
        Ok(())
    }

    /// Users this user follows.
    pub async fn follows(&self, handle: &str) -> AppResult<Vec<User>> {
        let store = self.store.as_ref();
        User::gen_enforce(store, handle).await?;
        User::gen_related(store, handle, EdgeType::Follows, Direction::Outgoing).await
    }

    pub async fn followers(&self, handle: &str) -> AppResult<Vec<User>> {
        let store = self.store.as_ref();
        User::gen_enforce(store, handle).await?;
        User::gen_related(store, handle, EdgeType::Follows, Direction::Incoming).await
    }

    /// Everything the user has liked, oldest like first.
    pub async fn liked(&self, handle: &str) -> AppResult<Vec<Likeable>> {
        let store = self.store.as_ref();
        User::gen_enforce(store, handle).await?;

        let edges = store
            .list_edges(handle, EdgeType::Liked, Direction::Outgoing)
            .await?;
        let mut liked = Vec::with_capacity(edges.len());
        for edge in &edges {
            if let Some(item) = self.likeable(&edge.to).await? {
                liked.push(item);
            }
        }
        Ok(liked)
    }

    async fn likeable(&self, id: &str) -> AppResult<Option<Likeable>> {
        let store = self.store.as_ref();
        let parsed = Identifier::parse(id)?;
        match parsed.prefix() {
            IdPrefix::Event => Ok(Event::gen_nullable(store, id).await?.map(Likeable::Event)),
            IdPrefix::Venue => Ok(Venue::gen_nullable(store, id).await?.map(Likeable::Venue)),
            other => Err(AppError::Validation(format!(
                "'{}' items cannot be liked",
                other
            ))),
        }
    }
}
