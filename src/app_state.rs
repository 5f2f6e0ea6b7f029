use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{GraphStore, IdService, SqliteGraphStore},
    services::{EventService, UserService, VenueService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ids: Arc<IdService>,
    pub events: EventService,
    pub venues: VenueService,
    pub users: UserService,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        // Connects and creates the schema
        let store =
            SqliteGraphStore::connect(&config.database.url, config.database.max_connections)
                .await?;

        let ids = IdService::new(
            &config.cdn_uri,
            &config.generator.uri,
            config.generator_timeout(),
        )?;
        info!("Identifier generator at {}", config.generator.uri);

        Ok(Self::from_parts(Arc::new(store), Arc::new(ids), config))
    }

    /// Wire services over an existing store.
    pub fn from_parts(store: Arc<dyn GraphStore>, ids: Arc<IdService>, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            events: EventService::new(store.clone(), ids.clone()),
            venues: VenueService::new(store.clone(), ids.clone()),
            users: UserService::new(store),
            ids,
        }
    }
}
