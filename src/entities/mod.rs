// Directory entities - node-shaped records and their mapping onto the graph store

pub mod ent_event;
pub mod ent_user;
pub mod ent_venue;

pub use ent_event::{AccessPolicy, Event, Rule, RuleSection};
pub use ent_user::{Likeable, User, Visibility};
pub use ent_venue::{HighlightGroup, Venue};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::conversion::{Canonical, PropertyConverter, WireScalar};
use crate::core::{EdgeType, Identifier, NodeLabel};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, Edge, GraphStore, Node};

/// Storage converters shared by every entity.
pub const INSTANT: PropertyConverter<DateTime<Utc>> = PropertyConverter::new();
pub const LOCAL_DATE: PropertyConverter<NaiveDate> = PropertyConverter::new();

pub const INSTANT_SCALAR: WireScalar<DateTime<Utc>> = WireScalar::new("Instant");
pub const LOCAL_DATE_SCALAR: WireScalar<NaiveDate> = WireScalar::new("LocalDate");

/// A record persisted as one graph node.
pub trait NodeEntity: Sized + Send + Sync {
    fn label() -> NodeLabel;
    fn id(&self) -> &str;
    fn to_node(&self) -> AppResult<Node>;
    fn from_node(node: &Node) -> AppResult<Self>;
}

/// Store operations available to every entity
#[async_trait]
pub trait GraphEntity: NodeEntity {
    async fn gen_nullable(store: &dyn GraphStore, id: &str) -> AppResult<Option<Self>> {
        match store.get_node(Self::label(), id).await? {
            Some(node) => Ok(Some(Self::from_node(&node)?)),
            None => Ok(None),
        }
    }

    /// Like `gen_nullable`, but a missing node is `NotFound`
    async fn gen_enforce(store: &dyn GraphStore, id: &str) -> AppResult<Self> {
        Self::gen_nullable(store, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Could not find {} with ID {}!", Self::label(), id)))
    }

    async fn gen_all(store: &dyn GraphStore, limit: u32) -> AppResult<Vec<Self>> {
        let nodes = store.list_nodes(Self::label(), limit).await?;
        nodes.iter().map(Self::from_node).collect()
    }

    async fn insert(&self, store: &dyn GraphStore) -> AppResult<()> {
        store.create_node(&self.to_node()?).await
    }

    async fn save(&self, store: &dyn GraphStore) -> AppResult<()> {
        store.update_node(&self.to_node()?).await
    }

    /// Save and point the entity's `edge_type` edge at `to`, atomically.
    async fn save_relinked(
        &self,
        store: &dyn GraphStore,
        edge_type: EdgeType,
        to: &str,
    ) -> AppResult<()> {
        store
            .update_node_relinked(&self.to_node()?, &Edge::new(self.id(), edge_type, to))
            .await
    }

    /// Nodes of this type at the other end of `edge_type` edges.
    async fn gen_related(
        store: &dyn GraphStore,
        id: &str,
        edge_type: EdgeType,
        direction: Direction,
    ) -> AppResult<Vec<Self>> {
        let edges = store.list_edges(id, edge_type, direction).await?;
        let mut related = Vec::with_capacity(edges.len());
        for edge in &edges {
            if let Some(entity) = Self::gen_nullable(store, edge.other_end(direction)).await? {
                related.push(entity);
            }
        }
        Ok(related)
    }
}

#[async_trait]
impl<T: NodeEntity> GraphEntity for T {}

/// Write a complex attribute through its converter.
pub(crate) fn put_complex<T: Canonical>(
    node: &mut Node,
    key: &str,
    converter: &PropertyConverter<T>,
    value: &T,
) -> AppResult<()> {
    node.set_opt(key, converter.to_storage(Some(value))?);
    Ok(())
}

/// Read a complex attribute that must be present.
pub(crate) fn get_complex<T: Canonical>(
    node: &Node,
    key: &str,
    converter: &PropertyConverter<T>,
) -> AppResult<T> {
    converter.from_storage(node.text(key)?)?.ok_or_else(|| {
        AppError::MalformedEncoding(format!(
            "required property '{}' missing on {} {}",
            key, node.label, node.id
        ))
    })
}

/// Read a complex attribute, absent meaning the type's empty value.
pub(crate) fn get_complex_or_default<T: Canonical + Default>(
    node: &Node,
    key: &str,
    converter: &PropertyConverter<T>,
) -> AppResult<T> {
    Ok(converter.from_storage(node.text(key)?)?.unwrap_or_default())
}

pub(crate) fn stored_identifier(node: &Node, key: &str, raw: &str) -> AppResult<Identifier> {
    Identifier::parse(raw).map_err(|e| {
        AppError::MalformedEncoding(format!(
            "property '{}' on {} {} holds a bad identifier: {}",
            key, node.label, node.id, e
        ))
    })
}

pub(crate) fn get_identifier(node: &Node, key: &str) -> AppResult<Option<Identifier>> {
    node.text(key)?
        .map(|raw| stored_identifier(node, key, raw))
        .transpose()
}

pub(crate) fn require_identifier(node: &Node, key: &str) -> AppResult<Identifier> {
    stored_identifier(node, key, node.require_text(key)?)
}

pub(crate) fn get_identifiers(node: &Node, key: &str) -> AppResult<Vec<Identifier>> {
    node.text_list(key)?
        .iter()
        .map(|raw| stored_identifier(node, key, raw))
        .collect()
}

pub(crate) fn identifier_list(ids: &[Identifier]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
