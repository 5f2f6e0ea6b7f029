use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::collections::BTreeMap;
use tracing::info;

use crate::core::{EdgeType, NodeLabel};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{Direction, Edge, GraphStore, Node, PropertyValue};

/// SQLite implementation of the graph store
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self { pool };
        store.initialize().await?;
        info!("Graph store ready at {}", url);
        Ok(store)
    }

    /// Single-connection in-memory store; the connection is never recycled
    /// because the database lives only as long as it does.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist yet
    async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                properties TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create nodes table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS edges (
                src TEXT NOT NULL,
                edge_type TEXT NOT NULL,
                dst TEXT NOT NULL,
                created INTEGER NOT NULL,
                PRIMARY KEY (src, edge_type, dst)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create edges table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create nodes label index: {}", e))
            })?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_edges_dst ON edges(dst, edge_type)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create edges target index: {}", e))
            })?;

        Ok(())
    }

    fn encode_properties(node: &Node) -> AppResult<String> {
        serde_json::to_string(&node.properties).map_err(|e| {
            AppError::DatabaseError(format!("Failed to encode properties of {}: {}", node.id, e))
        })
    }

    fn row_to_node(row: &SqliteRow) -> AppResult<Node> {
        let id: String = row.try_get("id")?;
        let label: String = row.try_get("label")?;
        let raw: String = row.try_get("properties")?;
        let properties: BTreeMap<String, PropertyValue> = serde_json::from_str(&raw)
            .map_err(|e| AppError::DatabaseError(format!("Corrupt properties on {}: {}", id, e)))?;

        Ok(Node {
            id,
            label: label.parse()?,
            properties,
        })
    }

    fn row_to_edge(row: &SqliteRow) -> AppResult<Edge> {
        let edge_type: String = row.try_get("edge_type")?;
        let created: i64 = row.try_get("created")?;
        Ok(Edge {
            from: row.try_get("src")?,
            edge_type: edge_type.parse()?,
            to: row.try_get("dst")?,
            created: Utc
                .timestamp_millis_opt(created)
                .single()
                .ok_or_else(|| AppError::DatabaseError(format!("Bad edge timestamp {}", created)))?,
        })
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn create_node(&self, node: &Node) -> AppResult<()> {
        let properties = Self::encode_properties(node)?;
        let result = sqlx::query("INSERT INTO nodes (id, label, properties) VALUES (?, ?, ?)")
            .bind(&node.id)
            .bind(node.label.as_str())
            .bind(properties)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("{} with id {} already exists", node.label, node.id),
            )),
            Err(e) => Err(AppError::DatabaseError(format!(
                "Failed to create node {}: {}",
                node.id, e
            ))),
        }
    }

    async fn update_node(&self, node: &Node) -> AppResult<()> {
        let properties = Self::encode_properties(node)?;
        let result = sqlx::query("UPDATE nodes SET properties = ? WHERE id = ? AND label = ?")
            .bind(properties)
            .bind(&node.id)
            .bind(node.label.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update node {}: {}", node.id, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} with id {} not found",
                node.label, node.id
            )));
        }
        Ok(())
    }

    async fn get_node(&self, label: NodeLabel, id: &str) -> AppResult<Option<Node>> {
        let row = sqlx::query("SELECT id, label, properties FROM nodes WHERE id = ? AND label = ?")
            .bind(id)
            .bind(label.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get node {}: {}", id, e)))?;

        row.as_ref().map(Self::row_to_node).transpose()
    }

    async fn list_nodes(&self, label: NodeLabel, limit: u32) -> AppResult<Vec<Node>> {
        let rows = sqlx::query(
            "SELECT id, label, properties FROM nodes WHERE label = ? ORDER BY id LIMIT ?",
        )
        .bind(label.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list {} nodes: {}", label, e)))?;

        rows.iter().map(Self::row_to_node).collect()
    }

    async fn find_nodes_by_text(
        &self,
        label: NodeLabel,
        key: &str,
        value: &str,
    ) -> AppResult<Vec<Node>> {
        let path = format!("$.\"{}\".value", key);
        let rows = sqlx::query(
            "SELECT id, label, properties FROM nodes WHERE label = ? AND json_extract(properties, ?) = ?",
        )
        .bind(label.as_str())
        .bind(path)
        .bind(value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to search {} nodes: {}", label, e)))?;

        rows.iter().map(Self::row_to_node).collect()
    }

    async fn delete_node(&self, id: &str) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM edges WHERE src = ? OR dst = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to detach node {}: {}", id, e)))?;

        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete node {}: {}", id, e)))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_node_relinked(&self, node: &Node, edge: &Edge) -> AppResult<()> {
        if edge.from != node.id {
            return Err(AppError::Internal(format!(
                "{} edge from {} cannot relink node {}",
                edge.edge_type, edge.from, node.id
            )));
        }
        let properties = Self::encode_properties(node)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM edges WHERE src = ? AND edge_type = ?")
            .bind(&node.id)
            .bind(edge.edge_type.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to unlink {} edges of {}: {}",
                    edge.edge_type, node.id, e
                ))
            })?;

        sqlx::query("INSERT INTO edges (src, edge_type, dst, created) VALUES (?, ?, ?, ?)")
            .bind(&edge.from)
            .bind(edge.edge_type.as_str())
            .bind(&edge.to)
            .bind(edge.created.timestamp_millis())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to add {} edge {} -> {}: {}",
                    edge.edge_type, edge.from, edge.to, e
                ))
            })?;

        let result = sqlx::query("UPDATE nodes SET properties = ? WHERE id = ? AND label = ?")
            .bind(properties)
            .bind(&node.id)
            .bind(node.label.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update node {}: {}", node.id, e))
            })?;

        // Dropping the transaction rolls the edge swap back
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} with id {} not found",
                node.label, node.id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn add_edge(&self, edge: &Edge) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO edges (src, edge_type, dst, created) VALUES (?, ?, ?, ?)",
        )
        .bind(&edge.from)
        .bind(edge.edge_type.as_str())
        .bind(&edge.to)
        .bind(edge.created.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to add {} edge {} -> {}: {}",
                edge.edge_type, edge.from, edge.to, e
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_edge(&self, from: &str, edge_type: EdgeType, to: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM edges WHERE src = ? AND edge_type = ? AND dst = ?")
            .bind(from)
            .bind(edge_type.as_str())
            .bind(to)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to remove {} edge {} -> {}: {}",
                    edge_type, from, to, e
                ))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_edges_from(&self, from: &str, edge_type: EdgeType) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM edges WHERE src = ? AND edge_type = ?")
            .bind(from)
            .bind(edge_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to remove {} edges from {}: {}",
                    edge_type, from, e
                ))
            })?;

        Ok(result.rows_affected())
    }

    async fn list_edges(
        &self,
        id: &str,
        edge_type: EdgeType,
        direction: Direction,
    ) -> AppResult<Vec<Edge>> {
        let sql = match direction {
            Direction::Outgoing => {
                "SELECT src, edge_type, dst, created FROM edges WHERE src = ? AND edge_type = ? ORDER BY created, dst"
            }
            Direction::Incoming => {
                "SELECT src, edge_type, dst, created FROM edges WHERE dst = ? AND edge_type = ? ORDER BY created, src"
            }
        };

        let rows = sqlx::query(sql)
            .bind(id)
            .bind(edge_type.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to list {} edges of {}: {}", edge_type, id, e))
            })?;

        rows.iter().map(Self::row_to_edge).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(handle: &str) -> Node {
        let mut node = Node::new(handle, NodeLabel::User);
        node.set("name", handle.to_uppercase());
        node.set("authId", format!("auth0|{}", handle));
        node
    }

    #[tokio::test]
    async fn test_node_lifecycle() {
        let store = SqliteGraphStore::new_in_memory().await.unwrap();
        let alice = user("alice");

        store.create_node(&alice).await.unwrap();
        assert!(matches!(store.create_node(&alice).await, Err(AppError::Conflict(_))));

        let loaded = store.get_node(NodeLabel::User, "alice").await.unwrap().unwrap();
        assert_eq!(loaded, alice);
        assert!(store.get_node(NodeLabel::Venue, "alice").await.unwrap().is_none());

        let mut renamed = alice.clone();
        renamed.set("name", "Alice");
        store.update_node(&renamed).await.unwrap();
        let loaded = store.get_node(NodeLabel::User, "alice").await.unwrap().unwrap();
        assert_eq!(loaded.require_text("name").unwrap(), "Alice");

        assert!(matches!(
            store.update_node(&user("nobody")).await,
            Err(AppError::NotFound(_))
        ));

        let found = store
            .find_nodes_by_text(NodeLabel::User, "authId", "auth0|alice")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        assert!(store.delete_node("alice").await.unwrap());
        assert!(!store.delete_node("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_edges_are_read_from_both_ends() {
        let store = SqliteGraphStore::new_in_memory().await.unwrap();
        for handle in ["alice", "bob", "carol"] {
            store.create_node(&user(handle)).await.unwrap();
        }

        assert!(store.add_edge(&Edge::new("alice", EdgeType::Follows, "bob")).await.unwrap());
        assert!(!store.add_edge(&Edge::new("alice", EdgeType::Follows, "bob")).await.unwrap());
        store.add_edge(&Edge::new("carol", EdgeType::Follows, "bob")).await.unwrap();

        let outgoing = store.list_edges("alice", EdgeType::Follows, Direction::Outgoing).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to, "bob");

        let incoming = store.list_edges("bob", EdgeType::Follows, Direction::Incoming).await.unwrap();
        let followers: Vec<&str> = incoming.iter().map(|e| e.from.as_str()).collect();
        assert_eq!(followers.len(), 2);
        assert!(followers.contains(&"alice") && followers.contains(&"carol"));

        // Not symmetric
        assert!(store
            .list_edges("bob", EdgeType::Follows, Direction::Outgoing)
            .await
            .unwrap()
            .is_empty());

        assert!(store.remove_edge("alice", EdgeType::Follows, "bob").await.unwrap());
        assert!(!store.remove_edge("alice", EdgeType::Follows, "bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_node_removes_incident_edges() {
        let store = SqliteGraphStore::new_in_memory().await.unwrap();
        for handle in ["alice", "bob"] {
            store.create_node(&user(handle)).await.unwrap();
        }
        store.add_edge(&Edge::new("alice", EdgeType::Follows, "bob")).await.unwrap();
        store.add_edge(&Edge::new("bob", EdgeType::Follows, "alice")).await.unwrap();

        store.delete_node("bob").await.unwrap();

        assert!(store.list_edges("alice", EdgeType::Follows, Direction::Outgoing).await.unwrap().is_empty());
        assert!(store.list_edges("alice", EdgeType::Follows, Direction::Incoming).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_node_relinked_swaps_edges() {
        let store = SqliteGraphStore::new_in_memory().await.unwrap();
        for handle in ["alice", "bob", "carol"] {
            store.create_node(&user(handle)).await.unwrap();
        }
        store.add_edge(&Edge::new("alice", EdgeType::Follows, "bob")).await.unwrap();
        store.add_edge(&Edge::new("alice", EdgeType::Liked, "bob")).await.unwrap();

        let mut renamed = user("alice");
        renamed.set("name", "Alice");
        store
            .update_node_relinked(&renamed, &Edge::new("alice", EdgeType::Follows, "carol"))
            .await
            .unwrap();

        let loaded = store.get_node(NodeLabel::User, "alice").await.unwrap().unwrap();
        assert_eq!(loaded.require_text("name").unwrap(), "Alice");
        let follows = store.list_edges("alice", EdgeType::Follows, Direction::Outgoing).await.unwrap();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].to, "carol");
        // Other edge types are untouched
        assert_eq!(store.list_edges("alice", EdgeType::Liked, Direction::Outgoing).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_node_relinked_rolls_back_on_missing_node() {
        let store = SqliteGraphStore::new_in_memory().await.unwrap();
        store.create_node(&user("bob")).await.unwrap();
        // Edges carry no foreign keys, so a dangling source can be staged
        store.add_edge(&Edge::new("ghost", EdgeType::Follows, "bob")).await.unwrap();

        let result = store
            .update_node_relinked(&user("ghost"), &Edge::new("ghost", EdgeType::Follows, "carol"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let edges = store.list_edges("ghost", EdgeType::Follows, Direction::Outgoing).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "bob");

        let mismatched = store
            .update_node_relinked(&user("bob"), &Edge::new("ghost", EdgeType::Follows, "bob"))
            .await;
        assert!(matches!(mismatched, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("graph.db").display());

        {
            let store = SqliteGraphStore::connect(&url, 2).await.unwrap();
            store.create_node(&user("alice")).await.unwrap();
            store.remove_edges_from("alice", EdgeType::Liked).await.unwrap();
        }

        let store = SqliteGraphStore::connect(&url, 2).await.unwrap();
        assert_eq!(store.list_nodes(NodeLabel::User, 10).await.unwrap().len(), 1);
    }
}
