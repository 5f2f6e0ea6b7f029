// Core infrastructure modules
pub mod database;        // Graph store interface
pub mod id_generator;    // Identifier generation and CDN resolution
pub mod sqlite_database; // SQLite graph store

pub use database::{Direction, Edge, GraphStore, Node, PropertyValue};
pub use id_generator::{local_generator_router, IdService};
pub use sqlite_database::SqliteGraphStore;
