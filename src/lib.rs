// Event Directory - events, venues and users over a graph store

// HTTP surface
pub mod api;
pub mod app_state;
pub mod config;

// Core types and primitives
pub mod core;

// Canonical encoding of complex attributes
pub mod conversion;

// Domain entities and the services operating on them
pub mod entities;
pub mod services;

// Graph store and identifier service
pub mod infrastructure;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
