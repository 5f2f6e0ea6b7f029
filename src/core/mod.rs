// Core types shared by every layer

pub mod strong_types;

pub use strong_types::{EdgeType, IdPrefix, Identifier, NodeLabel, ID_SEPARATOR};
