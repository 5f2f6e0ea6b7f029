// Venue - a physical location that hosts events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    get_complex, get_complex_or_default, get_identifier, get_identifiers, identifier_list,
    put_complex, stored_identifier, NodeEntity, INSTANT,
};
use crate::conversion::{PropertyConverter, WireScalar};
use crate::core::{Identifier, NodeLabel};
use crate::error::AppResult;
use crate::infrastructure::database::Node;

/// A titled group of highlight videos with a front cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HighlightGroup {
    pub title: String,
    /// Prefix `image`.
    pub cover: Identifier,
    /// Prefix `video`.
    pub videos: Vec<Identifier>,
}

crate::canonical!(HighlightGroup);

pub const HIGHLIGHT_GROUPS: PropertyConverter<Vec<HighlightGroup>> = PropertyConverter::new();

pub const HIGHLIGHT_GROUPS_SCALAR: WireScalar<Vec<HighlightGroup>> =
    WireScalar::new("HighlightGroups");

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    /// Prefix `venue`.
    pub id: Identifier,
    /// Not necessarily unique.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 3166-1 alpha-3.
    pub country: String,
    pub municipality: String,
    pub postcode: String,
    pub address: String,
    /// Prefix `image`.
    pub avatar: Option<Identifier>,
    pub description: Option<String>,
    /// Ordered.
    pub media: Vec<Identifier>,
    pub highlights: Vec<HighlightGroup>,
    pub tags: Vec<String>,
    pub capacity: Option<i32>,
    pub venue_type: Option<String>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl NodeEntity for Venue {
    fn label() -> NodeLabel {
        NodeLabel::Venue
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn to_node(&self) -> AppResult<Node> {
        let mut node = Node::new(self.id.as_str(), NodeLabel::Venue);
        node.set("name", self.name.as_str());
        node.set("latitude", self.latitude);
        node.set("longitude", self.longitude);
        node.set("country", self.country.as_str());
        node.set("municipality", self.municipality.as_str());
        node.set("postcode", self.postcode.as_str());
        node.set("address", self.address.as_str());
        node.set_opt("avatar", self.avatar.as_ref().map(Identifier::to_string));
        node.set_opt("description", self.description.clone());
        node.set("media", identifier_list(&self.media));
        put_complex(&mut node, "highlights", &HIGHLIGHT_GROUPS, &self.highlights)?;
        node.set("tags", self.tags.clone());
        node.set_opt("capacity", self.capacity);
        node.set_opt("type", self.venue_type.clone());
        put_complex(&mut node, "created", &INSTANT, &self.created)?;
        put_complex(&mut node, "lastModified", &INSTANT, &self.last_modified)?;
        Ok(node)
    }

    fn from_node(node: &Node) -> AppResult<Self> {
        Ok(Self {
            id: stored_identifier(node, "id", &node.id)?,
            name: node.require_text("name")?.to_string(),
            latitude: node.require_float("latitude")?,
            longitude: node.require_float("longitude")?,
            country: node.require_text("country")?.to_string(),
            municipality: node.require_text("municipality")?.to_string(),
            postcode: node.require_text("postcode")?.to_string(),
            address: node.require_text("address")?.to_string(),
            avatar: get_identifier(node, "avatar")?,
            description: node.text("description")?.map(str::to_string),
            media: get_identifiers(node, "media")?,
            highlights: get_complex_or_default(node, "highlights", &HIGHLIGHT_GROUPS)?,
            tags: node.text_list("tags")?,
            capacity: node.int32("capacity")?,
            venue_type: node.text("type")?.map(str::to_string),
            created: get_complex(node, "created", &INSTANT)?,
            last_modified: get_complex(node, "lastModified", &INSTANT)?,
        })
    }
}
