// Event - a dated happening hosted by exactly one venue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    get_complex, get_complex_or_default, get_identifiers, identifier_list, put_complex,
    require_identifier, stored_identifier, NodeEntity, INSTANT,
};
use crate::conversion::{PropertyConverter, WireScalar};
use crate::core::{Identifier, NodeLabel};
use crate::error::AppResult;
use crate::infrastructure::database::Node;

/// A method with which a user can gain entry to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessPolicy {
    #[serde(rename = "type")]
    pub policy_type: String,
    pub min_price: String,
    pub max_price: String,
    pub currency: String,
    pub info: String,
}

/// A titled segment of house rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSection {
    pub title: String,
    pub rules: Vec<Rule>,
}

/// An iconned description of one restriction at an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Rule {
    pub icon: String,
    pub text: String,
}

crate::canonical!(AccessPolicy, RuleSection, Rule);

pub const ACCESS_POLICIES: PropertyConverter<Vec<AccessPolicy>> = PropertyConverter::new();
pub const RULE_SECTIONS: PropertyConverter<Vec<RuleSection>> = PropertyConverter::new();

pub const ACCESS_POLICIES_SCALAR: WireScalar<Vec<AccessPolicy>> = WireScalar::new("AccessPolicies");
pub const RULE_SECTIONS_SCALAR: WireScalar<Vec<RuleSection>> = WireScalar::new("RuleSections");

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Prefix `event`.
    pub id: Identifier,
    pub name: String,
    pub description: Option<String>,
    pub music_genres: Vec<String>,
    /// Cover video, prefix `video`.
    pub video: Identifier,
    /// Prefix `video` or `image`.
    pub media: Vec<Identifier>,
    pub access_policies: Vec<AccessPolicy>,
    pub rules: Vec<RuleSection>,
    /// Start of the (first, if recurring) occurrence.
    pub datetime: DateTime<Utc>,
    /// Seconds.
    pub duration: Option<i32>,
    /// RFC 5545 RRULE.
    pub recurrence: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl NodeEntity for Event {
    fn label() -> NodeLabel {
        NodeLabel::Event
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn to_node(&self) -> AppResult<Node> {
        let mut node = Node::new(self.id.as_str(), NodeLabel::Event);
        node.set("name", self.name.as_str());
        node.set_opt("description", self.description.clone());
        node.set("musicGenres", self.music_genres.clone());
        node.set("video", self.video.as_str());
        node.set("media", identifier_list(&self.media));
        put_complex(&mut node, "accessPolicies", &ACCESS_POLICIES, &self.access_policies)?;
        put_complex(&mut node, "rules", &RULE_SECTIONS, &self.rules)?;
        put_complex(&mut node, "datetime", &INSTANT, &self.datetime)?;
        node.set_opt("duration", self.duration);
        node.set_opt("recurrence", self.recurrence.clone());
        node.set("tags", self.tags.clone());
        put_complex(&mut node, "created", &INSTANT, &self.created)?;
        put_complex(&mut node, "lastModified", &INSTANT, &self.last_modified)?;
        Ok(node)
    }

    fn from_node(node: &Node) -> AppResult<Self> {
        Ok(Self {
            id: stored_identifier(node, "id", &node.id)?,
            name: node.require_text("name")?.to_string(),
            description: node.text("description")?.map(str::to_string),
            music_genres: node.text_list("musicGenres")?,
            video: require_identifier(node, "video")?,
            media: get_identifiers(node, "media")?,
            access_policies: get_complex_or_default(node, "accessPolicies", &ACCESS_POLICIES)?,
            rules: get_complex_or_default(node, "rules", &RULE_SECTIONS)?,
            datetime: get_complex(node, "datetime", &INSTANT)?,
            duration: node.int32("duration")?,
            recurrence: node.text("recurrence")?.map(str::to_string),
            tags: node.text_list("tags")?,
            created: get_complex(node, "created", &INSTANT)?,
            last_modified: get_complex(node, "lastModified", &INSTANT)?,
        })
    }
}
