// User - a person with a public handle, social edges and likes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{get_complex, get_identifier, put_complex, Event, NodeEntity, Venue, INSTANT, LOCAL_DATE};
use crate::core::{Identifier, NodeLabel};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Node;

/// Visibility level of a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    FriendsOnly,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::FriendsOnly => "FRIENDS_ONLY",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "FRIENDS_ONLY" => Ok(Visibility::FriendsOnly),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(AppError::MalformedEncoding(format!(
                "'{}' is not a visibility level",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// User-facing unique identifier; also the node id.
    pub handle: String,
    /// Unique id in the auth provider.
    pub auth_id: String,
    pub name: String,
    pub birthday: NaiveDate,
    /// Place of work or study, see `is_student`.
    pub occupation: Option<String>,
    pub is_student: Option<bool>,
    /// Prefix `avatar`.
    pub avatar: Option<Identifier>,
    pub links: Vec<String>,
    pub biography: Option<String>,
    pub visibility: Option<Visibility>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl NodeEntity for User {
    fn label() -> NodeLabel {
        NodeLabel::User
    }

    fn id(&self) -> &str {
        &self.handle
    }

    fn to_node(&self) -> AppResult<Node> {
        let mut node = Node::new(self.handle.as_str(), NodeLabel::User);
        node.set("authId", self.auth_id.as_str());
        node.set("name", self.name.as_str());
        put_complex(&mut node, "birthday", &LOCAL_DATE, &self.birthday)?;
        node.set_opt("occupation", self.occupation.clone());
        node.set_opt("isStudent", self.is_student);
        node.set_opt("avatar", self.avatar.as_ref().map(Identifier::to_string));
        node.set("links", self.links.clone());
        node.set_opt("biography", self.biography.clone());
        node.set_opt("visibility", self.visibility.map(|v| v.as_str()));
        put_complex(&mut node, "created", &INSTANT, &self.created)?;
        put_complex(&mut node, "lastModified", &INSTANT, &self.last_modified)?;
        put_complex(&mut node, "lastSeen", &INSTANT, &self.last_seen)?;
        Ok(node)
    }

    fn from_node(node: &Node) -> AppResult<Self> {
        Ok(Self {
            handle: node.id.clone(),
            auth_id: node.require_text("authId")?.to_string(),
            name: node.require_text("name")?.to_string(),
            birthday: get_complex(node, "birthday", &LOCAL_DATE)?,
            occupation: node.text("occupation")?.map(str::to_string),
            is_student: node.bool("isStudent")?,
            avatar: get_identifier(node, "avatar")?,
            links: node.text_list("links")?,
            biography: node.text("biography")?.map(str::to_string),
            visibility: node.text("visibility")?.map(str::parse::<Visibility>).transpose()?,
            created: get_complex(node, "created", &INSTANT)?,
            last_modified: get_complex(node, "lastModified", &INSTANT)?,
            last_seen: get_complex(node, "lastSeen", &INSTANT)?,
        })
    }
}

/// Anything a user can like. The target's identifier prefix says which.
#[derive(Debug, Clone, PartialEq)]
pub enum Likeable {
    Event(Event),
    Venue(Venue),
}

impl Likeable {
    pub fn id(&self) -> &str {
        match self {
            Likeable::Event(event) => event.id.as_str(),
            Likeable::Venue(venue) => venue.id.as_str(),
        }
    }
}
