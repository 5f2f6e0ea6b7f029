// Strong Types - identifiers, labels and edge types shared across the directory

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Separator between an identifier's prefix and its suffix.
pub const ID_SEPARATOR: char = '-';

/// All prefixes an identifier may carry. Extending this is a coordinated
/// change with the generator service and the CDN layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPrefix {
    Video,
    Image,
    Avatar,
    Event,
    Venue,
}

impl IdPrefix {
    pub const ALL: [IdPrefix; 5] = [
        IdPrefix::Video,
        IdPrefix::Image,
        IdPrefix::Avatar,
        IdPrefix::Event,
        IdPrefix::Venue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdPrefix::Video => "video",
            IdPrefix::Image => "image",
            IdPrefix::Avatar => "avatar",
            IdPrefix::Event => "event",
            IdPrefix::Venue => "venue",
        }
    }
}

impl fmt::Display for IdPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdPrefix {
    type Err = AppError;

    /// Case-insensitive lookup against the closed prefix set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase();
        IdPrefix::ALL
            .into_iter()
            .find(|prefix| prefix.as_str() == normalized)
            .ok_or_else(|| AppError::UnknownPrefix(format!("'{}' is not a known prefix", s)))
    }
}

/// A prefix-typed identifier, `<prefix>-<suffix>`.
///
/// Kept verbatim as issued; only the prefix is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    raw: String,
    prefix: IdPrefix,
}

impl Identifier {
    /// Parse an identifier. The prefix is everything before the first
    /// separator; the suffix is opaque and only has to be non-empty.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let (prefix, suffix) = raw.split_once(ID_SEPARATOR).ok_or_else(|| {
            AppError::UnknownPrefix(format!("'{}' has no prefix separator", raw))
        })?;
        let prefix: IdPrefix = prefix.parse()?;

        if suffix.is_empty() {
            return Err(AppError::Validation(format!(
                "'{}' has an empty identifier suffix",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            prefix,
        })
    }

    pub fn prefix(&self) -> IdPrefix {
        self.prefix
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check the identifier against the prefixes a field accepts.
    pub fn expect_prefix(&self, field: &str, allowed: &[IdPrefix]) -> AppResult<()> {
        if allowed.contains(&self.prefix) {
            return Ok(());
        }
        let expected: Vec<&str> = allowed.iter().map(IdPrefix::as_str).collect();
        Err(AppError::Validation(format!(
            "{} must be an identifier with prefix {}, got '{}'",
            field,
            expected.join(" or "),
            self.raw
        )))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Identifier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Identifier::parse(&raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.raw
    }
}

/// Node labels in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Event,
    Venue,
    User,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Event => "Event",
            NodeLabel::Venue => "Venue",
            NodeLabel::User => "User",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Event" => Ok(NodeLabel::Event),
            "Venue" => Ok(NodeLabel::Venue),
            "User" => Ok(NodeLabel::User),
            other => Err(AppError::DatabaseError(format!("unknown node label '{}'", other))),
        }
    }
}

/// Directed, typed relationships between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// User -> User
    Follows,
    /// Event -> Venue, exactly one per event
    HostedBy,
    /// User -> Event or Venue
    Liked,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Follows => "FOLLOWS",
            EdgeType::HostedBy => "HOSTED_BY",
            EdgeType::Liked => "LIKED",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOLLOWS" => Ok(EdgeType::Follows),
            "HOSTED_BY" => Ok(EdgeType::HostedBy),
            "LIKED" => Ok(EdgeType::Liked),
            other => Err(AppError::DatabaseError(format!("unknown edge type '{}'", other))),
        }
    }
}
