//! Category-specific entity profiles.
//!
//! Every field except the identifying name is optional; an absent field means
//! the text said nothing about it.

use serde::{Deserialize, Serialize};

use super::entity::Category;

/// Placeholder display name for profiles without any usable name.
pub const UNKNOWN_NAME: &str = "unknown";

/// Profile of a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub name: String,
    #[serde(default)]
    pub titles_and_nicknames: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub physical_description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub voice_style: Option<String>,
    #[serde(default)]
    pub motivations: Option<String>,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub flaws: Option<String>,
    #[serde(default)]
    pub long_term_goals: Option<String>,
    #[serde(default)]
    pub short_term_goals: Option<String>,
    #[serde(default)]
    pub current_internal_state: Option<String>,
}

/// Profile of a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationProfile {
    #[serde(alias = "name")]
    pub primary_name: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub prominent_entities_associated: Option<Vec<String>>,
}

impl PersonProfile {
    /// A profile with only the name filled in.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl LocationProfile {
    pub fn named(primary_name: impl Into<String>) -> Self {
        Self {
            primary_name: primary_name.into(),
            ..Default::default()
        }
    }
}

/// Profile of an event. Same shape as a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProfile {
    #[serde(alias = "name")]
    pub primary_name: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub prominent_entities_associated: Option<Vec<String>>,
}

/// Profile of an object (weapons, artifacts, heirlooms).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProfile {
    #[serde(alias = "name")]
    pub primary_name: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    #[serde(default, rename = "type")]
    pub object_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub magical_properties: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Profile of an organization (clans, hordes, guilds).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    #[serde(alias = "name")]
    pub primary_name: String,
    #[serde(default)]
    pub secondary_name: Option<String>,
    #[serde(default, rename = "type")]
    pub organization_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub prominent_members: Option<Vec<String>>,
}

/// A profile of any category.
///
/// Serializes as the inner record, without a variant tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntityProfile {
    Person(PersonProfile),
    Location(LocationProfile),
    Event(EventProfile),
    Object(ObjectProfile),
    Organization(OrganizationProfile),
}

impl EntityProfile {
    pub fn category(&self) -> Category {
        match self {
            Self::Person(_) => Category::Person,
            Self::Location(_) => Category::Location,
            Self::Event(_) => Category::Event,
            Self::Object(_) => Category::Object,
            Self::Organization(_) => Category::Organization,
        }
    }

    /// The name a profile is known by: `name` for persons, `primary_name`
    /// otherwise, [`UNKNOWN_NAME`] when that is blank.
    pub fn display_name(&self) -> &str {
        let name = match self {
            Self::Person(p) => p.name.as_str(),
            Self::Location(p) => p.primary_name.as_str(),
            Self::Event(p) => p.primary_name.as_str(),
            Self::Object(p) => p.primary_name.as_str(),
            Self::Organization(p) => p.primary_name.as_str(),
        };
        if name.trim().is_empty() {
            UNKNOWN_NAME
        } else {
            name
        }
    }

    /// Canonical JSON form stored as the vector document.
    pub fn to_document(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<PersonProfile> for EntityProfile {
    fn from(p: PersonProfile) -> Self {
        Self::Person(p)
    }
}

impl From<LocationProfile> for EntityProfile {
    fn from(p: LocationProfile) -> Self {
        Self::Location(p)
    }
}

impl From<EventProfile> for EntityProfile {
    fn from(p: EventProfile) -> Self {
        Self::Event(p)
    }
}

impl From<ObjectProfile> for EntityProfile {
    fn from(p: ObjectProfile) -> Self {
        Self::Object(p)
    }
}

impl From<OrganizationProfile> for EntityProfile {
    fn from(p: OrganizationProfile) -> Self {
        Self::Organization(p)
    }
}
