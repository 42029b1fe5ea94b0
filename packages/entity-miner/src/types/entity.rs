//! Genre and entity classification results.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Result of the genre stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreResult {
    pub reasoning: String,
    pub genre: String,
}

/// Narrative category of an extracted entity.
///
/// Unknown category strings deserialize to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Person,
    Location,
    Event,
    Object,
    Organization,
    Other,
}

impl Category {
    /// All categories that can carry a profile.
    pub const PROFILED: [Category; 5] = [
        Category::Person,
        Category::Location,
        Category::Event,
        Category::Object,
        Category::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Location => "Location",
            Self::Event => "Event",
            Self::Object => "Object",
            Self::Organization => "Organization",
            Self::Other => "Other",
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => Self::Person,
            "location" => Self::Location,
            "event" => Self::Event,
            "object" => Self::Object,
            "organization" | "organisation" => Self::Organization,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from(raw.as_str()))
    }
}

/// Narrative importance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Significance {
    Major,
    Supporting,
    Minor,
}

impl Significance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Supporting => "Supporting",
            Self::Minor => "Minor",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Some(Self::Major),
            "supporting" => Some(Self::Supporting),
            "minor" => Some(Self::Minor),
            _ => None,
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Missing, null and unrecognized significance values all read as `None`.
fn lenient_significance<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Significance>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Significance::parse))
}

/// One entity found by the extraction stage.
///
/// Example: `{"name": "Shedinn", "category": "Person", "significance": "Major"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub category: Category,
    #[serde(default, deserialize_with = "lenient_significance")]
    pub significance: Option<Significance>,
}

impl ExtractedEntity {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        significance: Option<Significance>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            significance,
        }
    }

    /// Minor persons get the reduced profiling prompt.
    pub fn is_minor(&self) -> bool {
        self.significance == Some(Significance::Minor)
    }
}

/// Output of the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityExtraction {
    pub entities: Vec<ExtractedEntity>,
}
