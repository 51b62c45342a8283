use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point from nullable row columns.
    pub fn from_nullable(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Some(Self::new(lat?, lng?))
    }
}

/// Which source a suggestion came from.
///
/// Declaration order is the merge priority: addresses first, content last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Address,
    Entity,
    Person,
    Directory,
    Content,
}

impl SuggestionKind {
    pub const ALL: [SuggestionKind; 5] = [
        SuggestionKind::Address,
        SuggestionKind::Entity,
        SuggestionKind::Person,
        SuggestionKind::Directory,
        SuggestionKind::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Address => "address",
            SuggestionKind::Entity => "entity",
            SuggestionKind::Person => "person",
            SuggestionKind::Directory => "directory",
            SuggestionKind::Content => "content",
        }
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sources are identified by the kind of suggestion they produce.
pub type SourceKind = SuggestionKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    pub id: String,
    pub label: String,
    pub subtitle: String,
    pub coordinates: Coordinates,
    /// Untouched geocoder feature, forwarded to the location-selected listener.
    pub raw_metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntrySuggestion {
    pub id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySuggestion {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSuggestion {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSuggestion {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// One row of the autocomplete dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    Address(AddressSuggestion),
    Directory(DirectoryEntrySuggestion),
    Entity(EntitySuggestion),
    Person(PersonSuggestion),
    Content(ContentSuggestion),
}

impl Suggestion {
    pub fn kind(&self) -> SuggestionKind {
        match self {
            Suggestion::Address(_) => SuggestionKind::Address,
            Suggestion::Directory(_) => SuggestionKind::Directory,
            Suggestion::Entity(_) => SuggestionKind::Entity,
            Suggestion::Person(_) => SuggestionKind::Person,
            Suggestion::Content(_) => SuggestionKind::Content,
        }
    }

    /// Identifier, unique within the suggestion's source.
    pub fn id(&self) -> &str {
        match self {
            Suggestion::Address(s) => &s.id,
            Suggestion::Directory(s) => &s.id,
            Suggestion::Entity(s) => &s.id,
            Suggestion::Person(s) => &s.id,
            Suggestion::Content(s) => &s.id,
        }
    }

    /// Text written back into the search box once the suggestion is chosen.
    pub fn label(&self) -> String {
        match self {
            Suggestion::Address(s) => s.label.clone(),
            Suggestion::Directory(s) => format!("@{}", s.handle),
            Suggestion::Entity(s) => s.name.clone(),
            Suggestion::Person(s) => s.name.clone(),
            Suggestion::Content(s) => s.title.clone(),
        }
    }
}
