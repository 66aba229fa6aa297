use serde::{Deserialize, Serialize};

use crate::ids::LibraryId;

/// Content category of a user view (`CollectionType` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CollectionType {
    Movies,
    TvShows,
    Music,
    BoxSets,
    Playlists,
    LiveTv,
    HomeVideos,
    Other(String),
}

impl CollectionType {
    pub fn as_str(&self) -> &str {
        match self {
            CollectionType::Movies => "movies",
            CollectionType::TvShows => "tvshows",
            CollectionType::Music => "music",
            CollectionType::BoxSets => "boxsets",
            CollectionType::Playlists => "playlists",
            CollectionType::LiveTv => "livetv",
            CollectionType::HomeVideos => "homevideos",
            CollectionType::Other(raw) => raw,
        }
    }

    /// Video libraries surfaced on the home screen.
    pub fn is_video_library(&self) -> bool {
        matches!(self, CollectionType::Movies | CollectionType::TvShows)
    }
}

impl From<String> for CollectionType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "movies" => CollectionType::Movies,
            "tvshows" => CollectionType::TvShows,
            "music" => CollectionType::Music,
            "boxsets" => CollectionType::BoxSets,
            "playlists" => CollectionType::Playlists,
            "livetv" => CollectionType::LiveTv,
            "homevideos" => CollectionType::HomeVideos,
            _ => CollectionType::Other(value),
        }
    }
}

impl From<CollectionType> for String {
    fn from(value: CollectionType) -> Self {
        match value {
            CollectionType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for CollectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionType::Movies => write!(f, "Movies"),
            CollectionType::TvShows => write!(f, "TV Shows"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A top-level user view as returned by `/Users/{id}/Views`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LibraryView {
    pub id: LibraryId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub collection_type: Option<CollectionType>,
}

impl LibraryView {
    pub fn new(
        id: impl Into<LibraryId>,
        name: impl Into<String>,
        collection_type: Option<CollectionType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            collection_type,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
