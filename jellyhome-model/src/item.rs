use serde::{Deserialize, Serialize};

use crate::chrono::{DateTime, Utc};
use crate::ids::ItemId;

/// Server item type (`Type` on the wire).
///
/// Kinds the client never branches on are preserved verbatim in
/// [`ItemKind::Other`] so a round trip does not lose information.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    Movie,
    Episode,
    Series,
    Season,
    BoxSet,
    Person,
    Folder,
    CollectionFolder,
    Other(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Episode => "Episode",
            ItemKind::Series => "Series",
            ItemKind::Season => "Season",
            ItemKind::BoxSet => "BoxSet",
            ItemKind::Person => "Person",
            ItemKind::Folder => "Folder",
            ItemKind::CollectionFolder => "CollectionFolder",
            ItemKind::Other(raw) => raw,
        }
    }
}

impl From<String> for ItemKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Movie" => ItemKind::Movie,
            "Episode" => ItemKind::Episode,
            "Series" => ItemKind::Series,
            "Season" => ItemKind::Season,
            "BoxSet" => ItemKind::BoxSet,
            "Person" => ItemKind::Person,
            "Folder" => ItemKind::Folder,
            "CollectionFolder" => ItemKind::CollectionFolder,
            _ => ItemKind::Other(value),
        }
    }
}

impl From<ItemKind> for String {
    fn from(value: ItemKind) -> Self {
        match value {
            ItemKind::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user state attached to an item when `EnableUserData` is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserItemData {
    pub played: bool,
    pub is_favorite: bool,
    pub playback_position_ticks: i64,
    pub played_percentage: Option<f64>,
    pub unplayed_item_count: Option<u32>,
    pub last_played_date: Option<DateTime<Utc>>,
}

/// The projection of `BaseItemDto` the home screen consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub run_time_ticks: Option<i64>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_data: Option<UserItemData>,
}

impl BaseItem {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind),
            ..Self::with_id(id)
        }
    }

    /// An item known only by id, e.g. one named on a command line.
    pub fn with_id(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: None,
            series_name: None,
            parent_id: None,
            production_year: None,
            run_time_ticks: None,
            date_created: None,
            user_data: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_played(&self) -> bool {
        self.user_data.as_ref().is_some_and(|data| data.played)
    }

    pub fn is_favorite(&self) -> bool {
        self.user_data.as_ref().is_some_and(|data| data.is_favorite)
    }
}
