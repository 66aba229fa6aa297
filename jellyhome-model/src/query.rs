//! Query parameter sets sent to the server.
//!
//! Each query renders itself into `(name, value)` pairs using the server's
//! PascalCase parameter names; list-valued parameters are comma-joined.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;
use crate::item::ItemKind;

/// Optional item fields the server only returns when asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemField {
    BasicSyncInfo,
    DateCreated,
    Genres,
    MediaSourceCount,
    Overview,
    ParentId,
    PrimaryImageAspectRatio,
    Taglines,
}

impl ItemField {
    /// The projection every home-screen rail requests.
    pub const MINIMUM: &'static [ItemField] = &[
        ItemField::MediaSourceCount,
        ItemField::Overview,
        ItemField::ParentId,
        ItemField::PrimaryImageAspectRatio,
        ItemField::Taglines,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemField::BasicSyncInfo => "BasicSyncInfo",
            ItemField::DateCreated => "DateCreated",
            ItemField::Genres => "Genres",
            ItemField::MediaSourceCount => "MediaSourceCount",
            ItemField::Overview => "Overview",
            ItemField::ParentId => "ParentId",
            ItemField::PrimaryImageAspectRatio => "PrimaryImageAspectRatio",
            ItemField::Taglines => "Taglines",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemFilter {
    IsFavorite,
    IsPlayed,
    IsUnplayed,
    IsResumable,
}

impl ItemFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemFilter::IsFavorite => "IsFavorite",
            ItemFilter::IsPlayed => "IsPlayed",
            ItemFilter::IsUnplayed => "IsUnplayed",
            ItemFilter::IsResumable => "IsResumable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    DateCreated,
    DatePlayed,
    SortName,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::DateCreated => "DateCreated",
            SortField::DatePlayed => "DatePlayed",
            SortField::SortName => "SortName",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "Ascending",
            SortOrder::Descending => "Descending",
        }
    }
}

/// Paged envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryResult<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_record_count: u32,
    #[serde(default)]
    pub start_index: u32,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_record_count: 0,
            start_index: 0,
        }
    }
}

impl<T> QueryResult<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        let total_record_count = items.len() as u32;
        Self {
            items,
            total_record_count,
            start_index: 0,
        }
    }
}

fn join<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn push_list<I, S>(pairs: &mut Vec<(&'static str, String)>, name: &'static str, values: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = join(values);
    if !joined.is_empty() {
        pairs.push((name, joined));
    }
}

/// `GET /Users/{userId}/Items/Resume`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeItemsQuery {
    pub include_item_types: Vec<ItemKind>,
    pub fields: Vec<ItemField>,
    pub limit: u32,
    pub enable_user_data: bool,
}

impl ResumeItemsQuery {
    /// Continue-watching defaults: movies and episodes, minimum fields.
    pub fn continue_watching(limit: u32) -> Self {
        Self {
            include_item_types: vec![ItemKind::Movie, ItemKind::Episode],
            fields: ItemField::MINIMUM.to_vec(),
            limit,
            enable_user_data: true,
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        push_list(
            &mut pairs,
            "IncludeItemTypes",
            self.include_item_types.iter().map(ItemKind::as_str),
        );
        push_list(&mut pairs, "Fields", self.fields.iter().map(|f| f.as_str()));
        pairs.push(("Limit", self.limit.to_string()));
        pairs.push(("EnableUserData", self.enable_user_data.to_string()));
        pairs
    }
}

/// `GET /Users/{userId}/Items/Latest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestMediaQuery {
    pub parent_id: Option<ItemId>,
    pub fields: Vec<ItemField>,
    pub limit: u32,
    pub enable_user_data: bool,
}

impl LatestMediaQuery {
    pub fn for_parent(parent_id: Option<ItemId>, limit: u32) -> Self {
        Self {
            parent_id,
            fields: ItemField::MINIMUM.to_vec(),
            limit,
            enable_user_data: true,
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(parent) = &self.parent_id {
            pairs.push(("ParentId", parent.to_string()));
        }
        push_list(&mut pairs, "Fields", self.fields.iter().map(|f| f.as_str()));
        pairs.push(("Limit", self.limit.to_string()));
        pairs.push(("EnableUserData", self.enable_user_data.to_string()));
        pairs
    }
}

/// `GET /Shows/NextUp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextUpQuery {
    pub parent_id: Option<ItemId>,
    pub fields: Vec<ItemField>,
    pub start_index: u32,
    pub limit: u32,
    pub enable_user_data: bool,
}

impl NextUpQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            parent_id: None,
            fields: ItemField::MINIMUM.to_vec(),
            start_index: page.saturating_mul(page_size),
            limit: page_size,
            enable_user_data: true,
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(parent) = &self.parent_id {
            pairs.push(("ParentId", parent.to_string()));
        }
        push_list(&mut pairs, "Fields", self.fields.iter().map(|f| f.as_str()));
        pairs.push(("StartIndex", self.start_index.to_string()));
        pairs.push(("Limit", self.limit.to_string()));
        pairs.push(("EnableUserData", self.enable_user_data.to_string()));
        pairs
    }
}

/// `GET /Users/{userId}/Items`, the general item search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemsQuery {
    pub parent_id: Option<ItemId>,
    pub include_item_types: Vec<ItemKind>,
    pub filters: Vec<ItemFilter>,
    pub fields: Vec<ItemField>,
    pub sort_by: Vec<SortField>,
    pub sort_order: Option<SortOrder>,
    pub recursive: bool,
    pub start_index: Option<u32>,
    pub limit: Option<u32>,
    pub enable_user_data: bool,
}

impl ItemsQuery {
    /// Everything the user has marked as favourite.
    pub fn favorites(limit: u32) -> Self {
        Self {
            filters: vec![ItemFilter::IsFavorite],
            fields: vec![ItemField::PrimaryImageAspectRatio, ItemField::BasicSyncInfo],
            recursive: true,
            limit: Some(limit),
            enable_user_data: true,
            ..Self::default()
        }
    }

    /// Newest movies and series across all libraries.
    pub fn recently_added(page: u32, page_size: u32) -> Self {
        Self {
            include_item_types: vec![ItemKind::Movie, ItemKind::Series],
            fields: ItemField::MINIMUM.to_vec(),
            sort_by: vec![SortField::DateCreated],
            sort_order: Some(SortOrder::Descending),
            recursive: true,
            start_index: Some(page.saturating_mul(page_size)),
            limit: Some(page_size),
            enable_user_data: true,
            ..Self::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(parent) = &self.parent_id {
            pairs.push(("ParentId", parent.to_string()));
        }
        push_list(
            &mut pairs,
            "IncludeItemTypes",
            self.include_item_types.iter().map(ItemKind::as_str),
        );
        push_list(&mut pairs, "Filters", self.filters.iter().map(|f| f.as_str()));
        push_list(&mut pairs, "Fields", self.fields.iter().map(|f| f.as_str()));
        push_list(&mut pairs, "SortBy", self.sort_by.iter().map(|s| s.as_str()));
        if let Some(order) = self.sort_order {
            pairs.push(("SortOrder", order.as_str().to_owned()));
        }
        if self.recursive {
            pairs.push(("Recursive", "true".to_owned()));
        }
        if let Some(start) = self.start_index {
            pairs.push(("StartIndex", start.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("Limit", limit.to_string()));
        }
        pairs.push(("EnableUserData", self.enable_user_data.to_string()));
        pairs
    }
}
