//! Wire data model shared across jellyhome crates.
//!
//! Field names follow the server's PascalCase JSON. Every type tolerates
//! missing optional fields so partially projected responses still decode.
#![allow(missing_docs)]

pub use ::chrono;

pub mod ids;
pub mod item;
pub mod library;
pub mod query;
pub mod user;

pub use ids::{ItemId, LibraryId, UserId};
pub use item::{BaseItem, ItemKind, UserItemData};
pub use library::{CollectionType, LibraryView};
pub use query::{
    ItemField, ItemFilter, ItemsQuery, LatestMediaQuery, NextUpQuery,
    QueryResult, ResumeItemsQuery, SortField, SortOrder,
};
pub use user::{UserConfiguration, UserDto};
