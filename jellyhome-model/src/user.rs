use serde::{Deserialize, Serialize};

use crate::ids::{LibraryId, UserId};

/// Server-side per-user preferences that affect the home screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserConfiguration {
    /// Libraries the user has hidden from "latest" rails.
    pub latest_items_excludes: Vec<LibraryId>,
    pub my_media_excludes: Vec<LibraryId>,
    pub hide_played_in_latest: bool,
}

/// `/Users/Me` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub configuration: Option<UserConfiguration>,
}

impl UserDto {
    pub fn excluded_libraries(&self) -> &[LibraryId] {
        self.configuration
            .as_ref()
            .map(|config| config.latest_items_excludes.as_slice())
            .unwrap_or_default()
    }
}
