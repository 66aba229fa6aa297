//! Which libraries get home-screen rails.

use std::collections::HashSet;

use jellyhome_model::{LibraryId, LibraryView};

/// Movie and TV libraries the user has not excluded, in server order.
pub fn eligible_libraries(views: Vec<LibraryView>, excluded: &[LibraryId]) -> Vec<LibraryView> {
    let excluded: HashSet<&LibraryId> = excluded.iter().collect();

    views
        .into_iter()
        .filter(|view| {
            view.collection_type
                .as_ref()
                .is_some_and(|kind| kind.is_video_library())
        })
        .filter(|view| !excluded.contains(&view.id))
        .collect()
}
