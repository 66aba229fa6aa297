use serde::{Deserialize, Serialize};

/// Declares an opaque, string-backed server identifier.
///
/// The server hands out 32-character hex GUIDs, but nothing on the client
/// depends on that shape, so ids are kept verbatim.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of any server item (movie, episode, series, person, ...).
    ItemId
);

string_id!(
    /// Identifier of a top-level user view (a library).
    LibraryId
);

string_id!(
    /// Identifier of a server user account.
    UserId
);

impl From<LibraryId> for ItemId {
    /// Libraries are items on the server, so a library id is a valid parent id.
    fn from(value: LibraryId) -> Self {
        ItemId(value.0)
    }
}
