use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the remote collections managed by the [`CollectionManager`](super::CollectionManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Categories,
    Groups,
    Filters,
}

impl CollectionKind {
    /// All collection kinds, in a stable order.
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Categories,
        CollectionKind::Groups,
        CollectionKind::Filters,
    ];

    /// The stable lowercase name of the collection.
    ///
    /// This name is used in metric tags, HTTP paths and fixture file names.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Categories => "categories",
            CollectionKind::Groups => "groups",
            CollectionKind::Filters => "filters",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl AsRef<str> for CollectionKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when parsing an unknown collection name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collection `{0}`, expected one of categories, groups, filters")]
pub struct ParseCollectionKindError(String);

impl FromStr for CollectionKind {
    type Err = ParseCollectionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseCollectionKindError(s.to_owned()))
    }
}
