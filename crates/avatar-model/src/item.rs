// SPDX-License-Identifier: Apache-2.0
//! Item projection and the two layout flags hidden in its free-form
//! description.

use std::fmt;

/// An opaque, case-preserving item identifier.
///
/// Two `ItemRef`s are the same cache key iff their lowercased forms match
/// (`spec.md` §4.2): "H1" and "h1" name the same part sprite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ItemRef(pub String);

impl ItemRef {
    /// The cache key form: lowercased.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.0.to_lowercase()
    }

    /// The original, case-preserving form — what a case-sensitive origin
    /// (CDN, object store) must be addressed with. Never use this for a
    /// cache key; use [`ItemRef::cache_key`] instead.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The core projection of an item used by the rendering pipeline.
///
/// `description` is free-form and otherwise opaque; the only inspected
/// contents are the `!x` / `!s` substrings (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: ItemRef,
    pub description: String,
}

impl Item {
    /// `!x` — render shoes behind the bottom layer instead of in front.
    #[must_use]
    pub fn shoes_behind_pants(&self) -> bool {
        self.description.contains("!x")
    }

    /// `!s` — render hair in front of the top/coat layer instead of behind.
    #[must_use]
    pub fn hair_in_front_of_top(&self) -> bool {
        self.description.contains("!s")
    }
}
