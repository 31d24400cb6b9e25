// SPDX-License-Identifier: Apache-2.0
//! User projection used by the core (`spec.md` §3).

use crate::customization::Customization;

/// The projection of a user record the core rendering pipeline needs.
///
/// `*_key` fields are opaque remote-storage keys from the last successful
/// render; `None` until the first render completes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub username: String,
    pub customization: Customization,
    /// The fingerprint stamped on the last successful render, if any.
    pub customization_hash: Option<u32>,
    pub avatar_key: Option<String>,
    pub clothing_key: Option<String>,
    pub thumbnail_key: Option<String>,
}

impl User {
    /// Invariant 1 (`spec.md` §3): whether the cached render is still valid
    /// for this user's *current* customization.
    #[must_use]
    pub fn is_current(&self, fingerprint: u32) -> bool {
        self.customization_hash == Some(fingerprint)
    }

    /// Whether a previous render exists at all (for the fallback path,
    /// `spec.md` §4.6).
    #[must_use]
    pub fn has_previous_render(&self) -> bool {
        self.avatar_key.is_some() || self.clothing_key.is_some() || self.thumbnail_key.is_some()
    }
}
