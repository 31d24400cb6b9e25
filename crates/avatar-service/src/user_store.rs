// SPDX-License-Identifier: Apache-2.0
//! The user projection store (`spec.md` §3): an external collaborator in
//! the spec's own words. This crate only needs a narrow port — look a user
//! up, and advance their `customizationHash`/`*Key`s after a successful
//! render — so it's modeled as a trait with one in-memory implementation,
//! mirroring the object-store/CDN port-trait split in `avatar-store`.

use std::collections::HashMap;

use async_trait::async_trait;
use avatar_fingerprint::FingerprintHash;
use avatar_model::{Customization, User};
use parking_lot::RwLock;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, username: &str) -> Option<User>;

    /// Record a successful render: advance `customizationHash` to
    /// `fingerprint` and set the three object keys (`spec.md` §3 invariant
    /// 1 — this must only be called once all cache writes succeeded).
    async fn record_render(&self, username: &str, fingerprint: FingerprintHash);

    async fn upsert_customization(&self, username: &str, customization: Customization);
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seeded(users: impl IntoIterator<Item = User>) -> Self {
        let mut map = HashMap::new();
        for user in users {
            map.insert(user.username.clone(), user);
        }
        Self { users: RwLock::new(map) }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }

    async fn record_render(&self, username: &str, fingerprint: FingerprintHash) {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(username) {
            user.customization_hash = Some(fingerprint.0);
            user.avatar_key = Some(avatar_store::keys::user_avatar_key(username));
            user.clothing_key = Some(avatar_store::keys::user_clothing_key(username));
            user.thumbnail_key = Some(avatar_store::keys::user_thumbnail_key(username));
        }
    }

    async fn upsert_customization(&self, username: &str, customization: Customization) {
        let mut users = self.users.write();
        users
            .entry(username.to_string())
            .and_modify(|user| user.customization = customization.clone())
            .or_insert_with(|| User {
                username: username.to_string(),
                customization,
                customization_hash: None,
                avatar_key: None,
                clothing_key: None,
                thumbnail_key: None,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_model::Customization;

    #[tokio::test]
    async fn records_render_advances_hash_and_keys() {
        let store = InMemoryUserStore::new();
        store.upsert_customization("alice", Customization::default()).await;
        store.record_render("alice", FingerprintHash(42)).await;
        let user = store.get("alice").await.expect("user");
        assert_eq!(user.customization_hash, Some(42));
        assert_eq!(user.avatar_key.as_deref(), Some("user-avatar/alice.webp"));
    }

    #[tokio::test]
    async fn missing_user_returns_none() {
        let store = InMemoryUserStore::new();
        assert!(store.get("nobody").await.is_none());
    }
}
