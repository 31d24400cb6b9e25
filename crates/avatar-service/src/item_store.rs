// SPDX-License-Identifier: Apache-2.0
//! The item projection store (`spec.md` §1: "the user/item database" is an
//! external, read-only key/value-style collaborator). Narrow port, same
//! shape as [`crate::user_store::UserStore`]: look an item up by reference,
//! nothing else. Lookup failures default both layout flags to false
//! (`spec.md` §7 propagation policy) — callers get `None` and apply that
//! default themselves rather than this trait returning a fallback `Item`.

use std::collections::HashMap;

use async_trait::async_trait;
use avatar_model::{Item, ItemRef};
use parking_lot::RwLock;

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, item_ref: &ItemRef) -> Option<Item>;
}

#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<String, Item>>,
}

impl InMemoryItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seeded(items: impl IntoIterator<Item = Item>) -> Self {
        let mut map = HashMap::new();
        for item in items {
            map.insert(item.id.cache_key(), item);
        }
        Self { items: RwLock::new(map) }
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get(&self, item_ref: &ItemRef) -> Option<Item> {
        self.items.read().get(&item_ref.cache_key()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn looks_up_case_insensitively() {
        let store = InMemoryItemStore::seeded([Item { id: ItemRef::from("B1"), description: "baggy !x".to_string() }]);
        let item = store.get(&ItemRef::from("b1")).await.expect("item");
        assert!(item.shoes_behind_pants());
    }

    #[tokio::test]
    async fn missing_item_returns_none() {
        let store = InMemoryItemStore::new();
        assert!(store.get(&ItemRef::from("nope")).await.is_none());
    }
}
