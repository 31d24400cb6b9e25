// SPDX-License-Identifier: Apache-2.0
//! Canonical object-store key layout (`spec.md` §6).

#[must_use]
pub fn user_avatar_key(username: &str) -> String {
    format!("user-avatar/{username}.webp")
}

#[must_use]
pub fn user_clothing_key(username: &str) -> String {
    format!("user-clothing/{username}.webp")
}

#[must_use]
pub fn user_thumbnail_key(username: &str) -> String {
    format!("user-thumbnail/{username}.webp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_kind() {
        assert_eq!(user_avatar_key("alice"), "user-avatar/alice.webp");
        assert_eq!(user_clothing_key("alice"), "user-clothing/alice.webp");
        assert_eq!(user_thumbnail_key("alice"), "user-thumbnail/alice.webp");
    }
}
