// SPDX-License-Identifier: Apache-2.0
//! `GetAvatar(username, type) -> Response`: the resolution algorithm from
//! `spec.md` §4.6, expressed as a plain async function over port traits so
//! it is testable without standing up the HTTP layer.

use std::sync::Arc;
use std::time::Duration;

use avatar_cache::ResultCache;
use avatar_coordinator::{CoordinatorError, JobKind, RenderCoordinator};
use avatar_fingerprint::fingerprint;
use bytes::Bytes;

use crate::error::ApiError;
use crate::user_store::UserStore;

/// Short-lived signed URL lifetime for redirects (`spec.md` §4.6 step 4/5).
const SIGNED_URL_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarType {
    Avatar,
    Sprite,
    Thumbnail,
}

impl AvatarType {
    /// Accepts the full name or the single-letter alias (`spec.md` §4.6 step 1).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "avatar" | "a" => Some(Self::Avatar),
            "sprite" | "s" => Some(Self::Sprite),
            "thumbnail" | "t" => Some(Self::Thumbnail),
            _ => None,
        }
    }

    fn job_kind(self) -> JobKind {
        match self {
            Self::Avatar => JobKind::Avatar,
            Self::Sprite => JobKind::Sprite,
            Self::Thumbnail => JobKind::Thumbnail,
        }
    }
}

/// The resolved response before it is translated to an HTTP status
/// (`spec.md` §4.6: "raw WebP bytes, a redirect ..., a not-found, or a
/// structured error").
pub enum AvatarResponse {
    Bytes(Bytes),
    Redirect(String),
    Default(Bytes),
}

/// `username` must be pre-sanitized (`spec.md` §4.6 step 1): `[A-Za-z0-9_-]` only.
#[must_use]
pub fn sanitize_username(raw: &str) -> Option<&str> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Some(raw)
    } else {
        None
    }
}

pub struct AvatarDeps {
    pub users: Arc<dyn UserStore>,
    pub cache: Arc<ResultCache>,
    pub coordinator: Arc<RenderCoordinator>,
    pub default_asset: Option<Bytes>,
}

pub async fn get_avatar(deps: &AvatarDeps, username_raw: &str, type_raw: &str) -> Result<AvatarResponse, ApiError> {
    let avatar_type = AvatarType::parse(type_raw).ok_or_else(|| ApiError::InvalidRequest(format!("unknown type {type_raw}")))?;
    let username = sanitize_username(username_raw)
        .ok_or_else(|| ApiError::InvalidRequest(format!("invalid username {username_raw}")))?;

    let user = deps.users.get(username).await.ok_or(ApiError::NotFound)?;
    let fp = fingerprint(username, &user.customization);

    if user.is_current(fp.0) {
        if let Some(response) = serve_current(deps, username, avatar_type, fp).await? {
            return Ok(response);
        }
    }

    match deps.coordinator.submit(username, fp, avatar_type.job_kind()).await {
        Ok(outcome) => {
            if outcome.persisted {
                deps.users.record_render(username, fp).await;
            }
            Ok(AvatarResponse::Bytes(match avatar_type {
                AvatarType::Avatar => outcome.objects.avatar,
                AvatarType::Sprite => outcome.objects.clothing_sheet,
                AvatarType::Thumbnail => outcome.objects.thumbnail,
            }))
        }
        Err(CoordinatorError::Overloaded) => overload_fallback(deps, &user, avatar_type).await,
        Err(other) => Err(ApiError::from(other)),
    }
}

/// Step 4: serve from the cache when the user's stored hash is already
/// current. Returns `None` on a cache miss so the caller falls through to
/// the submit path (step 5).
async fn serve_current(
    deps: &AvatarDeps,
    username: &str,
    avatar_type: AvatarType,
    fp: avatar_fingerprint::FingerprintHash,
) -> Result<Option<AvatarResponse>, ApiError> {
    match avatar_type {
        AvatarType::Avatar => Ok(deps.cache.get_avatar(username, fp).await.map(AvatarResponse::Bytes)),
        AvatarType::Sprite => redirect_if_exists(deps, &ResultCache::sprite_key(username)).await,
        AvatarType::Thumbnail => redirect_if_exists(deps, &ResultCache::thumbnail_key(username)).await,
    }
}

async fn redirect_if_exists(deps: &AvatarDeps, key: &str) -> Result<Option<AvatarResponse>, ApiError> {
    if !deps.cache.object_exists(key).await {
        return Ok(None);
    }
    let url = deps.cache.signed_url(key, SIGNED_URL_TTL).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Some(AvatarResponse::Redirect(url)))
}

/// Step 5 overload path: redirect to the user's previous object for the
/// requested type when one exists, otherwise serve the built-in default
/// asset, otherwise surface `Overloaded`.
async fn overload_fallback(deps: &AvatarDeps, user: &avatar_model::User, avatar_type: AvatarType) -> Result<AvatarResponse, ApiError> {
    let previous_key = match avatar_type {
        AvatarType::Avatar => user.avatar_key.as_deref(),
        AvatarType::Sprite => user.clothing_key.as_deref(),
        AvatarType::Thumbnail => user.thumbnail_key.as_deref(),
    };

    if let Some(key) = previous_key {
        let url = deps.cache.signed_url(key, SIGNED_URL_TTL).map_err(|err| ApiError::Internal(err.to_string()))?;
        return Ok(AvatarResponse::Redirect(url));
    }

    match &deps.default_asset {
        Some(bytes) => Ok(AvatarResponse::Default(bytes.clone())),
        None => Err(ApiError::Overloaded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_store::InMemoryUserStore;
    use async_trait::async_trait;
    use avatar_cache::ResultCacheConfig;
    use avatar_coordinator::{CoordinatorConfig, RenderError, Renderer};
    use avatar_fingerprint::FingerprintHash;
    use avatar_model::Customization;
    use avatar_store::{ObjectStore, StoreError};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct StubStore {
        objects: StdMutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl ObjectStore for StubStore {
        async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StoreError> {
            self.objects.lock().expect("lock").insert(key.to_string(), bytes);
            Ok(())
        }

        async fn head(&self, key: &str) -> Result<bool, StoreError> {
            Ok(self.objects.lock().expect("lock").contains_key(key))
        }

        async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
            self.objects.lock().expect("lock").get(key).cloned().ok_or_else(|| StoreError::NotFound(key.to_string()))
        }

        fn signed_get_url(&self, key: &str, _ttl: Duration) -> Result<String, StoreError> {
            Ok(format!("https://example.invalid/{key}?signed=1"))
        }
    }

    struct StubRenderer;

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(&self, username: &str, fingerprint: FingerprintHash) -> Result<avatar_cache::RenderedObjects, RenderError> {
            Ok(avatar_cache::RenderedObjects {
                avatar: Bytes::from(format!("avatar:{username}:{fingerprint}")),
                clothing_sheet: Bytes::from(format!("sheet:{username}:{fingerprint}")),
                thumbnail: Bytes::from(format!("thumb:{username}:{fingerprint}")),
            })
        }
    }

    fn deps(queue_capacity: usize, users: Arc<InMemoryUserStore>, default_asset: Option<Bytes>) -> (AvatarDeps, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_config = ResultCacheConfig { disk_root: dir.path().join("avatars"), ..ResultCacheConfig::default() };
        let cache = Arc::new(ResultCache::new(cache_config, Arc::new(StubStore::default())));
        let coordinator_config = CoordinatorConfig { queue_capacity, ..CoordinatorConfig::default() };
        let coordinator = RenderCoordinator::new(coordinator_config, Arc::new(StubRenderer), cache.clone());
        (AvatarDeps { users, cache, coordinator, default_asset }, dir)
    }

    #[tokio::test]
    async fn cold_request_renders_and_advances_hash() {
        let users = Arc::new(InMemoryUserStore::new());
        users.upsert_customization("alice", Customization::default()).await;
        let (deps, _dir) = deps(1000, users.clone(), None);

        let response = get_avatar(&deps, "alice", "avatar").await.expect("response");
        assert!(matches!(response, AvatarResponse::Bytes(_)));

        let user = users.get("alice").await.expect("user");
        let fp = fingerprint("alice", &user.customization);
        assert_eq!(user.customization_hash, Some(fp.0));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let users = Arc::new(InMemoryUserStore::new());
        let (deps, _dir) = deps(1000, users, None);
        let err = get_avatar(&deps, "nobody", "avatar").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn invalid_type_is_rejected() {
        let users = Arc::new(InMemoryUserStore::new());
        let (deps, _dir) = deps(1000, users, None);
        let err = get_avatar(&deps, "alice", "bogus").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn overload_without_previous_render_serves_default_asset() {
        let users = Arc::new(InMemoryUserStore::new());
        users.upsert_customization("alice", Customization::default()).await;
        let (deps, _dir) = deps(0, users, Some(Bytes::from_static(b"default-asset")));
        let response = get_avatar(&deps, "alice", "avatar").await.expect("response");
        assert!(matches!(response, AvatarResponse::Default(bytes) if bytes == Bytes::from_static(b"default-asset")));
    }

    #[tokio::test]
    async fn overload_with_previous_render_redirects() {
        let users = Arc::new(InMemoryUserStore::new());
        users.upsert_customization("alice", Customization::default()).await;
        users.record_render("alice", FingerprintHash(0xdead_beef)).await;
        let (deps, _dir) = deps(0, users, None);
        let response = get_avatar(&deps, "alice", "avatar").await.expect("response");
        assert!(matches!(response, AvatarResponse::Redirect(_)));
    }
}
