// SPDX-License-Identifier: Apache-2.0
//! Wires the part loader and the pure compositor into an
//! `avatar_coordinator::Renderer`: the only place in this crate that
//! touches pixels.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use avatar_cache::RenderedObjects;
use avatar_compositor::{avatar_frame, compose_sheet, encode_webp, thumbnail_crop, LayoutFlags, BASE_LAYER_KEY, TATTOO_KEY_PREFIX, AVATAR_QUALITY, DEFAULT_THUMBNAIL_QUALITY};
use avatar_coordinator::{RenderError, Renderer};
use avatar_fingerprint::FingerprintHash;
use avatar_model::{Customization, Item, ItemRef};
use avatar_part_loader::PartLoader;
use bytes::Bytes;
use image::RgbaImage;
use tracing::warn;

use crate::item_store::ItemStore;
use crate::user_store::UserStore;

/// Body-base rasters are local, pre-baked assets (`spec.md` §6:
/// `_bases/<sex>_<variant>_<skinTone>.png`), never fetched through the CDN
/// or object store — they ship with the deployment, not with user content.
pub struct CompositingRenderer {
    user_store: Arc<dyn UserStore>,
    item_store: Arc<dyn ItemStore>,
    part_loader: Arc<PartLoader>,
    base_root: PathBuf,
}

impl CompositingRenderer {
    #[must_use]
    pub fn new(
        user_store: Arc<dyn UserStore>,
        item_store: Arc<dyn ItemStore>,
        part_loader: Arc<PartLoader>,
        base_root: impl Into<PathBuf>,
    ) -> Self {
        Self { user_store, item_store, part_loader, base_root: base_root.into() }
    }

    async fn load_base(&self, stem: &str) -> Option<RgbaImage> {
        let path = self.base_root.join(format!("{stem}.png"));
        let bytes = tokio::fs::read(&path).await.ok()?;
        image::load_from_memory(&bytes).ok().map(image::DynamicImage::into_rgba8)
    }

    /// Resolve the flag carried by an item's free-form description, default
    /// `false` on any lookup failure (`spec.md` §7).
    async fn flag_from(&self, item_ref: Option<&ItemRef>, pick: impl Fn(&Item) -> bool) -> bool {
        let Some(item_ref) = item_ref else { return false };
        match self.item_store.get(item_ref).await {
            Some(item) => pick(&item),
            None => {
                warn!(item = %item_ref, "item description lookup failed, defaulting flag to false");
                false
            }
        }
    }

    async fn resolve_layout_flags(&self, customization: &Customization) -> LayoutFlags {
        let shoes_behind_pants = self
            .flag_from(customization.bottom.as_ref().map(|s| &s.item), Item::shoes_behind_pants)
            .await;
        let hair_in_front_of_top = match &customization.top {
            Some(top) => self.flag_from(Some(&top.item), Item::hair_in_front_of_top).await,
            None => self.flag_from(customization.coat.as_ref().map(|s| &s.item), Item::hair_in_front_of_top).await,
        };
        LayoutFlags { shoes_behind_pants, hair_in_front_of_top }
    }

    async fn build_layers(&self, customization: &Customization) -> HashMap<String, RgbaImage> {
        let mut layers = HashMap::new();

        if let Some(base) = self.load_base(&customization.base_stem()).await {
            layers.insert(BASE_LAYER_KEY.to_string(), base);
        } else {
            warn!(stem = %customization.base_stem(), "body base raster missing, compositing without it");
        }

        for (name, slot) in customization.ordered_slots() {
            let Some(slot) = slot else { continue };
            if let Some(raster) = self.part_loader.load(&slot.item).await {
                layers.insert(name.to_string(), (*raster).clone());
            }
        }

        for (name, slot) in customization.tattoos.ordered() {
            let Some(slot) = slot else { continue };
            if let Some(raster) = self.part_loader.load(&slot.item).await {
                layers.insert(format!("{TATTOO_KEY_PREFIX}{name}"), (*raster).clone());
            }
        }

        layers
    }

    /// The legacy chroma-key mode (`spec.md` §4.3) is recorded as a single
    /// per-customization flag rather than per-layer asset metadata; when
    /// set, every loaded layer self-masks (the "single-image form").
    fn chroma_key_masks(customization: &Customization, layers: &HashMap<String, RgbaImage>) -> Option<HashMap<String, String>> {
        if !customization.chroma_key_mode {
            return None;
        }
        Some(layers.keys().map(|name| (name.clone(), name.clone())).collect())
    }
}

#[async_trait]
impl Renderer for CompositingRenderer {
    async fn render(&self, username: &str, fingerprint: FingerprintHash) -> Result<RenderedObjects, RenderError> {
        let user = self
            .user_store
            .get(username)
            .await
            .ok_or_else(|| RenderError::Fatal(format!("unknown user {username}")))?;

        let flags = self.resolve_layout_flags(&user.customization).await;
        let layers = self.build_layers(&user.customization).await;
        let masks = Self::chroma_key_masks(&user.customization, &layers);

        let sheet = compose_sheet(&layers, flags, masks.as_ref())
            .map_err(|err| RenderError::Fatal(format!("composition failed for {username}@{fingerprint}: {err}")))?;
        let avatar = avatar_frame(&sheet);
        let thumbnail = thumbnail_crop(&avatar);

        let avatar_bytes = encode_webp(&avatar, AVATAR_QUALITY).map_err(|err| RenderError::Fatal(err.to_string()))?;
        let sheet_bytes = encode_webp(&sheet, AVATAR_QUALITY).map_err(|err| RenderError::Fatal(err.to_string()))?;
        let thumbnail_bytes =
            encode_webp(&thumbnail, DEFAULT_THUMBNAIL_QUALITY).map_err(|err| RenderError::Fatal(err.to_string()))?;

        Ok(RenderedObjects {
            avatar: Bytes::from(avatar_bytes),
            clothing_sheet: Bytes::from(sheet_bytes),
            thumbnail: Bytes::from(thumbnail_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_store::InMemoryItemStore;
    use crate::user_store::InMemoryUserStore;
    use avatar_model::SlotValue;
    use avatar_store::{CdnClient, StoreError};
    use bytes::Bytes as StoreBytes;
    use image::{ImageEncoder, Rgba};

    struct StubCdn;

    #[async_trait]
    impl CdnClient for StubCdn {
        async fn fetch_part(&self, _item_ref: &str) -> Result<StoreBytes, StoreError> {
            let image = RgbaImage::from_pixel(425, 850, Rgba([10, 20, 30, 255]));
            let mut bytes = Vec::new();
            image::codecs::png::PngEncoder::new(&mut bytes)
                .write_image(&image, 425, 850, image::ExtendedColorType::Rgba8)
                .expect("encode");
            Ok(StoreBytes::from(bytes))
        }
    }

    fn customization() -> Customization {
        Customization {
            hair: Some(SlotValue::new("H1")),
            top: Some(SlotValue::new("T1")),
            bottom: Some(SlotValue::new("B1")),
            shoes: Some(SlotValue::new("S1")),
            ..Customization::default()
        }
    }

    #[tokio::test]
    async fn renders_three_webp_objects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base_root = dir.path().join("bases");
        tokio::fs::create_dir_all(&base_root).await.expect("mkdir");
        let base = RgbaImage::from_pixel(2550, 850, Rgba([1, 1, 1, 255]));
        image::DynamicImage::ImageRgba8(base)
            .save(base_root.join(format!("{}.png", Customization::default().base_stem())))
            .expect("save base");

        let users = InMemoryUserStore::new();
        users.upsert_customization("alice", customization()).await;
        let items = InMemoryItemStore::seeded([
            Item { id: ItemRef::from("T1"), description: "top !s".to_string() },
            Item { id: ItemRef::from("B1"), description: "bottom !x".to_string() },
        ]);
        let part_loader = Arc::new(PartLoader::new(
            Arc::new(StubCdn),
            dir.path().join("parts"),
            16,
            16 * 1024 * 1024,
            4,
            5,
            std::time::Duration::from_secs(60),
        ));

        let renderer = CompositingRenderer::new(Arc::new(users), Arc::new(items), part_loader, base_root);
        let objects = renderer.render("alice", FingerprintHash(1)).await.expect("render");
        assert!(!objects.avatar.is_empty());
        assert!(!objects.clothing_sheet.is_empty());
        assert!(!objects.thumbnail.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_fatal() {
        let users = InMemoryUserStore::new();
        let items = InMemoryItemStore::new();
        let part_loader = Arc::new(PartLoader::new(
            Arc::new(StubCdn),
            std::env::temp_dir().join("avatar-service-test-parts"),
            4,
            1024 * 1024,
            2,
            5,
            std::time::Duration::from_secs(60),
        ));
        let renderer = CompositingRenderer::new(Arc::new(users), Arc::new(items), part_loader, "bases");
        let err = renderer.render("nobody", FingerprintHash(1)).await.unwrap_err();
        assert!(matches!(err, RenderError::Fatal(_)));
    }
}
