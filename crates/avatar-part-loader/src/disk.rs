// SPDX-License-Identifier: Apache-2.0
//! On-disk PNG tier, written atomically via temp-file-then-rename.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::debug;

use crate::error::PartLoaderError;
use crate::key::disk_stem;
use avatar_model::ItemRef;

pub struct DiskTier {
    root: PathBuf,
}

impl DiskTier {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, item: &ItemRef) -> PathBuf {
        self.root.join(format!("{}.png", disk_stem(item)))
    }

    pub async fn load(&self, item: &ItemRef) -> Option<RgbaImage> {
        let path = self.path_for(item);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match image::load_from_memory(&bytes) {
            Ok(image) => {
                debug!(item = %item, "disk tier hit");
                Some(image.into_rgba8())
            }
            Err(_) => None,
        }
    }

    pub async fn store(&self, item: &ItemRef, image: &RgbaImage) -> Result<(), PartLoaderError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let final_path = self.path_for(item);
        let tmp_path = final_path.with_extension("png.tmp");
        let mut png_bytes = Vec::new();
        {
            use image::codecs::png::PngEncoder;
            use image::ImageEncoder;
            let encoder = PngEncoder::new(&mut png_bytes);
            encoder.write_image(image, image.width(), image.height(), image::ExtendedColorType::Rgba8)?;
        }
        tokio::fs::write(&tmp_path, &png_bytes).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }
}

#[must_use]
pub fn default_cache_root() -> PathBuf {
    Path::new("cache").to_path_buf()
}
