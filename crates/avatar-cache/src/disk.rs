// SPDX-License-Identifier: Apache-2.0
//! Disk tier: `<root>/avatars/<fingerprint>.webp`, written atomically
//! (`spec.md` §4.4), plus the 7-day sweeper.

use std::path::PathBuf;
use std::time::Duration;

use avatar_fingerprint::FingerprintHash;
use bytes::Bytes;
use tracing::{info, warn};

pub struct DiskResultTier {
    root: PathBuf,
}

impl DiskResultTier {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, fingerprint: FingerprintHash) -> PathBuf {
        self.root.join(format!("{fingerprint}.webp"))
    }

    pub async fn load(&self, fingerprint: FingerprintHash) -> Option<Bytes> {
        tokio::fs::read(self.path_for(fingerprint)).await.ok().map(Bytes::from)
    }

    pub async fn store(&self, fingerprint: FingerprintHash, bytes: &Bytes) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let final_path = self.path_for(fingerprint);
        let tmp_path = final_path.with_extension("webp.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }

    /// `/clear-cache` (`spec.md` §6): drop every cached result regardless
    /// of age, unlike the age-bounded sweeper.
    pub async fn clear_all(&self) -> std::io::Result<u64> {
        sweep_once(&self.root, Duration::ZERO).await
    }
}

/// Delete files under `root` whose modification time is older than `max_age`.
/// Intended to run once per `interval` for the lifetime of the process.
pub async fn sweep_once(root: &std::path::Path, max_age: Duration) -> std::io::Result<u64> {
    let mut removed = 0;
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let age = metadata.modified()?.elapsed().unwrap_or(Duration::ZERO);
        if age > max_age {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                warn!(path = %entry.path().display(), error = %err, "failed to sweep stale cache file");
            } else {
                removed += 1;
            }
        }
    }
    if removed > 0 {
        info!(removed, root = %root.display(), "swept stale disk cache entries");
    }
    Ok(removed)
}

/// Spawn a background task that sweeps `root` every `interval`, forever.
pub fn spawn_sweeper(root: PathBuf, max_age: Duration, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = sweep_once(&root, max_age).await {
                warn!(error = %err, "disk sweeper pass failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tier = DiskResultTier::new(dir.path());
        let fp = FingerprintHash(42);
        tier.store(fp, &Bytes::from_static(b"webpbytes")).await.expect("store");
        let loaded = tier.load(fp).await.expect("load");
        assert_eq!(loaded, Bytes::from_static(b"webpbytes"));
    }

    #[tokio::test]
    async fn sweep_removes_old_files_and_keeps_fresh_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tier = DiskResultTier::new(dir.path());
        tier.store(FingerprintHash(1), &Bytes::from_static(b"old")).await.expect("store");
        tier.store(FingerprintHash(2), &Bytes::from_static(b"new")).await.expect("store");

        let old_path = dir.path().join(format!("{}.webp", FingerprintHash(1)));
        let ancient = std::time::SystemTime::now() - Duration::from_secs(8 * 24 * 3600);
        let file = std::fs::File::options().write(true).open(&old_path).expect("open");
        file.set_modified(ancient).expect("set mtime");

        let removed = sweep_once(dir.path(), Duration::from_secs(7 * 24 * 3600)).await.expect("sweep");
        assert_eq!(removed, 1);
        assert!(tier.load(FingerprintHash(1)).await.is_none());
        assert!(tier.load(FingerprintHash(2)).await.is_some());
    }
}
