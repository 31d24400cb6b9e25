// SPDX-License-Identifier: Apache-2.0
//! Cache-key derivation for individual parts (`spec.md` §1, §6).

use avatar_model::ItemRef;
use md5::{Digest, Md5};

/// Disk-tier filename stem: `md5(lowercased itemRef)`, hex-encoded.
#[must_use]
pub fn disk_stem(item: &ItemRef) -> String {
    let mut hasher = Md5::new();
    hasher.update(item.cache_key().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_is_case_insensitive() {
        let lower = ItemRef::from("Hat_007");
        let upper = ItemRef::from("HAT_007");
        assert_eq!(disk_stem(&lower), disk_stem(&upper));
    }

    #[test]
    fn stem_is_32_hex_chars() {
        let stem = disk_stem(&ItemRef::from("shirt_123"));
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
