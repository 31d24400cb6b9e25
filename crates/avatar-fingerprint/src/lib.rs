// SPDX-License-Identifier: Apache-2.0
//! Fingerprinter (C3): derives a stable 32-bit content hash from
//! `(username, customization)` (`spec.md` §4.1).
//!
//! Two customizations that serialize to byte-identical canonical forms
//! produce identical fingerprints; any observable change — a slot add/
//! remove, a changed item reference, a changed attribute, a changed
//! numeric field, or a flipped chroma-key mode — changes the canonical
//! form and, with overwhelming probability, the fingerprint.

use std::fmt;

use avatar_model::{Customization, SlotValue};

/// A 32-bit content hash of `(username, customization)`. The cache key for
/// every tier in the system.
///
/// Newtype pattern mirrors the teacher's `BlobHash`: thin wrapper, public
/// inner value for zero-cost access, lowercase-hex `Display` for logging.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FingerprintHash(pub u32);

impl fmt::Display for FingerprintHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

const NONE_SENTINEL: u8 = 0x00;
const SOME_TAG: u8 = 0x01;

/// Build the canonical byte form of `(username, customization)`.
///
/// Slot keys are emitted in their fixed declaration order (`avatar_model`'s
/// `SLOT_ORDER`/`TATTOO_SLOT_ORDER`); missing slots are the canonical "none"
/// sentinel; attributes are emitted in key-sorted order (already guaranteed
/// by `BTreeMap`'s iteration order).
#[must_use]
pub fn canonical_form(username: &str, customization: &Customization) -> Vec<u8> {
    let mut buf = Vec::with_capacity(512);
    write_str(&mut buf, username);

    write_str(&mut buf, match customization.sex {
        avatar_model::Sex::Male => "male",
        avatar_model::Sex::Female => "female",
    });
    write_str(&mut buf, match customization.body_variant {
        avatar_model::BodyVariant::Slim => "slim",
        avatar_model::BodyVariant::Average => "average",
        avatar_model::BodyVariant::Broad => "broad",
    });
    buf.push(customization.skin_tone);

    for (name, slot) in customization.ordered_slots() {
        write_str(&mut buf, name);
        write_slot(&mut buf, slot.as_ref());
    }

    for (name, slot) in customization.tattoos.ordered() {
        write_str(&mut buf, name);
        write_slot(&mut buf, slot.as_ref());
    }

    buf.push(u8::from(customization.chroma_key_mode));
    buf
}

fn write_slot(buf: &mut Vec<u8>, slot: Option<&SlotValue>) {
    match slot {
        None => buf.push(NONE_SENTINEL),
        Some(value) => {
            buf.push(SOME_TAG);
            write_str(buf, &value.item.0);
            let len: u32 = value.attributes.len().try_into().unwrap_or(u32::MAX);
            buf.extend_from_slice(&len.to_le_bytes());
            for (k, v) in &value.attributes {
                write_str(buf, k);
                write_str(buf, v);
            }
        }
    }
}

fn write_str(buf: &mut Vec<u8>, s: &str) {
    let len: u32 = s.len().try_into().unwrap_or(u32::MAX);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Derive the fingerprint for a `(username, customization)` pair.
#[must_use]
pub fn fingerprint(username: &str, customization: &Customization) -> FingerprintHash {
    let canonical = canonical_form(username, customization);
    FingerprintHash(xxhash_rust::xxh32::xxh32(&canonical, 0))
}
