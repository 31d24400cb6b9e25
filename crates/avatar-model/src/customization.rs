// SPDX-License-Identifier: Apache-2.0
//! Customization value object: the full set of slot choices that define a
//! user's appearance (`spec.md` §3).

use std::collections::BTreeMap;

use crate::item::ItemRef;

/// A value placed in a named slot: the item reference plus slot-specific
/// attributes (e.g. a recolor key). Attributes are opaque to the compositor
/// but participate in the fingerprint (resolves `spec.md` §9 Open Question 1).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlotValue {
    pub item: ItemRef,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SlotValue {
    #[must_use]
    pub fn new(item: impl Into<ItemRef>) -> Self {
        Self { item: item.into(), attributes: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum BodyVariant {
    Slim,
    #[default]
    Average,
    Broad,
}

/// The fixed, declaration-ordered set of named body slots.
///
/// This order is load-bearing: `avatar-fingerprint`'s canonical form walks
/// slots in exactly this order, so changing it changes every fingerprint.
pub const SLOT_ORDER: &[&str] = &[
    "makeup",
    "hair",
    "beard",
    "eyes",
    "eyebrows",
    "head",
    "nose",
    "mouth",
    "hat",
    "piercings",
    "earPiece",
    "glasses",
    "horns",
    "top",
    "necklace",
    "neckwear",
    "coat",
    "belt",
    "bottom",
    "socks",
    "shoes",
    "bracelets",
    "wings",
    "bag",
    "gloves",
    "handheld",
];

/// The fixed, declaration-ordered set of tattoo sub-slots.
pub const TATTOO_SLOT_ORDER: &[&str] = &[
    "head",
    "neck",
    "chest",
    "stomach",
    "backUpper",
    "backLower",
    "armRight",
    "armLeft",
    "legRight",
    "legLeft",
];

/// Ten named tattoo sub-slots, in their fixed declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tattoos {
    pub head: Option<SlotValue>,
    pub neck: Option<SlotValue>,
    pub chest: Option<SlotValue>,
    pub stomach: Option<SlotValue>,
    #[serde(rename = "backUpper")]
    pub back_upper: Option<SlotValue>,
    #[serde(rename = "backLower")]
    pub back_lower: Option<SlotValue>,
    #[serde(rename = "armRight")]
    pub arm_right: Option<SlotValue>,
    #[serde(rename = "armLeft")]
    pub arm_left: Option<SlotValue>,
    #[serde(rename = "legRight")]
    pub leg_right: Option<SlotValue>,
    #[serde(rename = "legLeft")]
    pub leg_left: Option<SlotValue>,
}

impl Tattoos {
    /// Sub-slots in their fixed declaration order, paired with their name.
    #[must_use]
    pub fn ordered(&self) -> [(&'static str, &Option<SlotValue>); 10] {
        [
            ("head", &self.head),
            ("neck", &self.neck),
            ("chest", &self.chest),
            ("stomach", &self.stomach),
            ("backUpper", &self.back_upper),
            ("backLower", &self.back_lower),
            ("armRight", &self.arm_right),
            ("armLeft", &self.arm_left),
            ("legRight", &self.leg_right),
            ("legLeft", &self.leg_left),
        ]
    }
}

/// The full customization: base-image selectors plus every named slot and
/// the tattoo sub-record.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Customization {
    pub sex: Sex,
    pub body_variant: BodyVariant,
    pub skin_tone: u8,

    pub makeup: Option<SlotValue>,
    pub hair: Option<SlotValue>,
    pub beard: Option<SlotValue>,
    pub eyes: Option<SlotValue>,
    pub eyebrows: Option<SlotValue>,
    pub head: Option<SlotValue>,
    pub nose: Option<SlotValue>,
    pub mouth: Option<SlotValue>,
    pub hat: Option<SlotValue>,
    pub piercings: Option<SlotValue>,
    #[serde(rename = "earPiece")]
    pub ear_piece: Option<SlotValue>,
    pub glasses: Option<SlotValue>,
    pub horns: Option<SlotValue>,
    pub top: Option<SlotValue>,
    pub necklace: Option<SlotValue>,
    pub neckwear: Option<SlotValue>,
    pub coat: Option<SlotValue>,
    pub belt: Option<SlotValue>,
    pub bottom: Option<SlotValue>,
    pub socks: Option<SlotValue>,
    pub shoes: Option<SlotValue>,
    pub bracelets: Option<SlotValue>,
    pub wings: Option<SlotValue>,
    pub bag: Option<SlotValue>,
    pub gloves: Option<SlotValue>,
    pub handheld: Option<SlotValue>,

    #[serde(default)]
    pub tattoos: Tattoos,

    /// Whether this customization's assets use the legacy chroma-key mask
    /// mode (`spec.md` §4.3). Part of the fingerprint so the two modes never
    /// collide in the cache.
    #[serde(default)]
    pub chroma_key_mode: bool,
}

impl Customization {
    /// Body slots in their fixed declaration order, paired with their name.
    #[must_use]
    pub fn ordered_slots(&self) -> [(&'static str, &Option<SlotValue>); 26] {
        [
            ("makeup", &self.makeup),
            ("hair", &self.hair),
            ("beard", &self.beard),
            ("eyes", &self.eyes),
            ("eyebrows", &self.eyebrows),
            ("head", &self.head),
            ("nose", &self.nose),
            ("mouth", &self.mouth),
            ("hat", &self.hat),
            ("piercings", &self.piercings),
            ("earPiece", &self.ear_piece),
            ("glasses", &self.glasses),
            ("horns", &self.horns),
            ("top", &self.top),
            ("necklace", &self.necklace),
            ("neckwear", &self.neckwear),
            ("coat", &self.coat),
            ("belt", &self.belt),
            ("bottom", &self.bottom),
            ("socks", &self.socks),
            ("shoes", &self.shoes),
            ("bracelets", &self.bracelets),
            ("wings", &self.wings),
            ("bag", &self.bag),
            ("gloves", &self.gloves),
            ("handheld", &self.handheld),
        ]
    }

    /// The body base file stem: `<male|female>_<variant>_<skinTone>`.
    #[must_use]
    pub fn base_stem(&self) -> String {
        let sex = match self.sex {
            Sex::Male => "male",
            Sex::Female => "female",
        };
        let variant = match self.body_variant {
            BodyVariant::Slim => "slim",
            BodyVariant::Average => "average",
            BodyVariant::Broad => "broad",
        };
        format!("{sex}_{variant}_{}", self.skin_tone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Customization {
        Customization {
            sex: Sex::Female,
            body_variant: BodyVariant::Average,
            skin_tone: 3,
            makeup: None,
            hair: Some(SlotValue::new("H1")),
            beard: None,
            eyes: None,
            eyebrows: None,
            head: None,
            nose: None,
            mouth: None,
            hat: None,
            piercings: None,
            ear_piece: None,
            glasses: None,
            horns: None,
            top: Some(SlotValue::new("T1")),
            necklace: None,
            neckwear: None,
            coat: None,
            belt: None,
            bottom: None,
            socks: None,
            shoes: None,
            bracelets: None,
            wings: None,
            bag: None,
            gloves: None,
            handheld: None,
            tattoos: Tattoos::default(),
            chroma_key_mode: false,
        }
    }

    #[test]
    fn ordered_slots_matches_declaration_order() {
        let c = base();
        let names: Vec<&str> = c.ordered_slots().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, SLOT_ORDER);
    }

    #[test]
    fn tattoo_order_matches_declaration_order() {
        let c = base();
        let names: Vec<&str> = c.tattoos.ordered().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, TATTOO_SLOT_ORDER);
    }

    #[test]
    fn base_stem_format() {
        let c = base();
        assert_eq!(c.base_stem(), "female_average_3");
    }
}
