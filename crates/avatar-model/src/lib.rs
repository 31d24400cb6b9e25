// SPDX-License-Identifier: Apache-2.0
//! Data model for the avatar rendering service.
//!
//! Every type here is a plain value object. No I/O, no async, no caching —
//! those concerns live in `avatar-fingerprint`, `avatar-cache`, and
//! `avatar-compositor`. Keeping the model inert lets every downstream crate
//! depend on it without dragging along async runtimes or HTTP clients.

pub mod customization;
pub mod item;
pub mod user;

pub use customization::{BodyVariant, Customization, Sex, SlotValue, Tattoos};
pub use item::{Item, ItemRef};
pub use user::User;
