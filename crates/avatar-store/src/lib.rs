// SPDX-License-Identifier: Apache-2.0
//! Object-storage and CDN client contracts (`spec.md` §1, §6).
//!
//! These are external collaborators per the spec; only their contracts are
//! load-bearing for the core. This crate provides the trait boundary
//! (`ObjectStore`, `CdnClient`) plus one concrete implementation for each,
//! targeting DigitalOcean Spaces (S3-compatible).

mod cdn;
mod error;
pub mod keys;
mod sigv4;
mod spaces;
mod traits;

pub use cdn::HttpCdnClient;
pub use error::StoreError;
pub use spaces::{SpacesConfig, SpacesObjectStore};
pub use traits::{CdnClient, ObjectStore};
