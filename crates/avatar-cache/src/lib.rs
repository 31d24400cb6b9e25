// SPDX-License-Identifier: Apache-2.0
//! Result cache (`spec.md` §2 C4): memory, disk, and remote tiers for
//! finished avatar renders.

mod cache;
mod disk;
mod error;
mod memory;
mod remote;

pub use cache::{ResultCache, ResultCacheConfig};
pub use disk::{spawn_sweeper, sweep_once};
pub use error::CacheError;
pub use remote::RenderedObjects;
