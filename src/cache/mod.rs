//! Local cache of remote source clones
//!
//! Remote references are fetched once and kept under
//! `<home>/.cache/makes/sources/<cache key>/` so later checkouts of the
//! same revision fetch from disk instead of the network.
//!
//! # Lifecycle
//!
//! | Entry state | On lookup | After checkout |
//! |-------------|-----------|----------------|
//! | Absent | fetch from remote | seeded from the checkout |
//! | Fresh (≤ 24h) | fetch from entry | left untouched |
//! | Stale (> 24h) | deleted, fetch from remote | re-seeded |
//!
//! There is no cross-process locking. A racing writer can at worst leave
//! a broken entry; fetching from it fails, the entry is evicted and the
//! checkout falls back to the remote. The build itself only ever sees a
//! fresh fetch + checkout, never the entry directly.

pub mod sources;

pub use sources::{copy_tree, CacheLookup, CloneCache, SOURCE_TTL_SECS};
