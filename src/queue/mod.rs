//! Queue state: ordered FIFO maps, priority tiers, and destination liveness.

pub mod liveness;
pub mod ordered;
pub mod tier;

pub use liveness::LivenessTracker;
pub use ordered::OrderedMap;
pub use tier::{Tier, TierSet, TierState};
