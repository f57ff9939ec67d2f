//! Wait-time bookkeeping by queue position.
//!
//! Positions are 1-based. A position's `first_observed_at` entry is written
//! once and never overwritten, so repeated indexing of an unchanged queue is
//! a no-op. Samples for positions a session no longer occupies are kept; the
//! clear-duration pass reads all of them.

use crate::proxy::SessionId;
use crate::queue::TierState;
use std::time::Instant;

/// Record, for every queued identity, the first instant it was observed at
/// its current position.
pub fn index_position_times(state: &mut TierState, now: Instant) {
    let ids: Vec<SessionId> = state.queue.keys().copied().collect();
    for (idx, id) in ids.iter().enumerate() {
        let position = idx + 1;
        state
            .position_cache
            .entry(*id)
            .or_default()
            .entry(position)
            .or_insert(now);
    }
}

/// Fold one identity's position history into the tier's per-position wait
/// samples, overwriting previous samples. Called just before the identity is
/// promoted, so the samples reflect the pre-promotion queue depth.
pub fn record_clear_durations(state: &mut TierState, id: SessionId, now: Instant) {
    let observed: Vec<(usize, Instant)> = match state.position_cache.get(&id) {
        Some(cache) => cache.iter().map(|(p, t)| (*p, *t)).collect(),
        None => return,
    };
    for (position, first_seen) in observed {
        state
            .duration_from_position
            .insert(position, now.saturating_duration_since(first_seen));
    }
}
