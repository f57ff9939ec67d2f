//! Priority tiers and their queue state.
//!
//! Tiers are held in a fixed priority order; a session belongs to the first
//! tier whose permission node it holds, falling back to the catch-all tier
//! that closes the list. Each tier carries its own FIFO queue plus the
//! position-time bookkeeping consumed by wait estimates.

use crate::config::TierConfig;
use crate::proxy::{OccupancyProbe, Session, SessionId};
use crate::queue::ordered::OrderedMap;
use anyhow::{bail, Result};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Mutable queue state of one tier, guarded by the tier's lock.
#[derive(Debug, Default)]
pub struct TierState {
    /// FIFO queue: identity -> the destination recorded at enqueue time.
    pub queue: OrderedMap<SessionId, String>,
    /// Per identity, the first instant it was observed at each queue
    /// position. Entries for positions no longer occupied are retained.
    pub position_cache: HashMap<SessionId, HashMap<usize, Instant>>,
    /// Most recent observed time-to-clear sample per queue position.
    pub duration_from_position: HashMap<usize, Duration>,
}

/// One named priority class with its own capacity quota and queue.
pub struct Tier {
    name: String,
    permission: Option<String>,
    reserved_slots: usize,
    header: String,
    footer: String,
    state: Mutex<TierState>,
}

impl Tier {
    pub fn from_config(config: &TierConfig) -> Self {
        Self {
            name: config.name.clone(),
            permission: config.permission.clone(),
            reserved_slots: config.reserved_slots,
            header: config.header.clone(),
            footer: config.footer.clone(),
            state: Mutex::new(TierState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reserved_slots(&self) -> usize {
        self.reserved_slots
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Whether the session belongs to this tier. The catch-all tier has no
    /// permission node and matches everyone.
    pub fn matches(&self, session: &dyn Session) -> bool {
        self.permission
            .as_deref()
            .is_none_or(|node| session.has_permission(node))
    }

    /// Lock and expose the tier's queue state.
    pub fn state(&self) -> MutexGuard<'_, TierState> {
        self.state.lock()
    }

    /// Reserved slots minus the externally reported occupancy inside the
    /// destination. Negative when the quota is exceeded.
    pub fn free_slots(&self, probe: &dyn OccupancyProbe, destination: &str) -> i64 {
        self.reserved_slots as i64 - probe.occupancy(destination, &self.name) as i64
    }

    pub fn enqueue(&self, id: SessionId, destination: String) {
        self.state.lock().queue.insert(id, destination);
    }

    /// Enqueue only if the identity is not already queued; returns true on
    /// insert.
    pub fn enqueue_if_absent(&self, id: SessionId, destination: String) -> bool {
        self.state.lock().queue.insert_if_absent(id, destination)
    }

    pub fn remove(&self, id: SessionId) -> Option<String> {
        self.state.lock().queue.remove(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.state.lock().queue.contains_key(&id)
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    /// Stable snapshot of the queue in FIFO order as of now.
    pub fn queued_snapshot(&self) -> Vec<(SessionId, String)> {
        self.state.lock().queue.snapshot()
    }

    /// 1-based queue position of an identity.
    pub fn position_of(&self, id: SessionId) -> Option<usize> {
        self.state.lock().queue.position_of(&id)
    }

    /// Most recent observed wait duration for the given queue position, for
    /// progress display.
    pub fn wait_estimate(&self, position: usize) -> Option<Duration> {
        self.state
            .lock()
            .duration_from_position
            .get(&position)
            .copied()
    }
}

impl std::fmt::Debug for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tier")
            .field("name", &self.name)
            .field("permission", &self.permission)
            .field("reserved_slots", &self.reserved_slots)
            .finish()
    }
}

/// All configured tiers in priority order.
#[derive(Debug)]
pub struct TierSet {
    tiers: Vec<Arc<Tier>>,
}

impl TierSet {
    /// Build from configuration. The list must be non-empty and end with the
    /// catch-all tier so that selection always succeeds.
    pub fn from_config(configs: &[TierConfig]) -> Result<Self> {
        if configs.is_empty() {
            bail!("at least one tier must be configured");
        }
        match configs.last() {
            Some(last) if last.permission.is_none() => {}
            _ => bail!("the last tier must be the catch-all tier without a permission node"),
        }
        Ok(Self {
            tiers: configs.iter().map(|c| Arc::new(Tier::from_config(c))).collect(),
        })
    }

    /// Highest-priority tier whose permission the session holds. The
    /// catch-all tier guarantees a match.
    pub fn select(&self, session: &dyn Session) -> Arc<Tier> {
        for tier in &self.tiers {
            if tier.matches(session) {
                return Arc::clone(tier);
            }
        }
        // Unreachable with a validated config; the catch-all matches all.
        Arc::clone(&self.tiers[self.tiers.len() - 1])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tier>> {
        self.tiers.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Arc<Tier>> {
        self.tiers.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}
