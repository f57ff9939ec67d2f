//! The periodic queue-movement engine.
//!
//! One cycle sweeps stale entries, recovers stranded sessions, and promotes
//! queued sessions tier by tier within capacity and the per-cycle cap.
//! Cycles are single-flight: a cycle arriving while the previous one still
//! runs is skipped, never run in parallel.

use crate::config::{Config, SoftRejectMode};
use crate::gate::position;
use crate::proxy::{OccupancyProbe, RejectStore, SessionId, SessionRegistry, SideChannel};
use crate::queue::{LivenessTracker, Tier, TierSet};
use crate::time::{Clock, SystemClock};
use bytes::BufMut;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;

/// Uniform draw in [0,100) deciding percent-mode soft rejects. Seam for
/// deterministic tests.
pub trait ShadowSampler: Send {
    fn draw(&mut self) -> u8;
}

/// Production sampler backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct RandomSampler;

impl ShadowSampler for RandomSampler {
    fn draw(&mut self) -> u8 {
        rand::thread_rng().gen_range(0..100)
    }
}

/// Outcome of one promotion cycle, for logging and tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    /// The cycle was skipped because the previous one was still running.
    pub skipped: bool,
    /// Promotions were withheld because the primary destination is down.
    pub paused: bool,
    pub stale_removed: usize,
    pub recovered: usize,
    pub promoted: usize,
    pub shadow_requeued: usize,
}

pub struct QueueMover<C: Clock = SystemClock> {
    config: Arc<Config>,
    tiers: Arc<TierSet>,
    liveness: Arc<LivenessTracker>,
    registry: Arc<dyn SessionRegistry>,
    occupancy: Arc<dyn OccupancyProbe>,
    rejects: Arc<dyn RejectStore>,
    channel: Arc<dyn SideChannel>,
    clock: C,
    sampler: Mutex<Box<dyn ShadowSampler>>,
    cycle_gate: Mutex<()>,
}

impl<C: Clock> QueueMover<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        tiers: Arc<TierSet>,
        liveness: Arc<LivenessTracker>,
        registry: Arc<dyn SessionRegistry>,
        occupancy: Arc<dyn OccupancyProbe>,
        rejects: Arc<dyn RejectStore>,
        channel: Arc<dyn SideChannel>,
        clock: C,
    ) -> Self {
        Self {
            config,
            tiers,
            liveness,
            registry,
            occupancy,
            rejects,
            channel,
            clock,
            sampler: Mutex::new(Box::new(RandomSampler)),
            cycle_gate: Mutex::new(()),
        }
    }

    /// Replace the percent-mode sampler; tests inject fixed draws here.
    pub fn set_sampler(&self, sampler: Box<dyn ShadowSampler>) {
        *self.sampler.lock() = sampler;
    }

    /// One cleanup/recovery/promotion pass. Invoked on a fixed cadence by an
    /// external scheduler; re-entrant invocations are skipped.
    pub fn run_cycle(&self) -> CycleStats {
        let Some(_guard) = self.cycle_gate.try_lock() else {
            tracing::warn!("previous queue cycle still running; skipping this one");
            return CycleStats {
                skipped: true,
                ..CycleStats::default()
            };
        };

        let stale_removed = self.sweep_stale();

        let recovered = if self.config.recovery.enabled {
            self.recover_stranded()
        } else {
            0
        };

        if self.config.policy.pause_when_primary_down
            && !self.liveness.is_online(&self.config.destinations.primary)
        {
            tracing::info!(
                primary = %self.config.destinations.primary,
                "primary destination down; promotions paused"
            );
            return CycleStats {
                paused: true,
                stale_removed,
                recovered,
                ..CycleStats::default()
            };
        }

        let mut promoted = 0;
        let mut shadow_requeued = 0;
        for tier in self.tiers.iter() {
            let (tier_promoted, tier_requeued) = self.promote_tier(tier);
            promoted += tier_promoted;
            shadow_requeued += tier_requeued;
        }

        CycleStats {
            skipped: false,
            paused: false,
            stale_removed,
            recovered,
            promoted,
            shadow_requeued,
        }
    }

    /// Drop queue entries whose session is gone or no longer parked on the
    /// holding destination.
    fn sweep_stale(&self) -> usize {
        let mut removed = 0;
        for tier in self.tiers.iter() {
            for (id, _destination) in tier.queued_snapshot() {
                let at_holding = self
                    .registry
                    .resolve(id)
                    .and_then(|session| session.current_destination())
                    .is_some_and(|current| current == self.config.destinations.holding);
                if !at_holding && tier.remove(id).is_some() {
                    tracing::debug!(session = %id, tier = tier.name(), "removed stale queue entry");
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Re-queue sessions parked on the holding destination that lost their
    /// queue entry, e.g. across a restart.
    fn recover_stranded(&self) -> usize {
        let mut recovered = 0;
        for session in self.registry.sessions() {
            let at_holding = session
                .current_destination()
                .is_some_and(|current| current == self.config.destinations.holding);
            if !at_holding {
                continue;
            }
            let tier = self.tiers.select(&*session);
            if tier.enqueue_if_absent(session.id(), self.config.destinations.primary.clone()) {
                tracing::info!(session = %session.id(), tier = tier.name(), "recovered stranded session");
                session.send_message(&self.config.recovery.message);
                recovered += 1;
            }
        }
        recovered
    }

    /// Promote queued sessions from one tier, FIFO, within free capacity and
    /// the per-cycle cap. A tier with no free slots is skipped entirely,
    /// including its notification. Returns (promoted, shadow re-queued).
    fn promote_tier(&self, tier: &Arc<Tier>) -> (usize, usize) {
        let free = tier.free_slots(&*self.occupancy, &self.config.destinations.primary);
        if free <= 0 {
            return (0, 0);
        }
        let mut budget = (free as usize).min(self.config.policy.max_promotions_per_cycle);

        let mut promoted = 0;
        let mut requeued = 0;
        for (id, destination) in tier.queued_snapshot() {
            // Unresolvable now does not mean gone; leave the entry for a
            // later sweep and do not spend the budget on it.
            let Some(session) = self.registry.resolve(id) else {
                continue;
            };

            tier.remove(id);
            session.send_message(&self.config.messages.joining);
            session.reset_display();

            if self.shadow_holds_back(id) {
                session.send_message(&self.config.soft_reject.message);
                tier.enqueue(id, destination);
                requeued += 1;
                continue;
            }

            let now = self.clock.now();
            {
                let mut state = tier.state();
                position::index_position_times(&mut state, now);
                position::record_clear_durations(&mut state, id, now);
            }

            tracing::debug!(
                session = %id,
                tier = tier.name(),
                destination = %destination,
                "promoting session"
            );
            session.connect(&destination);
            promoted += 1;

            budget -= 1;
            if budget == 0 {
                break;
            }
        }

        if self.config.notify.sound {
            self.send_queue_notify(tier);
        }

        (promoted, requeued)
    }

    /// Whether a soft-rejected identity is silently cycled back into the
    /// queue this pass.
    fn shadow_holds_back(&self, id: SessionId) -> bool {
        if !self.rejects.is_flagged(id) {
            return false;
        }
        match self.config.soft_reject.mode {
            SoftRejectMode::Loop => true,
            SoftRejectMode::Percent => self.sampler.lock().draw() >= self.config.soft_reject.percentage,
            SoftRejectMode::Kick => false,
        }
    }

    /// Cosmetic notification toward the holding destination listing up to
    /// the first five identities still queued. Fire-and-forget.
    fn send_queue_notify(&self, tier: &Arc<Tier>) {
        let ids: Vec<SessionId> = tier
            .queued_snapshot()
            .into_iter()
            .take(5)
            .map(|(id, _)| id)
            .collect();
        let payload = encode_notify(&self.config.notify.tag, &ids);
        self.channel.send(&self.config.notify.channel, &payload);
    }
}

/// Encode a notification payload: the tag string followed by each identity,
/// every string as a big-endian u16 byte length plus UTF-8 bytes (the
/// holding destination reads Java `readUTF` frames).
pub fn encode_notify(tag: &str, ids: &[SessionId]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + tag.len() + ids.len() * 38);
    put_utf(&mut out, tag);
    for id in ids {
        put_utf(&mut out, &id.to_string());
    }
    out
}

fn put_utf(out: &mut Vec<u8>, text: &str) {
    out.put_u16(text.len() as u16);
    out.put_slice(text.as_bytes());
}
