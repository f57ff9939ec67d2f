//! Engine assembly and the cycle scheduler.
//!
//! Hosts construct a [`Runtime`] from a validated config plus their
//! collaborator implementations, register the gate callbacks with their
//! event system, and either drive [`QueueMover::run_cycle`] themselves or
//! hand the scheduling to [`Runtime::run`].

use crate::config::Config;
use crate::gate::{AdmissionGate, QueueMover};
use crate::proxy::{OccupancyProbe, RejectStore, SessionRegistry, SideChannel};
use crate::queue::{LivenessTracker, TierSet};
use crate::time::{Clock, SystemClock};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Collaborator implementations supplied by the host proxy.
pub struct RuntimeInputs {
    pub registry: Arc<dyn SessionRegistry>,
    pub occupancy: Arc<dyn OccupancyProbe>,
    pub rejects: Arc<dyn RejectStore>,
    pub channel: Arc<dyn SideChannel>,
}

/// The assembled queue engine: admission gate, mover, and the shared state
/// both operate on.
pub struct Runtime<C: Clock = SystemClock> {
    gate: Arc<AdmissionGate>,
    mover: Arc<QueueMover<C>>,
    liveness: Arc<LivenessTracker>,
    tiers: Arc<TierSet>,
    cycle_interval: Duration,
    clock: C,
}

impl<C: Clock> Runtime<C> {
    pub fn new(config: Config, inputs: RuntimeInputs, clock: C) -> Result<Self> {
        config.validate()?;
        let cycle_interval = Duration::from_secs(config.policy.cycle_seconds);
        let config = Arc::new(config);
        let tiers = Arc::new(TierSet::from_config(&config.tiers)?);
        let liveness = Arc::new(LivenessTracker::new());

        let gate = Arc::new(AdmissionGate::new(
            Arc::clone(&config),
            Arc::clone(&tiers),
            Arc::clone(&liveness),
            Arc::clone(&inputs.occupancy),
            Arc::clone(&inputs.rejects),
        )?);
        let mover = Arc::new(QueueMover::new(
            config,
            Arc::clone(&tiers),
            Arc::clone(&liveness),
            inputs.registry,
            inputs.occupancy,
            inputs.rejects,
            inputs.channel,
            clock.clone(),
        ));

        Ok(Self {
            gate,
            mover,
            liveness,
            tiers,
            cycle_interval,
            clock,
        })
    }

    pub fn gate(&self) -> Arc<AdmissionGate> {
        Arc::clone(&self.gate)
    }

    pub fn mover(&self) -> Arc<QueueMover<C>> {
        Arc::clone(&self.mover)
    }

    pub fn liveness(&self) -> Arc<LivenessTracker> {
        Arc::clone(&self.liveness)
    }

    pub fn tiers(&self) -> Arc<TierSet> {
        Arc::clone(&self.tiers)
    }

    /// Drive promotion cycles on the configured cadence until the shutdown
    /// flag flips. Cycle overlap is prevented inside `run_cycle` itself, so
    /// a slow cycle results in skipped ticks rather than parallel passes.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_seconds = self.cycle_interval.as_secs(),
            "queue scheduler started"
        );
        loop {
            tokio::select! {
                () = self.clock.sleep(self.cycle_interval) => {
                    let stats = self.mover.run_cycle();
                    tracing::debug!(
                        promoted = stats.promoted,
                        stale_removed = stats.stale_removed,
                        recovered = stats.recovered,
                        shadow_requeued = stats.shadow_requeued,
                        paused = stats.paused,
                        "queue cycle complete"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("queue scheduler stopped");
    }
}
