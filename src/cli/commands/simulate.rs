//! Simulate command - run the queue engine against a synthetic in-memory
//! population and report per-cycle outcomes.

use crate::cli::commands::init_tracing;
use crate::cli::SimulateArgs;
use crate::config::{Config, TierConfig};
use crate::proxy::{
    OccupancyProbe, RejectStore, Session, SessionId, SessionRegistry, SideChannel,
};
use crate::runtime::{Runtime, RuntimeInputs};
use crate::time::SystemClock;
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct SimSession {
    id: SessionId,
    username: String,
    permissions: Vec<String>,
    location: Mutex<Option<String>>,
}

impl Session for SimSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn has_permission(&self, node: &str) -> bool {
        self.permissions.iter().any(|p| p == node)
    }

    fn current_destination(&self) -> Option<String> {
        self.location.lock().clone()
    }

    fn send_message(&self, _text: &str) {}

    fn disconnect(&self, _reason: &str) {
        *self.location.lock() = None;
    }

    fn connect(&self, destination: &str) {
        *self.location.lock() = Some(destination.to_string());
    }

    fn set_queue_display(&self, _header: &str, _footer: &str) {}

    fn reset_display(&self) {}
}

struct SimWorld {
    sessions: Vec<Arc<SimSession>>,
    tiers: Vec<TierConfig>,
}

impl SimWorld {
    /// Tier the session belongs to, by priority order.
    fn tier_of(&self, session: &SimSession) -> &str {
        for tier in &self.tiers {
            match &tier.permission {
                None => return &tier.name,
                Some(node) if session.has_permission(node) => return &tier.name,
                Some(_) => {}
            }
        }
        // Validated config always ends with a catch-all.
        &self.tiers[self.tiers.len() - 1].name
    }
}

impl SessionRegistry for SimWorld {
    fn resolve(&self, id: SessionId) -> Option<Arc<dyn Session>> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| Arc::clone(s) as Arc<dyn Session>)
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        self.sessions
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn Session>)
            .collect()
    }
}

impl OccupancyProbe for SimWorld {
    fn occupancy(&self, destination: &str, tier: &str) -> usize {
        self.sessions
            .iter()
            .filter(|s| {
                s.current_destination().as_deref() == Some(destination)
                    && self.tier_of(s) == tier
            })
            .count()
    }
}

struct NoRejects;

impl RejectStore for NoRejects {
    fn is_flagged(&self, _id: SessionId) -> bool {
        false
    }
}

#[derive(Default)]
struct CountingChannel {
    sent: AtomicUsize,
}

impl SideChannel for CountingChannel {
    fn send(&self, _channel: &str, _payload: &[u8]) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn run_simulate(args: SimulateArgs) -> Result<()> {
    init_tracing(args.log_level.as_deref())?;
    let config = Config::load(&args.config)?;

    // Spread synthetic sessions across the configured tiers round-robin.
    let tier_configs = config.tiers.clone();
    let sessions: Vec<Arc<SimSession>> = (0..args.sessions)
        .map(|n| {
            let tier = &tier_configs[n % tier_configs.len()];
            Arc::new(SimSession {
                id: SessionId::new_v4(),
                username: format!("player-{n}"),
                permissions: tier.permission.iter().cloned().collect(),
                location: Mutex::new(None),
            })
        })
        .collect();

    let world = Arc::new(SimWorld {
        sessions: sessions.clone(),
        tiers: tier_configs,
    });
    let channel = Arc::new(CountingChannel::default());

    let primary = config.destinations.primary.clone();
    let holding = config.destinations.holding.clone();
    let runtime = Runtime::new(
        config,
        RuntimeInputs {
            registry: Arc::clone(&world) as Arc<dyn SessionRegistry>,
            occupancy: Arc::clone(&world) as Arc<dyn OccupancyProbe>,
            rejects: Arc::new(NoRejects),
            channel: Arc::clone(&channel) as Arc<dyn SideChannel>,
        },
        SystemClock,
    )?;

    runtime.liveness().mark_online(&primary);
    runtime.liveness().mark_online(&holding);

    // Arrival wave: every session asks for the primary at once.
    let gate = runtime.gate();
    for session in &sessions {
        let mut event = crate::gate::PreConnectEvent::new(
            Arc::clone(session) as Arc<dyn Session>,
            Some(primary.clone()),
        );
        gate.on_pre_connect(&mut event);
        match event.target() {
            Some(target) => session.connect(target),
            None => session.connect(&primary),
        }
    }

    let queued = |dest: &str| {
        sessions
            .iter()
            .filter(|s| s.current_destination().as_deref() == Some(dest))
            .count()
    };
    println!(
        "arrival: {} connected to {}, {} queued on {}",
        queued(&primary),
        primary,
        queued(&holding),
        holding
    );

    let mover = runtime.mover();
    for cycle in 1..=args.cycles {
        let stats = mover.run_cycle();
        println!(
            "cycle {:>3}: promoted={} shadow_requeued={} stale_removed={} recovered={} paused={}",
            cycle,
            stats.promoted,
            stats.shadow_requeued,
            stats.stale_removed,
            stats.recovered,
            stats.paused
        );
        if queued(&holding) == 0 {
            break;
        }
    }

    println!(
        "final: {} on {}, {} still queued, {} side-channel notifications",
        queued(&primary),
        primary,
        queued(&holding),
        channel.sent.load(Ordering::Relaxed)
    );

    Ok(())
}
