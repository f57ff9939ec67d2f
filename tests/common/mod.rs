//! In-memory collaborator implementations shared by the integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use turnstile::{
    Clock, Config, OccupancyProbe, RejectStore, Runtime, RuntimeInputs, Session, SessionId,
    SessionRegistry, ShadowSampler, SideChannel,
};

pub const BASE_CONFIG: &str = r#"
[destinations]
primary = "main"
holding = "queue"

[policy]
max_promotions_per_cycle = 5
pause_when_primary_down = false

[[tiers]]
name = "priority"
permission = "turnstile.priority"
reserved_slots = 2

[[tiers]]
name = "default"
reserved_slots = 10
"#;

pub fn base_config() -> Config {
    toml::from_str(BASE_CONFIG).unwrap()
}

/// Recording session double; every outbound call is captured.
pub struct TestSession {
    id: SessionId,
    username: String,
    permissions: Vec<String>,
    pub location: Mutex<Option<String>>,
    pub messages: Mutex<Vec<String>>,
    pub disconnected: Mutex<Option<String>>,
    pub display: Mutex<Option<(String, String)>>,
    pub connects: Mutex<Vec<String>>,
}

impl TestSession {
    pub fn new(username: &str) -> Arc<Self> {
        Self::with_permissions(username, &[])
    }

    pub fn with_permissions(username: &str, permissions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId::new_v4(),
            username: username.to_string(),
            permissions: permissions.iter().map(ToString::to_string).collect(),
            location: Mutex::new(None),
            messages: Mutex::new(Vec::new()),
            disconnected: Mutex::new(None),
            display: Mutex::new(None),
            connects: Mutex::new(Vec::new()),
        })
    }

    pub fn set_location(&self, destination: Option<&str>) {
        *self.location.lock() = destination.map(ToString::to_string);
    }

    pub fn last_connect(&self) -> Option<String> {
        self.connects.lock().last().cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().len()
    }
}

impl Session for TestSession {
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

    fn send_message(&self, text: &str) {
        self.messages.lock().push(text.to_string());
    }

    fn disconnect(&self, reason: &str) {
        *self.disconnected.lock() = Some(reason.to_string());
    }

    fn connect(&self, destination: &str) {
        self.connects.lock().push(destination.to_string());
        *self.location.lock() = Some(destination.to_string());
    }

    fn set_queue_display(&self, header: &str, footer: &str) {
        *self.display.lock() = Some((header.to_string(), footer.to_string()));
    }

    fn reset_display(&self) {
        *self.display.lock() = None;
    }
}

#[derive(Default)]
pub struct TestRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<TestSession>>>,
    unreachable: Mutex<HashSet<SessionId>>,
}

impl TestRegistry {
    pub fn add(&self, session: &Arc<TestSession>) {
        self.sessions
            .lock()
            .insert(session.id(), Arc::clone(session));
    }

    pub fn remove(&self, id: SessionId) {
        self.sessions.lock().remove(&id);
    }

    /// Keep the session registered but make `resolve` fail for it.
    pub fn set_unreachable(&self, id: SessionId, unreachable: bool) {
        if unreachable {
            self.unreachable.lock().insert(id);
        } else {
            self.unreachable.lock().remove(&id);
        }
    }
}

impl SessionRegistry for TestRegistry {
    fn resolve(&self, id: SessionId) -> Option<Arc<dyn Session>> {
        if self.unreachable.lock().contains(&id) {
            return None;
        }
        self.sessions
            .lock()
            .get(&id)
            .map(|s| Arc::clone(s) as Arc<dyn Session>)
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        let unreachable = self.unreachable.lock();
        self.sessions
            .lock()
            .values()
            .filter(|s| !unreachable.contains(&s.id()))
            .map(|s| Arc::clone(s) as Arc<dyn Session>)
            .collect()
    }
}

/// Occupancy fixed per (destination, tier) by the test.
#[derive(Default)]
pub struct TestOccupancy {
    counts: Mutex<HashMap<(String, String), usize>>,
}

impl TestOccupancy {
    pub fn set(&self, destination: &str, tier: &str, count: usize) {
        self.counts
            .lock()
            .insert((destination.to_string(), tier.to_string()), count);
    }
}

impl OccupancyProbe for TestOccupancy {
    fn occupancy(&self, destination: &str, tier: &str) -> usize {
        self.counts
            .lock()
            .get(&(destination.to_string(), tier.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Default)]
pub struct TestRejects {
    flagged: Mutex<HashSet<SessionId>>,
}

impl TestRejects {
    pub fn flag(&self, id: SessionId) {
        self.flagged.lock().insert(id);
    }
}

impl RejectStore for TestRejects {
    fn is_flagged(&self, id: SessionId) -> bool {
        self.flagged.lock().contains(&id)
    }
}

#[derive(Default)]
pub struct TestChannel {
    pub sent: Mutex<Vec<(String, Vec<u8>)>>,
}

impl SideChannel for TestChannel {
    fn send(&self, channel: &str, payload: &[u8]) {
        self.sent.lock().push((channel.to_string(), payload.to_vec()));
    }
}

/// Pops scripted draws; falls back to 0 when exhausted.
pub struct ScriptedSampler {
    draws: Mutex<VecDeque<u8>>,
}

impl ScriptedSampler {
    pub fn new(draws: &[u8]) -> Box<Self> {
        Box::new(Self {
            draws: Mutex::new(draws.iter().copied().collect()),
        })
    }
}

impl ShadowSampler for ScriptedSampler {
    fn draw(&mut self) -> u8 {
        self.draws.lock().pop_front().unwrap_or(0)
    }
}

/// Manually advanced clock shared across clones.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) -> tokio::time::Sleep {
        tokio::time::sleep(duration)
    }
}

pub struct Fixture {
    pub runtime: Runtime<ManualClock>,
    pub registry: Arc<TestRegistry>,
    pub occupancy: Arc<TestOccupancy>,
    pub rejects: Arc<TestRejects>,
    pub channel: Arc<TestChannel>,
    pub clock: ManualClock,
}

impl Fixture {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(TestRegistry::default());
        let occupancy = Arc::new(TestOccupancy::default());
        let rejects = Arc::new(TestRejects::default());
        let channel = Arc::new(TestChannel::default());
        let clock = ManualClock::new();

        let runtime = Runtime::new(
            config,
            RuntimeInputs {
                registry: Arc::clone(&registry) as Arc<dyn SessionRegistry>,
                occupancy: Arc::clone(&occupancy) as Arc<dyn OccupancyProbe>,
                rejects: Arc::clone(&rejects) as Arc<dyn RejectStore>,
                channel: Arc::clone(&channel) as Arc<dyn SideChannel>,
            },
            clock.clone(),
        )
        .unwrap();

        Self {
            runtime,
            registry,
            occupancy,
            rejects,
            channel,
            clock,
        }
    }

    /// Register a session parked on the holding destination.
    pub fn parked(&self, session: &Arc<TestSession>) {
        session.set_location(Some("queue"));
        self.registry.add(session);
    }
}
