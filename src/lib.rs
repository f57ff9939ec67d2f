#![deny(unused, dead_code)]
#![deny(clippy::all, clippy::pedantic)]
// Module naming: common pattern in domain-driven code
#![allow(clippy::module_name_repetitions)]
// Documentation style: many terms don't need backticks
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// API ergonomics: prefer simplicity over must_use annotations
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Format strings: allow non-inlined for readability
#![allow(clippy::uninlined_format_args)]
// Numeric casts: slot arithmetic is intentionally widened
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
// Function complexity: some policy functions are inherently branchy
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]

//! Turnstile - priority-queue admission gateway for capacity-limited
//! backend destinations.
//!
//! When a destination is full, arriving sessions are diverted into one of
//! several priority-tiered FIFO queues instead of being connected; a
//! periodic cycle promotes queued sessions as capacity frees up.
//!
//! # Module Organization
//!
//! ## Core
//! - `core::config` - Policy configuration parsing and validation
//! - `core::runtime` - Engine assembly and the cycle scheduler
//! - `core::time` - Deterministic time utilities
//!
//! ## Queue state
//! - `queue::ordered` - Insertion-ordered FIFO map
//! - `queue::tier` - Priority tiers and their queue state
//! - `queue::liveness` - Destination liveness tracking
//!
//! ## Gate
//! - `gate::admission` - Per-session admission decisions
//! - `gate::mover` - Periodic cleanup/recovery/promotion engine
//! - `gate::position` - Wait-time tracking by queue position
//! - `gate::events` - Event objects mutated by the callbacks
//!
//! ## Collaborators
//! - `proxy` - Interfaces implemented by the host proxy
//!
//! ## CLI
//! - `cli` - Config checking and simulation commands

// Core infrastructure
pub mod core;

// Queue state
pub mod queue;

// Admission and movement
pub mod gate;

// Host collaborator interfaces
pub mod proxy;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, runtime, time};
pub use self::core::{Clock, Config, Runtime, RuntimeInputs, SystemClock};
pub use gate::{
    AdmissionGate, CycleStats, DisconnectEvent, PreAuthEvent, PreConnectEvent, QueueMover,
    RandomSampler, ShadowSampler,
};
pub use proxy::{
    OccupancyProbe, RejectStore, Session, SessionId, SessionRegistry, SideChannel,
};
pub use queue::{LivenessTracker, OrderedMap, Tier, TierSet, TierState};
