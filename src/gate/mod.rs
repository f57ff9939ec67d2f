//! Admission decisions and the periodic queue-movement engine.

pub mod admission;
pub mod events;
pub mod mover;
pub mod position;

pub use admission::AdmissionGate;
pub use events::{DisconnectEvent, PreAuthEvent, PreConnectEvent};
pub use mover::{encode_notify, CycleStats, QueueMover, RandomSampler, ShadowSampler};
