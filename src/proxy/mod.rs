//! Collaborator interfaces provided by the host proxy.
//!
//! Turnstile never owns connections, authentication, or the backend
//! registry; it drives them through these traits. Hosts implement them over
//! their own session and server abstractions, tests implement them in
//! memory.

use std::sync::Arc;
use uuid::Uuid;

/// Opaque session identity, stable for the session's lifetime.
pub type SessionId = Uuid;

/// A connected client session as exposed by the host proxy.
///
/// Message, display, and connect calls are fire-and-forget: the queue engine
/// never observes their delivery outcome.
pub trait Session: Send + Sync {
    fn id(&self) -> SessionId;

    fn username(&self) -> &str;

    fn has_permission(&self, node: &str) -> bool;

    /// Destination the session is currently connected to, if any.
    fn current_destination(&self) -> Option<String>;

    fn send_message(&self, text: &str);

    fn disconnect(&self, reason: &str);

    /// Move the session to the given destination.
    fn connect(&self, destination: &str);

    /// Show tier-specific queue header/footer text.
    fn set_queue_display(&self, header: &str, footer: &str);

    /// Restore the default display.
    fn reset_display(&self);
}

/// Lookup over the sessions the proxy currently holds.
pub trait SessionRegistry: Send + Sync {
    /// Resolve an identity to a live session. `None` means the session is
    /// not reachable right now, which the queue engine treats as "not yet
    /// gone" rather than an error.
    fn resolve(&self, id: SessionId) -> Option<Arc<dyn Session>>;

    fn sessions(&self) -> Vec<Arc<dyn Session>>;
}

/// Externally reported occupancy: how many sessions of a tier are currently
/// inside a destination. The queue engine never counts this itself.
pub trait OccupancyProbe: Send + Sync {
    fn occupancy(&self, destination: &str, tier: &str) -> usize;
}

/// Persistent store recording which identities are soft-rejected.
pub trait RejectStore: Send + Sync {
    fn is_flagged(&self, id: SessionId) -> bool;
}

/// Best-effort side-channel transport toward a destination. Implementations
/// swallow transport failures; a lost notification must never roll back a
/// promotion that already happened.
pub trait SideChannel: Send + Sync {
    fn send(&self, channel: &str, payload: &[u8]);
}
