//! Event objects consumed and mutated by the admission callbacks.
//!
//! The host proxy constructs one of these per lifecycle hook, hands it to
//! the gate, then applies whatever outcome the gate wrote back.

use crate::proxy::Session;
use std::sync::Arc;

/// Fired before a candidate identity authenticates.
#[derive(Debug)]
pub struct PreAuthEvent {
    username: String,
    rejection: Option<String>,
}

impl PreAuthEvent {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            rejection: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Reject the login with the given user-visible message.
    pub fn reject(&mut self, message: String) {
        self.rejection = Some(message);
    }

    pub fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }

    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }
}

/// Fired when a session is forcibly disconnected from a destination.
pub struct DisconnectEvent {
    session: Arc<dyn Session>,
    from: String,
    reason: Option<String>,
    message: Option<String>,
    reconnect_to: Option<String>,
}

impl DisconnectEvent {
    pub fn new(session: Arc<dyn Session>, from: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            session,
            from: from.into(),
            reason,
            message: None,
            reconnect_to: None,
        }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Destination the session was kicked from.
    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Replace the user-visible disconnect message.
    pub fn set_message(&mut self, message: String) {
        self.message = Some(message);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Reconnect the session to `destination` instead of dropping it.
    pub fn redirect(&mut self, destination: String) {
        self.reconnect_to = Some(destination);
    }

    pub fn reconnect_to(&self) -> Option<&str> {
        self.reconnect_to.as_deref()
    }
}

/// Fired when the proxy is about to route a session to a destination.
pub struct PreConnectEvent {
    session: Arc<dyn Session>,
    target: Option<String>,
}

impl PreConnectEvent {
    pub fn new(session: Arc<dyn Session>, target: Option<String>) -> Self {
        Self { session, target }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Destination the routing request currently points at.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Override where the session will be routed.
    pub fn set_target(&mut self, destination: String) {
        self.target = Some(destination);
    }
}
