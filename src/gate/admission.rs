//! Per-session admission decisions.
//!
//! Four entry points, one per proxy lifecycle hook, all operating on the
//! shared tier state. Callbacks fire concurrently from independent
//! session-handling tasks; all shared state they touch is lock-protected.

use crate::config::{Config, SoftRejectMode};
use crate::gate::events::{DisconnectEvent, PreAuthEvent, PreConnectEvent};
use crate::proxy::{OccupancyProbe, RejectStore, Session};
use crate::queue::{LivenessTracker, Tier, TierSet};
use anyhow::Result;
use regex::Regex;
use std::sync::Arc;

pub struct AdmissionGate {
    config: Arc<Config>,
    tiers: Arc<TierSet>,
    liveness: Arc<LivenessTracker>,
    occupancy: Arc<dyn OccupancyProbe>,
    rejects: Arc<dyn RejectStore>,
    username_filter: Option<Regex>,
}

impl AdmissionGate {
    pub fn new(
        config: Arc<Config>,
        tiers: Arc<TierSet>,
        liveness: Arc<LivenessTracker>,
        occupancy: Arc<dyn OccupancyProbe>,
        rejects: Arc<dyn RejectStore>,
    ) -> Result<Self> {
        let username_filter = if config.filter.enabled {
            Some(config.filter.compile()?)
        } else {
            None
        };
        Ok(Self {
            config,
            tiers,
            liveness,
            occupancy,
            rejects,
            username_filter,
        })
    }

    /// Username filtering before authentication. Skipped when the event was
    /// already rejected upstream.
    pub fn on_pre_authenticate(&self, event: &mut PreAuthEvent) {
        if event.is_rejected() {
            return;
        }
        if let Some(filter) = &self.username_filter {
            if !filter.is_match(event.username()) {
                tracing::debug!(username = event.username(), "rejecting username by filter");
                event.reject(
                    self.config
                        .filter
                        .message
                        .replace("%regex%", &self.config.filter.username_regex),
                );
            }
        }
    }

    /// Kick-mode soft reject fires right after authentication, bypassing the
    /// queue entirely.
    pub fn on_post_authenticate(&self, session: &dyn Session) {
        if self.config.soft_reject.mode == SoftRejectMode::Kick
            && self.rejects.is_flagged(session.id())
        {
            tracing::info!(session = %session.id(), "disconnecting soft-rejected session at login");
            session.disconnect(&self.config.messages.server_down_kick);
        }
    }

    /// Failure-recovery path: a session kicked off the primary for a
    /// configured outage reason is parked on the holding destination and
    /// queued back toward where it was, instead of being dropped.
    pub fn on_forced_disconnect(&self, event: &mut DisconnectEvent) {
        let redirect = &self.config.redirect;
        if redirect.enabled && event.from() == self.config.destinations.primary {
            if let Some(reason) = event.reason() {
                let reason = reason.to_lowercase();
                if redirect
                    .trigger_words
                    .iter()
                    .any(|word| reason.contains(&word.to_lowercase()))
                {
                    let session = Arc::clone(event.session());
                    event.redirect(self.config.destinations.holding.clone());
                    session.send_message(&redirect.message);

                    let tier = self.tiers.select(&*session);
                    let kicked_from = event.from().to_string();
                    tracing::info!(
                        session = %session.id(),
                        tier = tier.name(),
                        from = %kicked_from,
                        "redirecting kicked session into the queue"
                    );
                    tier.enqueue(session.id(), kicked_from);
                }
            }
        }

        if let Some(override_text) = &self.config.messages.kick_override {
            event.set_message(override_text.clone());
        }
    }

    /// Primary admission decision for a routing request.
    pub fn on_pre_connect(&self, event: &mut PreConnectEvent) {
        let session = Arc::clone(event.session());

        // Only gate first connections, unless the transition is the
        // configured source -> primary hop.
        if session.current_destination().is_some() && !self.is_source_to_primary(event) {
            return;
        }

        if self.config.availability.kick_when_down {
            for destination in &self.config.availability.require_live {
                if !self.liveness.is_online(destination) {
                    tracing::info!(
                        session = %session.id(),
                        down = %destination,
                        "refusing connection while required destination is down"
                    );
                    session.disconnect(&self.config.messages.server_down_kick);
                    return;
                }
            }
        }

        let tier = self.tiers.select(&*session);

        if self.config.policy.always_queue || self.is_full(&tier) {
            if session.has_permission(&self.config.policy.bypass_permission) {
                event.set_target(self.config.destinations.primary.clone());
            } else {
                self.enqueue(&session, &tier, event);
            }
        }
    }

    /// Park the session on the holding destination and record where it was
    /// headed.
    fn enqueue(&self, session: &Arc<dyn Session>, tier: &Arc<Tier>, event: &mut PreConnectEvent) {
        session.set_queue_display(tier.header(), tier.footer());
        if self.is_full(tier) {
            session.send_message(&self.config.messages.server_full);
        }

        let recorded = match event.target() {
            Some(target) if !self.config.policy.force_primary_target => target.to_string(),
            _ => self.config.destinations.primary.clone(),
        };

        event.set_target(self.config.destinations.holding.clone());
        tracing::debug!(
            session = %session.id(),
            tier = tier.name(),
            destination = %recorded,
            "queueing session"
        );
        tier.enqueue(session.id(), recorded);
    }

    /// Full means no free reserved slot, or someone already queued: a new
    /// arrival never cuts in front of an existing queue.
    fn is_full(&self, tier: &Arc<Tier>) -> bool {
        tier.free_slots(&*self.occupancy, &self.config.destinations.primary) <= 0
            || !tier.queue_is_empty()
    }

    fn is_source_to_primary(&self, event: &PreConnectEvent) -> bool {
        let Some(source) = &self.config.destinations.source else {
            return false;
        };
        let Some(current) = event.session().current_destination() else {
            return false;
        };
        current == *source
            && event.target() == Some(self.config.destinations.primary.as_str())
    }
}
