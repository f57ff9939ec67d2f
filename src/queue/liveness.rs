use parking_lot::RwLock;
use std::collections::HashSet;

/// Set of destinations currently known to be reachable.
///
/// Mutated by concurrent liveness-report callbacks, read by the admission
/// and promotion paths. Reads never observe a torn set.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    online: RwLock<HashSet<String>>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_online(&self, destination: &str) {
        self.online.write().insert(destination.to_string());
    }

    pub fn mark_offline(&self, destination: &str) {
        self.online.write().remove(destination);
    }

    /// Apply a liveness report in one call; used by ping-style probes.
    pub fn report(&self, destination: &str, online: bool) {
        if online {
            self.mark_online(destination);
        } else {
            self.mark_offline(destination);
        }
    }

    pub fn is_online(&self, destination: &str) -> bool {
        self.online.read().contains(destination)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.online.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_toggles_membership() {
        let tracker = LivenessTracker::new();
        assert!(!tracker.is_online("main"));
        tracker.report("main", true);
        assert!(tracker.is_online("main"));
        tracker.report("main", false);
        assert!(!tracker.is_online("main"));
    }

    #[test]
    fn snapshot_is_detached() {
        let tracker = LivenessTracker::new();
        tracker.mark_online("main");
        let snap = tracker.snapshot();
        tracker.mark_offline("main");
        assert!(snap.contains("main"));
        assert!(!tracker.is_online("main"));
    }
}
