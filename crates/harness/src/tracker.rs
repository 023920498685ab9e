//! Per-test registries of remotely-created resource identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of remote resources a test can create on the dashboard.
///
/// Each kind has its own cleanup call, so identifiers are never mixed in a
/// single collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A chat session opened through the dashboard.
    Session,
    /// An issue filed through the dashboard.
    Issue,
}

impl ResourceKind {
    /// Fixed order in which kinds are drained during cleanup.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Session, ResourceKind::Issue];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Session => "session",
            ResourceKind::Issue => "issue",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only, de-duplicated collection of resource identifiers created
/// during a single test execution.
///
/// Insertion order is preserved and drives cleanup order. The tracker never
/// fails: empty and already-present identifiers are silently ignored.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    ids: Vec<String>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier. No-op if `id` is empty or already tracked.
    pub fn add(&mut self, id: impl Into<String>) {
        let id = id.into();
        if id.is_empty() || self.ids.iter().any(|existing| *existing == id) {
            return;
        }
        self.ids.push(id);
    }

    /// Copy of the tracked identifiers in first-seen order.
    pub fn list(&self) -> Vec<String> {
        self.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop all tracked identifiers. Called by the cleanup coordinator
    /// between tests.
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// All trackers owned by one test execution, one per [`ResourceKind`].
///
/// Constructed fresh per test and passed explicitly into the code under
/// test; nothing here is process-global, so concurrent test workers never
/// interleave state.
#[derive(Debug, Default)]
pub struct TestResources {
    sessions: ResourceTracker,
    issues: ResourceTracker,
}

impl TestResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier under the given kind.
    pub fn track(&mut self, kind: ResourceKind, id: impl Into<String>) {
        self.tracker_mut(kind).add(id);
    }

    pub fn tracker(&self, kind: ResourceKind) -> &ResourceTracker {
        match kind {
            ResourceKind::Session => &self.sessions,
            ResourceKind::Issue => &self.issues,
        }
    }

    pub fn tracker_mut(&mut self, kind: ResourceKind) -> &mut ResourceTracker {
        match kind {
            ResourceKind::Session => &mut self.sessions,
            ResourceKind::Issue => &mut self.issues,
        }
    }

    /// Clear every tracker, regardless of kind.
    pub fn clear_all(&mut self) {
        self.sessions.clear();
        self.issues.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates_and_preserves_order() {
        let mut tracker = ResourceTracker::new();
        tracker.add("s1");
        tracker.add("s1");
        tracker.add("s2");

        assert_eq!(tracker.list(), vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn add_ignores_empty_ids() {
        let mut tracker = ResourceTracker::new();
        tracker.add("");
        tracker.add(String::new());

        assert!(tracker.is_empty());
    }

    #[test]
    fn clear_empties_the_tracker() {
        let mut tracker = ResourceTracker::new();
        tracker.add("a");
        tracker.add("b");
        tracker.clear();

        assert!(tracker.is_empty());
        assert_eq!(tracker.list(), Vec::<String>::new());
    }

    #[test]
    fn list_is_a_copy() {
        let mut tracker = ResourceTracker::new();
        tracker.add("a");

        let snapshot = tracker.list();
        tracker.add("b");

        assert_eq!(snapshot, vec!["a".to_string()]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn kinds_are_tracked_independently() {
        let mut resources = TestResources::new();
        resources.track(ResourceKind::Session, "sess-1");
        resources.track(ResourceKind::Issue, "sess-1");

        assert_eq!(resources.tracker(ResourceKind::Session).len(), 1);
        assert_eq!(resources.tracker(ResourceKind::Issue).len(), 1);

        resources.clear_all();
        assert!(resources.tracker(ResourceKind::Session).is_empty());
        assert!(resources.tracker(ResourceKind::Issue).is_empty());
    }
}
