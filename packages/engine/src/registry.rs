use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// A reviewer that submissions can be routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTarget {
    pub target_id: i64,
    pub display_name: String,
    pub registered_at: DateTime<Utc>,
}

/// Process-wide registry of routing targets.
///
/// Targets live for the process lifetime; no deletion is modeled.
/// Registration is first-write-wins so an admin typo cannot silently
/// replace an existing reviewer identity.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: DashMap<i64, RoutingTarget>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target. Returns `false` when the id is already taken.
    pub fn register(&self, target: RoutingTarget) -> bool {
        match self.targets.entry(target.target_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(target);
                true
            }
        }
    }

    pub fn get(&self, target_id: i64) -> Option<RoutingTarget> {
        self.targets.get(&target_id).map(|t| t.value().clone())
    }

    pub fn contains(&self, target_id: i64) -> bool {
        self.targets.contains_key(&target_id)
    }

    /// All targets, ordered by id for stable selection prompts.
    pub fn all(&self) -> Vec<RoutingTarget> {
        let mut all: Vec<_> = self.targets.iter().map(|t| t.value().clone()).collect();
        all.sort_by_key(|t| t.target_id);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}
