//! Relationship statistics owned outside the interaction core.
use bevy::prelude::*;

use super::config::RelationshipSeed;

/// Persistent store for relationship progress. Read once per session,
/// written once per climax.
pub trait PersistentStatsStore: Send + Sync {
    fn affection(&self) -> i32;
    fn promiscuity(&self) -> i32;
    fn desire(&self) -> i32;
    fn orgasm_count(&self) -> u32;
    fn commit_orgasm_count(&mut self, count: u32);
}

/// Snapshot of the store taken when a session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationshipStats {
    pub affection: i32,
    pub promiscuity: i32,
    pub desire: i32,
}

impl RelationshipStats {
    pub fn sample(store: &dyn PersistentStatsStore) -> Self {
        Self {
            affection: store.affection(),
            promiscuity: store.promiscuity(),
            desire: store.desire(),
        }
    }
}

/// Store backed by plain fields; used when no save system is attached.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatsStore {
    stats: RelationshipStats,
    orgasm_count: u32,
    commits: u32,
}

impl InMemoryStatsStore {
    pub fn new(stats: RelationshipStats) -> Self {
        Self {
            stats,
            orgasm_count: 0,
            commits: 0,
        }
    }

    pub fn with_orgasm_count(mut self, count: u32) -> Self {
        self.orgasm_count = count;
        self
    }

    #[cfg(test)]
    pub fn set_stats(&mut self, stats: RelationshipStats) {
        self.stats = stats;
    }

    /// Number of times `commit_orgasm_count` has been called.
    #[cfg(test)]
    pub fn commits(&self) -> u32 {
        self.commits
    }
}

impl From<RelationshipSeed> for InMemoryStatsStore {
    fn from(seed: RelationshipSeed) -> Self {
        Self::new(RelationshipStats {
            affection: seed.affection,
            promiscuity: seed.promiscuity,
            desire: seed.desire,
        })
        .with_orgasm_count(seed.orgasm_count)
    }
}

impl PersistentStatsStore for InMemoryStatsStore {
    fn affection(&self) -> i32 {
        self.stats.affection
    }

    fn promiscuity(&self) -> i32 {
        self.stats.promiscuity
    }

    fn desire(&self) -> i32 {
        self.stats.desire
    }

    fn orgasm_count(&self) -> u32 {
        self.orgasm_count
    }

    fn commit_orgasm_count(&mut self, count: u32) {
        self.orgasm_count = count;
        self.commits += 1;
        info!(
            "Orgasm count {} committed (write {} this run)",
            count, self.commits
        );
    }
}

/// Resource holding the active stats store.
#[derive(Resource)]
pub struct RelationshipStore {
    inner: Box<dyn PersistentStatsStore>,
}

impl RelationshipStore {
    pub fn new(inner: Box<dyn PersistentStatsStore>) -> Self {
        Self { inner }
    }

    pub fn store(&self) -> &dyn PersistentStatsStore {
        self.inner.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn PersistentStatsStore {
        self.inner.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_reports_values_and_counts_commits() {
        let seed = RelationshipSeed {
            affection: 500,
            promiscuity: 20,
            desire: 7,
            orgasm_count: 2,
        };
        let mut store = InMemoryStatsStore::from(seed);
        let stats = RelationshipStats::sample(&store);
        assert_eq!(stats.affection, 500);
        assert_eq!(stats.promiscuity, 20);
        assert_eq!(stats.desire, 7);
        assert_eq!(store.orgasm_count(), 2);

        store.commit_orgasm_count(3);
        assert_eq!(store.orgasm_count(), 3);
        assert_eq!(store.commits(), 1);
    }
}
