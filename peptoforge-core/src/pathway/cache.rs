//! Requirement lookups and their time-bounded memoization.

use super::{inference::infer_requirements, PathwayRequirements};
use crate::error::PeptoforgeError;
use chrono::{DateTime, Duration, Utc};
use peptoforge_schemas::{file_formats::OrganismRequirements, strain::StrainProfile};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};
use tracing::{debug, warn};

pub const DEFAULT_TTL_DAYS: i64 = 30;

/// Cache and lookup key of an organism.
pub fn organism_key(genus: &str, species: &str) -> String {
    format!("{}_{}", genus.trim(), species.trim())
}

/// Anything able to provide requirement levels for a strain.
///
/// `Ok(None)` means the source has no data for the organism, which callers
/// treat as "no pathway adjustment".
pub trait RequirementSource: Send + Sync {
    fn fetch(&self, strain: &StrainProfile) -> Result<Option<PathwayRequirements>, PeptoforgeError>;
}

/// Requirement data known up front, keyed by organism.
#[derive(Debug, Clone, Default)]
pub struct StaticRequirements {
    by_organism: HashMap<String, PathwayRequirements>,
}

impl StaticRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, genus: &str, species: &str, requirements: PathwayRequirements) {
        self.by_organism.insert(organism_key(genus, species), requirements);
    }

    /// Explicit levels win over a pathway inventory when an entry has both.
    pub fn from_organisms(organisms: &[OrganismRequirements]) -> Result<Self, PeptoforgeError> {
        let mut source = Self::new();
        for organism in organisms {
            let requirements = if !organism.requirements.is_empty() {
                PathwayRequirements::from_raw(&organism.requirements)?
            } else if let Some(inventory) = &organism.pathways {
                infer_requirements(inventory)
            } else {
                continue;
            };
            let key = organism_key(&organism.genus, &organism.species);
            if source.by_organism.insert(key.clone(), requirements).is_some() {
                return Err(PeptoforgeError::DuplicateIdentifier { kind: "organism", id: key });
            }
        }
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.by_organism.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_organism.is_empty()
    }
}

impl RequirementSource for StaticRequirements {
    fn fetch(&self, strain: &StrainProfile) -> Result<Option<PathwayRequirements>, PeptoforgeError> {
        Ok(self.by_organism.get(&organism_key(&strain.genus, &strain.species)).cloned())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Option<PathwayRequirements>,
    fetched_at: DateTime<Utc>,
}

/// Memoizes another source for `ttl`.
///
/// Readers share a `RwLock` over the entries. Fetches are serialized per key,
/// so a burst of lookups for one organism reaches the inner source once.
/// Failed fetches are not cached.
pub struct RequirementCache<S> {
    source: S,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: RequirementSource> RequirementCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_ttl(source, Duration::days(DEFAULT_TTL_DAYS))
    }

    pub fn with_ttl(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn fresh(&self, key: &str, now: DateTime<Utc>) -> Option<Option<PathwayRequirements>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn fetch_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drops the per-key lock once no other caller holds or waits on it.
    fn release_fetch_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = locks
            .get(key)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(key);
        }
    }

    fn fill(&self, key: &str, strain: &StrainProfile) -> Result<Option<PathwayRequirements>, PeptoforgeError> {
        // Another thread may have filled the entry while we waited.
        if let Some(hit) = self.fresh(key, Utc::now()) {
            return Ok(hit);
        }

        debug!(organism = %key, "fetching pathway requirements");
        let value = self.source.fetch(strain).map_err(|err| {
            warn!(organism = %key, error = %err, "requirement lookup failed");
            err
        })?;
        let entry = CacheEntry { value: value.clone(), fetched_at: Utc::now() };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
        Ok(value)
    }
}

impl<S: RequirementSource> RequirementSource for RequirementCache<S> {
    fn fetch(&self, strain: &StrainProfile) -> Result<Option<PathwayRequirements>, PeptoforgeError> {
        let key = organism_key(&strain.genus, &strain.species);
        if let Some(hit) = self.fresh(&key, Utc::now()) {
            return Ok(hit);
        }

        let lock = self.fetch_lock(&key);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.fill(&key, strain)
        };
        self.release_fetch_lock(&key, lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathway::RequirementLevel;
    use crate::test_support::strain;
    use std::{
        collections::BTreeMap,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self { calls: AtomicUsize::new(0), fail }
        }
    }

    impl RequirementSource for CountingSource {
        fn fetch(&self, strain: &StrainProfile) -> Result<Option<PathwayRequirements>, PeptoforgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PeptoforgeError::RequirementLookup(strain.full_name(), "offline".to_string()));
            }
            let mut requirements = PathwayRequirements::new();
            requirements.insert("Lysine", RequirementLevel::High);
            Ok(Some(requirements))
        }
    }

    #[test]
    fn hits_inner_source_once_within_ttl() {
        let cache = RequirementCache::new(CountingSource::new(false));
        let target = strain("Lactobacillus", "plantarum");
        let first = cache.fetch(&target).unwrap();
        let second = cache.fetch(&target).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_refetched() {
        let cache = RequirementCache::with_ttl(CountingSource::new(false), Duration::zero());
        let target = strain("Bacillus", "subtilis");
        cache.fetch(&target).unwrap();
        cache.fetch(&target).unwrap();
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = RequirementCache::new(CountingSource::new(true));
        let target = strain("Bacillus", "subtilis");
        assert!(cache.fetch(&target).is_err());
        assert!(cache.fetch(&target).is_err());
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_lookups_fetch_once() {
        let cache = RequirementCache::new(CountingSource::new(false));
        let target = strain("Escherichia", "coli");
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let value = cache.fetch(&target).unwrap();
                    assert!(value.is_some());
                });
            }
        });
        assert_eq!(cache.source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fetch_locks_are_released_after_each_fill() {
        let cache = RequirementCache::new(CountingSource::new(false));
        let failing = RequirementCache::new(CountingSource::new(true));
        for genus in ["Lactobacillus", "Bacillus", "Pichia"] {
            cache.fetch(&strain(genus, "sp.")).unwrap();
            assert!(failing.fetch(&strain(genus, "sp.")).is_err());
        }
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.fetch(&strain("Escherichia", "coli")).unwrap());
            }
        });
        assert_eq!(cache.len(), 4);
        assert!(cache.fetch_locks.lock().unwrap().is_empty());
        assert!(failing.fetch_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn static_source_prefers_explicit_levels() {
        let organisms = vec![
            OrganismRequirements {
                genus: "Lactobacillus".to_string(),
                species: "plantarum".to_string(),
                requirements: [("Lysine_requirement".to_string(), "medium".to_string())].into_iter().collect(),
                pathways: Some(BTreeMap::new()),
            },
            OrganismRequirements {
                genus: "Bacillus".to_string(),
                species: "subtilis".to_string(),
                requirements: BTreeMap::new(),
                pathways: Some(BTreeMap::new()),
            },
            OrganismRequirements {
                genus: "Pichia".to_string(),
                species: "pastoris".to_string(),
                requirements: BTreeMap::new(),
                pathways: None,
            },
        ];
        let source = StaticRequirements::from_organisms(&organisms).unwrap();
        assert_eq!(source.len(), 2);

        let lab = source.fetch(&strain("Lactobacillus", "plantarum")).unwrap().unwrap();
        assert_eq!(lab.len(), 1);
        assert_eq!(lab.level("Lysine"), Some(RequirementLevel::Medium));

        let bacillus = source.fetch(&strain("Bacillus", "subtilis")).unwrap().unwrap();
        assert_eq!(bacillus.level("Lysine"), Some(RequirementLevel::High));

        assert!(source.fetch(&strain("Pichia", "pastoris")).unwrap().is_none());
    }

    #[test]
    fn static_source_rejects_duplicates() {
        let entry = OrganismRequirements {
            genus: "Bacillus".to_string(),
            species: "subtilis".to_string(),
            requirements: BTreeMap::new(),
            pathways: Some(BTreeMap::new()),
        };
        let err = StaticRequirements::from_organisms(&[entry.clone(), entry]).unwrap_err();
        assert!(matches!(err, PeptoforgeError::DuplicateIdentifier { kind: "organism", .. }));
    }
}
