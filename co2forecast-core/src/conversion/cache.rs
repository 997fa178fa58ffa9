use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use super::{ConversionSet, GraphBuilder};
use crate::types::ConversionConstant;

/// What a cached [`ConversionSet`] was built from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub country: Option<String>,
    /// Version of the constants feed; the feed is append-only, so its length works
    pub version: u64,
}

impl CacheKey {
    pub fn new(country: Option<&str>, version: u64) -> Self {
        Self {
            country: country.map(str::to_string),
            version,
        }
    }

    /// Key derived from the feed length
    pub fn for_feed(country: Option<&str>, constants: &[ConversionConstant]) -> Self {
        Self::new(country, constants.len() as u64)
    }
}

#[derive(Debug)]
struct CachedSet {
    key: CacheKey,
    set: Arc<ConversionSet>,
}

/// Process-wide conversion graphs, rebuilt and swapped as a whole
///
/// Readers clone the current `Arc` and keep using it while a rebuild runs, so
/// they always see either the old or the new set. Rebuilds are serialized.
#[derive(Debug)]
pub struct ConversionCache {
    builder: GraphBuilder,
    current: RwLock<Option<CachedSet>>,
    rebuild: Mutex<()>,
}

impl ConversionCache {
    pub fn new(builder: GraphBuilder) -> Self {
        Self {
            builder,
            current: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Current set if it was built for `key`
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ConversionSet>> {
        let current = self.current.read().ok()?;
        current
            .as_ref()
            .filter(|cached| &cached.key == key)
            .map(|cached| Arc::clone(&cached.set))
    }

    /// Cached set for this feed and country, building it on a miss
    pub fn get_or_build(
        &self,
        constants: &[ConversionConstant],
        country: Option<&str>,
    ) -> Arc<ConversionSet> {
        self.get_or_build_versioned(constants, country, constants.len() as u64)
    }

    /// Same as [`get_or_build`](Self::get_or_build) with an explicit feed version
    pub fn get_or_build_versioned(
        &self,
        constants: &[ConversionConstant],
        country: Option<&str>,
        version: u64,
    ) -> Arc<ConversionSet> {
        let key = CacheKey::new(country, version);
        if let Some(set) = self.get(&key) {
            return set;
        }

        // A poisoned writer lock only means an earlier rebuild panicked; the
        // swap below is still all-or-nothing.
        let _guard = self.rebuild.lock().unwrap_or_else(|e| e.into_inner());

        // Another writer may have built it while we waited
        if let Some(set) = self.get(&key) {
            return set;
        }

        info!(
            "Building conversion graphs for country {:?} from {} constants",
            country,
            constants.len()
        );
        let set = Arc::new(self.builder.build(constants, country));

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(CachedSet {
            key,
            set: Arc::clone(&set),
        });
        set
    }

    /// Drop the cached set so the next request rebuilds
    pub fn invalidate(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if current.take().is_some() {
            debug!("Conversion graph cache invalidated");
        }
    }

    pub fn current_key(&self) -> Option<CacheKey> {
        self.current
            .read()
            .ok()
            .and_then(|current| current.as_ref().map(|cached| cached.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn cache() -> ConversionCache {
        ConversionCache::new(GraphBuilder::new(&EngineConfig::default()))
    }

    fn constants() -> Vec<ConversionConstant> {
        vec![ConversionConstant::new(Some("oil"), "bbl", "e6bbl", 1e-6, None, None)]
    }

    #[test]
    fn test_reuses_set_for_same_key() {
        let cache = cache();
        let feed = constants();
        let first = cache.get_or_build(&feed, Some("NO"));
        let second = cache.get_or_build(&feed, Some("NO"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.current_key(), Some(CacheKey::new(Some("NO"), 1)));
    }

    #[test]
    fn test_rebuilds_on_country_or_feed_change() {
        let cache = cache();
        let mut feed = constants();
        let first = cache.get_or_build(&feed, Some("NO"));

        let other_country = cache.get_or_build(&feed, Some("US"));
        assert!(!Arc::ptr_eq(&first, &other_country));
        assert_eq!(other_country.country(), Some("US"));

        feed.push(ConversionConstant::new(Some("gas"), "e6m3", "kgco2e", 1.9e6, None, None));
        let grown = cache.get_or_build(&feed, Some("US"));
        assert!(!Arc::ptr_eq(&other_country, &grown));
        assert!(grown.graph("gas").unwrap().has_edge("e6m3", "kgco2e"));

        // Readers holding the old set are unaffected by the swap
        assert!(!other_country.graph("gas").unwrap().has_edge("e6m3", "kgco2e"));
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let cache = cache();
        let feed = constants();
        let first = cache.get_or_build(&feed, None);
        cache.invalidate();
        assert!(cache.current_key().is_none());
        let second = cache.get_or_build(&feed, None);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_readers_see_whole_sets() {
        let cache = Arc::new(cache());
        let feed = Arc::new(constants());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let feed = Arc::clone(&feed);
                std::thread::spawn(move || {
                    let country = if i % 2 == 0 { "NO" } else { "US" };
                    let set = cache.get_or_build(&feed, Some(country));
                    assert_eq!(set.country(), Some(country));
                    assert!(set.graph("oil").unwrap().has_edge("bbl", "e6bbl"));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
